#![allow(dead_code)]
use remit_ledger::{remittance::*, *};

pub async fn init_pool() -> anyhow::Result<sqlx::PgPool> {
    let pg_host = std::env::var("PG_HOST").unwrap_or("localhost".to_string());
    let pg_con = format!("postgres://user:password@{pg_host}:5432/pg");
    let pool = sqlx::PgPool::connect(&pg_con).await?;
    Ok(pool)
}

pub async fn init_ledger() -> anyhow::Result<RemitLedger> {
    let pool = init_pool().await?;
    let config = RemitLedgerConfig::builder()
        .pool(pool)
        .exec_migrations(true)
        .max_cas_attempts(20u32)
        .build()?;
    Ok(RemitLedger::init(config).await?)
}

pub fn cad() -> Currency {
    "CAD".parse().unwrap()
}

pub fn usd() -> Currency {
    "USD".parse().unwrap()
}

pub fn eur() -> Currency {
    "EUR".parse().unwrap()
}

pub fn new_outgoing(tenant_id: TenantId, amount_irr: i64, buy_rate: i64) -> NewOutgoingRemittance {
    NewOutgoingRemittance::builder()
        .tenant_id(tenant_id)
        .sender_name("Sara Karimi")
        .recipient_name("Reza Karimi")
        .amount_irr(Money::from(amount_irr))
        .buy_rate_cad(Money::from(buy_rate))
        .created_by(UserId::new())
        .build()
        .unwrap()
}

pub fn new_incoming(tenant_id: TenantId, amount_irr: i64, sell_rate: i64) -> NewIncomingRemittance {
    NewIncomingRemittance::builder()
        .tenant_id(tenant_id)
        .sender_name("Ali Ahmadi")
        .recipient_name("Mina Ahmadi")
        .amount_irr(Money::from(amount_irr))
        .sell_rate_cad(Money::from(sell_rate))
        .created_by(UserId::new())
        .build()
        .unwrap()
}
