use sqlx::{PgConnection, PgPool};

use super::{entity::*, error::InventoryError};
use crate::primitives::*;

#[derive(Debug, Clone)]
pub(super) struct InventoryRepo {
    pool: PgPool,
}

impl InventoryRepo {
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }

    pub async fn find(
        &self,
        tenant_id: TenantId,
        currency: Currency,
    ) -> Result<Option<CurrencyHolding>, InventoryError> {
        let holding = sqlx::query_as::<_, CurrencyHolding>(
            "SELECT * FROM remit_currency_holdings WHERE tenant_id = $1 AND currency = $2",
        )
        .bind(tenant_id)
        .bind(currency)
        .fetch_optional(&self.pool)
        .await?;
        Ok(holding)
    }

    pub async fn find_for_update(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        currency: Currency,
    ) -> Result<Option<CurrencyHolding>, InventoryError> {
        let holding = sqlx::query_as::<_, CurrencyHolding>(
            r#"SELECT * FROM remit_currency_holdings
            WHERE tenant_id = $1 AND currency = $2
            FOR UPDATE"#,
        )
        .bind(tenant_id)
        .bind(currency)
        .fetch_optional(conn)
        .await?;
        Ok(holding)
    }

    pub async fn insert_if_absent(
        &self,
        conn: &mut PgConnection,
        holding: &CurrencyHolding,
    ) -> Result<(), InventoryError> {
        sqlx::query(
            r#"INSERT INTO remit_currency_holdings
            (id, tenant_id, currency, quantity, wac, total_cost, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (tenant_id, currency) DO NOTHING"#,
        )
        .bind(holding.id)
        .bind(holding.tenant_id)
        .bind(holding.currency)
        .bind(holding.quantity)
        .bind(holding.wac)
        .bind(holding.total_cost)
        .bind(holding.created_at)
        .bind(holding.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn update(
        &self,
        conn: &mut PgConnection,
        holding: &CurrencyHolding,
    ) -> Result<(), InventoryError> {
        sqlx::query(
            r#"UPDATE remit_currency_holdings
            SET quantity = $2, wac = $3, total_cost = $4, updated_at = $5
            WHERE id = $1"#,
        )
        .bind(holding.id)
        .bind(holding.quantity)
        .bind(holding.wac)
        .bind(holding.total_cost)
        .bind(holding.updated_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn insert_record(
        &self,
        conn: &mut PgConnection,
        record: &WacRecord,
    ) -> Result<(), InventoryError> {
        sqlx::query(
            r#"INSERT INTO remit_wac_records
            (id, tenant_id, currency, transaction_type, quantity, rate, previous_quantity,
             previous_wac, new_quantity, new_wac, profit_or_loss, reference_id, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"#,
        )
        .bind(record.id)
        .bind(record.tenant_id)
        .bind(record.currency)
        .bind(record.transaction_type)
        .bind(record.quantity)
        .bind(record.rate)
        .bind(record.previous_quantity)
        .bind(record.previous_wac)
        .bind(record.new_quantity)
        .bind(record.new_wac)
        .bind(record.profit_or_loss)
        .bind(record.reference_id)
        .bind(&record.notes)
        .bind(record.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn live_positions(
        &self,
        tenant_id: TenantId,
        excluding: Currency,
    ) -> Result<Vec<CurrencyHolding>, InventoryError> {
        let holdings = sqlx::query_as::<_, CurrencyHolding>(
            r#"SELECT * FROM remit_currency_holdings
            WHERE tenant_id = $1 AND quantity > 0 AND currency <> $2
            ORDER BY currency"#,
        )
        .bind(tenant_id)
        .bind(excluding)
        .fetch_all(&self.pool)
        .await?;
        Ok(holdings)
    }

    pub async fn history(
        &self,
        tenant_id: TenantId,
        currency: Currency,
    ) -> Result<Vec<WacRecord>, InventoryError> {
        let records = sqlx::query_as::<_, WacRecord>(
            r#"SELECT * FROM remit_wac_records
            WHERE tenant_id = $1 AND currency = $2
            ORDER BY created_at, id"#,
        )
        .bind(tenant_id)
        .bind(currency)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }
}
