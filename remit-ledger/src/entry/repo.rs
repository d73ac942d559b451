use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use std::collections::HashMap;

use super::{entity::*, error::LedgerEntryError};
use crate::primitives::*;

#[derive(Debug, Clone)]
pub(super) struct LedgerEntryRepo {
    pool: PgPool,
}

impl LedgerEntryRepo {
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }

    /// Serializes access to one client's ledger for the rest of the transaction.
    /// Writers and withdrawal checks take it exclusively, consistent readers shared.
    #[instrument(level = "trace", name = "remit_ledger.entries.lock_client", skip(self, conn))]
    pub async fn lock_client(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        client_id: ClientId,
        shared: bool,
    ) -> Result<(), LedgerEntryError> {
        let sql = if shared {
            "SELECT pg_advisory_xact_lock_shared(hashtext(concat('remit_ledger_entries', $1::text, $2::text)))"
        } else {
            "SELECT pg_advisory_xact_lock(hashtext(concat('remit_ledger_entries', $1::text, $2::text)))"
        };
        sqlx::query(sql)
            .bind(tenant_id)
            .bind(client_id)
            .execute(conn)
            .await?;
        Ok(())
    }

    #[instrument(level = "trace", name = "remit_ledger.entries.insert", skip(self, conn))]
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        entry: &LedgerEntry,
    ) -> Result<(), LedgerEntryError> {
        sqlx::query(
            r#"INSERT INTO remit_ledger_entries
            (id, tenant_id, client_id, branch_id, entry_type, currency, amount,
             exchange_rate, related_entry_id, description, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"#,
        )
        .bind(entry.id)
        .bind(entry.tenant_id)
        .bind(entry.client_id)
        .bind(entry.branch_id)
        .bind(entry.entry_type)
        .bind(entry.currency)
        .bind(entry.amount)
        .bind(entry.exchange_rate)
        .bind(entry.related_entry_id)
        .bind(&entry.description)
        .bind(entry.created_by)
        .bind(entry.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn balances(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        client_id: ClientId,
    ) -> Result<HashMap<Currency, Money>, LedgerEntryError> {
        let rows: Vec<(Currency, Money)> = sqlx::query_as(
            r#"SELECT currency, COALESCE(SUM(amount), 0)
            FROM remit_ledger_entries
            WHERE tenant_id = $1 AND client_id = $2
            GROUP BY currency"#,
        )
        .bind(tenant_id)
        .bind(client_id)
        .fetch_all(conn)
        .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn balance_for_currency(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        client_id: ClientId,
        currency: Currency,
    ) -> Result<Money, LedgerEntryError> {
        let balance: Money = sqlx::query_scalar(
            r#"SELECT COALESCE(SUM(amount), 0)
            FROM remit_ledger_entries
            WHERE tenant_id = $1 AND client_id = $2 AND currency = $3"#,
        )
        .bind(tenant_id)
        .bind(client_id)
        .bind(currency)
        .fetch_one(conn)
        .await?;
        Ok(balance)
    }

    pub async fn list_for_client(
        &self,
        tenant_id: TenantId,
        client_id: ClientId,
    ) -> Result<Vec<LedgerEntry>, LedgerEntryError> {
        let entries = sqlx::query_as::<_, LedgerEntry>(
            r#"SELECT * FROM remit_ledger_entries
            WHERE tenant_id = $1 AND client_id = $2
            ORDER BY created_at DESC, id"#,
        )
        .bind(tenant_id)
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
