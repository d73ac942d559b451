use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use super::{entity::*, error::CashBalanceError};
use crate::{optimistic, primitives::*};

#[derive(Debug, Clone)]
pub(super) struct CashBalanceRepo {
    pool: PgPool,
}

impl CashBalanceRepo {
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }

    pub async fn find(
        &self,
        tenant_id: TenantId,
        id: CashBalanceId,
    ) -> Result<CashBalance, CashBalanceError> {
        let mut conn = self.pool.acquire().await?;
        self.find_in(&mut conn, tenant_id, id).await
    }

    pub async fn find_in(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        id: CashBalanceId,
    ) -> Result<CashBalance, CashBalanceError> {
        sqlx::query_as::<_, CashBalance>(
            "SELECT * FROM remit_cash_balances WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(CashBalanceError::NotFound(id))
    }

    pub async fn find_by_scope(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        branch_id: Option<BranchId>,
        currency: Currency,
    ) -> Result<Option<CashBalance>, CashBalanceError> {
        let balance = sqlx::query_as::<_, CashBalance>(
            r#"SELECT * FROM remit_cash_balances
            WHERE tenant_id = $1 AND branch_id IS NOT DISTINCT FROM $2 AND currency = $3"#,
        )
        .bind(tenant_id)
        .bind(branch_id)
        .bind(currency)
        .fetch_optional(conn)
        .await?;
        Ok(balance)
    }

    /// Inserts `balance` unless a row for the same scope already exists.
    #[instrument(level = "trace", name = "remit_ledger.cash_balances.insert_if_absent", skip(self, conn))]
    pub async fn insert_if_absent(
        &self,
        conn: &mut PgConnection,
        balance: &CashBalance,
    ) -> Result<(), CashBalanceError> {
        sqlx::query(
            r#"INSERT INTO remit_cash_balances
            (id, tenant_id, branch_id, currency, auto_calculated_balance, manual_adjustment,
             final_balance, version, last_calculated_at, created_at, modified_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT DO NOTHING"#,
        )
        .bind(balance.id)
        .bind(balance.tenant_id)
        .bind(balance.branch_id)
        .bind(balance.currency)
        .bind(balance.auto_calculated_balance)
        .bind(balance.manual_adjustment)
        .bind(balance.final_balance)
        .bind(balance.version)
        .bind(balance.last_calculated_at)
        .bind(balance.created_at)
        .bind(balance.modified_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Sum of completed cash payments in scope.
    pub async fn completed_cash_total(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        branch_id: Option<BranchId>,
        currency: Currency,
    ) -> Result<Money, CashBalanceError> {
        let total: Money = sqlx::query_scalar(
            r#"SELECT COALESCE(SUM(amount), 0) FROM remit_cash_payments
            WHERE tenant_id = $1 AND branch_id IS NOT DISTINCT FROM $2 AND currency = $3
              AND method = 'cash' AND status = 'completed'"#,
        )
        .bind(tenant_id)
        .bind(branch_id)
        .bind(currency)
        .fetch_one(conn)
        .await?;
        Ok(total)
    }

    /// Replaces `current` with `next` only if the row is still at
    /// `current.version`.
    #[instrument(
        level = "trace",
        name = "remit_ledger.cash_balances.compare_and_swap",
        skip(self, conn, next),
        fields(id = %current.id, version = current.version)
    )]
    pub async fn compare_and_swap(
        &self,
        conn: &mut PgConnection,
        current: &CashBalance,
        next: &CashBalance,
    ) -> Result<(), CashBalanceError> {
        if !optimistic::lock_at_version(&mut *conn, current).await? {
            return Err(CashBalanceError::ConcurrentModification(current.id));
        }
        let result = sqlx::query(
            r#"UPDATE remit_cash_balances
            SET auto_calculated_balance = $3, manual_adjustment = $4, final_balance = $5,
                version = $6, last_calculated_at = $7, modified_at = $8
            WHERE id = $1 AND version = $2"#,
        )
        .bind(current.id)
        .bind(current.version)
        .bind(next.auto_calculated_balance)
        .bind(next.manual_adjustment)
        .bind(next.final_balance)
        .bind(next.version)
        .bind(next.last_calculated_at)
        .bind(next.modified_at)
        .execute(conn)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CashBalanceError::ConcurrentModification(current.id));
        }
        Ok(())
    }

    pub async fn insert_adjustment(
        &self,
        conn: &mut PgConnection,
        adjustment: &CashAdjustment,
    ) -> Result<(), CashBalanceError> {
        sqlx::query(
            r#"INSERT INTO remit_cash_adjustments
            (id, tenant_id, cash_balance_id, branch_id, currency, amount, reason,
             adjusted_by, balance_before, balance_after, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"#,
        )
        .bind(adjustment.id)
        .bind(adjustment.tenant_id)
        .bind(adjustment.cash_balance_id)
        .bind(adjustment.branch_id)
        .bind(adjustment.currency)
        .bind(adjustment.amount)
        .bind(&adjustment.reason)
        .bind(adjustment.adjusted_by)
        .bind(adjustment.balance_before)
        .bind(adjustment.balance_after)
        .bind(adjustment.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn list(&self, tenant_id: TenantId) -> Result<Vec<CashBalance>, CashBalanceError> {
        let balances = sqlx::query_as::<_, CashBalance>(
            r#"SELECT * FROM remit_cash_balances WHERE tenant_id = $1
            ORDER BY currency, branch_id NULLS FIRST"#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(balances)
    }

    pub async fn list_adjustments(
        &self,
        tenant_id: TenantId,
        cash_balance_id: CashBalanceId,
    ) -> Result<Vec<CashAdjustment>, CashBalanceError> {
        let adjustments = sqlx::query_as::<_, CashAdjustment>(
            r#"SELECT * FROM remit_cash_adjustments
            WHERE tenant_id = $1 AND cash_balance_id = $2
            ORDER BY created_at, id"#,
        )
        .bind(tenant_id)
        .bind(cash_balance_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(adjustments)
    }
}
