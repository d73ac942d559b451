use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use super::{entity::*, error::PaymentError};
use crate::primitives::*;

#[derive(Debug, Clone)]
pub(super) struct CashPaymentRepo {
    pool: PgPool,
}

impl CashPaymentRepo {
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }

    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        payment: &CashPayment,
    ) -> Result<(), PaymentError> {
        sqlx::query(
            r#"INSERT INTO remit_cash_payments
            (id, tenant_id, branch_id, client_id, currency, amount, method, status,
             reference, created_by, created_at, completed_at, cancelled_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"#,
        )
        .bind(payment.id)
        .bind(payment.tenant_id)
        .bind(payment.branch_id)
        .bind(payment.client_id)
        .bind(payment.currency)
        .bind(payment.amount)
        .bind(payment.method)
        .bind(payment.status)
        .bind(&payment.reference)
        .bind(payment.created_by)
        .bind(payment.created_at)
        .bind(payment.completed_at)
        .bind(payment.cancelled_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn find(
        &self,
        tenant_id: TenantId,
        id: CashPaymentId,
    ) -> Result<CashPayment, PaymentError> {
        sqlx::query_as::<_, CashPayment>(
            "SELECT * FROM remit_cash_payments WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(PaymentError::NotFound(id))
    }

    pub async fn find_for_update(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        id: CashPaymentId,
    ) -> Result<CashPayment, PaymentError> {
        sqlx::query_as::<_, CashPayment>(
            "SELECT * FROM remit_cash_payments WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(PaymentError::NotFound(id))
    }

    pub async fn mark_completed(
        &self,
        conn: &mut PgConnection,
        id: CashPaymentId,
        at: DateTime<Utc>,
    ) -> Result<(), PaymentError> {
        sqlx::query(
            "UPDATE remit_cash_payments SET status = 'completed', completed_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn mark_cancelled(
        &self,
        conn: &mut PgConnection,
        id: CashPaymentId,
        at: DateTime<Utc>,
    ) -> Result<(), PaymentError> {
        sqlx::query(
            "UPDATE remit_cash_payments SET status = 'cancelled', cancelled_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn list(&self, tenant_id: TenantId) -> Result<Vec<CashPayment>, PaymentError> {
        let payments = sqlx::query_as::<_, CashPayment>(
            "SELECT * FROM remit_cash_payments WHERE tenant_id = $1 ORDER BY created_at DESC, id",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(payments)
    }
}
