use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use super::{entity::*, error::RemittanceError};
use crate::primitives::*;

const OUTGOING_TABLE: &str = "remit_outgoing_remittances";
const INCOMING_TABLE: &str = "remit_incoming_remittances";

#[derive(Debug, Clone)]
pub(super) struct RemittanceRepo {
    pool: PgPool,
}

impl RemittanceRepo {
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }

    /// Next code for `prefix` in the tenant. The advisory lock is held until
    /// the surrounding transaction ends, so the insert that uses the code must
    /// happen in the same transaction.
    #[instrument(level = "trace", name = "remit_ledger.remittances.next_code", skip(self, conn))]
    pub async fn next_code(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        prefix: &str,
    ) -> Result<String, RemittanceError> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext(concat('remit_code', $1::text, $2::text)))")
            .bind(tenant_id)
            .bind(prefix)
            .execute(&mut *conn)
            .await?;
        let table = if prefix == OUTGOING_CODE_PREFIX {
            OUTGOING_TABLE
        } else {
            INCOMING_TABLE
        };
        let current: i64 = sqlx::query_scalar(&format!(
            r#"SELECT COALESCE(MAX(CAST(SUBSTRING(remittance_code FROM $3) AS BIGINT)), 0)
            FROM {table}
            WHERE tenant_id = $1 AND remittance_code LIKE $2"#
        ))
        .bind(tenant_id)
        .bind(format!("{prefix}-%"))
        .bind(prefix.len() as i32 + 2)
        .fetch_one(conn)
        .await?;
        Ok(format_code(prefix, current + 1))
    }

    pub async fn insert_outgoing(
        &self,
        conn: &mut PgConnection,
        remittance: &OutgoingRemittance,
    ) -> Result<(), RemittanceError> {
        sqlx::query(
            r#"INSERT INTO remit_outgoing_remittances
            (id, tenant_id, branch_id, remittance_code, sender_name, recipient_name, amount_irr,
             buy_rate_cad, equivalent_cad, settled_amount_irr, remaining_irr, total_profit_cad,
             status, notes, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"#,
        )
        .bind(remittance.id)
        .bind(remittance.tenant_id)
        .bind(remittance.branch_id)
        .bind(&remittance.remittance_code)
        .bind(&remittance.sender_name)
        .bind(&remittance.recipient_name)
        .bind(remittance.amount_irr)
        .bind(remittance.buy_rate_cad)
        .bind(remittance.equivalent_cad)
        .bind(remittance.settled_amount_irr)
        .bind(remittance.remaining_irr)
        .bind(remittance.total_profit_cad)
        .bind(remittance.status)
        .bind(&remittance.notes)
        .bind(remittance.created_by)
        .bind(remittance.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn insert_incoming(
        &self,
        conn: &mut PgConnection,
        remittance: &IncomingRemittance,
    ) -> Result<(), RemittanceError> {
        sqlx::query(
            r#"INSERT INTO remit_incoming_remittances
            (id, tenant_id, branch_id, remittance_code, sender_name, recipient_name, amount_irr,
             sell_rate_cad, equivalent_cad, allocated_irr, remaining_irr, status, notes,
             created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)"#,
        )
        .bind(remittance.id)
        .bind(remittance.tenant_id)
        .bind(remittance.branch_id)
        .bind(&remittance.remittance_code)
        .bind(&remittance.sender_name)
        .bind(&remittance.recipient_name)
        .bind(remittance.amount_irr)
        .bind(remittance.sell_rate_cad)
        .bind(remittance.equivalent_cad)
        .bind(remittance.allocated_irr)
        .bind(remittance.remaining_irr)
        .bind(remittance.status)
        .bind(&remittance.notes)
        .bind(remittance.created_by)
        .bind(remittance.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn find_outgoing(
        &self,
        tenant_id: TenantId,
        id: OutgoingRemittanceId,
    ) -> Result<OutgoingRemittance, RemittanceError> {
        sqlx::query_as::<_, OutgoingRemittance>(
            "SELECT * FROM remit_outgoing_remittances WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RemittanceError::OutgoingNotFound(id))
    }

    pub async fn find_incoming(
        &self,
        tenant_id: TenantId,
        id: IncomingRemittanceId,
    ) -> Result<IncomingRemittance, RemittanceError> {
        sqlx::query_as::<_, IncomingRemittance>(
            "SELECT * FROM remit_incoming_remittances WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RemittanceError::IncomingNotFound(id))
    }

    pub async fn find_outgoing_for_update(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        id: OutgoingRemittanceId,
    ) -> Result<OutgoingRemittance, RemittanceError> {
        sqlx::query_as::<_, OutgoingRemittance>(
            "SELECT * FROM remit_outgoing_remittances WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(RemittanceError::OutgoingNotFound(id))
    }

    pub async fn find_incoming_for_update(
        &self,
        conn: &mut PgConnection,
        tenant_id: TenantId,
        id: IncomingRemittanceId,
    ) -> Result<IncomingRemittance, RemittanceError> {
        sqlx::query_as::<_, IncomingRemittance>(
            "SELECT * FROM remit_incoming_remittances WHERE tenant_id = $1 AND id = $2 FOR UPDATE",
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or(RemittanceError::IncomingNotFound(id))
    }

    pub async fn update_outgoing(
        &self,
        conn: &mut PgConnection,
        remittance: &OutgoingRemittance,
    ) -> Result<(), RemittanceError> {
        sqlx::query(
            r#"UPDATE remit_outgoing_remittances
            SET settled_amount_irr = $2, remaining_irr = $3, total_profit_cad = $4, status = $5,
                completed_at = $6, cancelled_at = $7, cancellation_reason = $8
            WHERE id = $1"#,
        )
        .bind(remittance.id)
        .bind(remittance.settled_amount_irr)
        .bind(remittance.remaining_irr)
        .bind(remittance.total_profit_cad)
        .bind(remittance.status)
        .bind(remittance.completed_at)
        .bind(remittance.cancelled_at)
        .bind(&remittance.cancellation_reason)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn update_incoming(
        &self,
        conn: &mut PgConnection,
        remittance: &IncomingRemittance,
    ) -> Result<(), RemittanceError> {
        sqlx::query(
            r#"UPDATE remit_incoming_remittances
            SET allocated_irr = $2, remaining_irr = $3, status = $4, completed_at = $5,
                paid_at = $6, payment_reference = $7, cancelled_at = $8, cancellation_reason = $9
            WHERE id = $1"#,
        )
        .bind(remittance.id)
        .bind(remittance.allocated_irr)
        .bind(remittance.remaining_irr)
        .bind(remittance.status)
        .bind(remittance.completed_at)
        .bind(remittance.paid_at)
        .bind(&remittance.payment_reference)
        .bind(remittance.cancelled_at)
        .bind(&remittance.cancellation_reason)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn list_outgoing(
        &self,
        tenant_id: TenantId,
        status: Option<OutgoingStatus>,
    ) -> Result<Vec<OutgoingRemittance>, RemittanceError> {
        let remittances = sqlx::query_as::<_, OutgoingRemittance>(
            r#"SELECT * FROM remit_outgoing_remittances
            WHERE tenant_id = $1 AND ($2::OutgoingStatus IS NULL OR status = $2)
            ORDER BY created_at DESC, remittance_code DESC"#,
        )
        .bind(tenant_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(remittances)
    }

    pub async fn list_incoming(
        &self,
        tenant_id: TenantId,
        status: Option<IncomingStatus>,
    ) -> Result<Vec<IncomingRemittance>, RemittanceError> {
        let remittances = sqlx::query_as::<_, IncomingRemittance>(
            r#"SELECT * FROM remit_incoming_remittances
            WHERE tenant_id = $1 AND ($2::IncomingStatus IS NULL OR status = $2)
            ORDER BY created_at DESC, remittance_code DESC"#,
        )
        .bind(tenant_id)
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(remittances)
    }

    /// Pending and partial outgoings, oldest first.
    pub async fn list_settleable_outgoing(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<OutgoingRemittance>, RemittanceError> {
        let remittances = sqlx::query_as::<_, OutgoingRemittance>(
            r#"SELECT * FROM remit_outgoing_remittances
            WHERE tenant_id = $1 AND status IN ('pending', 'partial')
            ORDER BY created_at, remittance_code"#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(remittances)
    }
}
