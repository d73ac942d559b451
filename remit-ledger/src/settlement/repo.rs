use sqlx::{PgConnection, PgPool};

use super::{entity::*, error::SettlementError};
use crate::primitives::*;

#[derive(Debug, Clone)]
pub(super) struct SettlementRepo {
    pool: PgPool,
}

impl SettlementRepo {
    pub fn new(pool: &PgPool) -> Self {
        Self { pool: pool.clone() }
    }

    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        settlement: &Settlement,
    ) -> Result<(), SettlementError> {
        sqlx::query(
            r#"INSERT INTO remit_settlements
            (id, tenant_id, outgoing_remittance_id, incoming_remittance_id, settled_amount_irr,
             outgoing_buy_rate, incoming_sell_rate, profit_cad, notes, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"#,
        )
        .bind(settlement.id)
        .bind(settlement.tenant_id)
        .bind(settlement.outgoing_remittance_id)
        .bind(settlement.incoming_remittance_id)
        .bind(settlement.settled_amount_irr)
        .bind(settlement.outgoing_buy_rate)
        .bind(settlement.incoming_sell_rate)
        .bind(settlement.profit_cad)
        .bind(&settlement.notes)
        .bind(settlement.created_by)
        .bind(settlement.created_at)
        .execute(conn)
        .await?;
        Ok(())
    }

    pub async fn list_for_outgoing(
        &self,
        tenant_id: TenantId,
        id: OutgoingRemittanceId,
    ) -> Result<Vec<Settlement>, SettlementError> {
        let settlements = sqlx::query_as::<_, Settlement>(
            r#"SELECT * FROM remit_settlements
            WHERE tenant_id = $1 AND outgoing_remittance_id = $2
            ORDER BY created_at, id"#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(settlements)
    }

    pub async fn list_for_incoming(
        &self,
        tenant_id: TenantId,
        id: IncomingRemittanceId,
    ) -> Result<Vec<Settlement>, SettlementError> {
        let settlements = sqlx::query_as::<_, Settlement>(
            r#"SELECT * FROM remit_settlements
            WHERE tenant_id = $1 AND incoming_remittance_id = $2
            ORDER BY created_at, id"#,
        )
        .bind(tenant_id)
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(settlements)
    }
}
