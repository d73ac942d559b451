//! Matching incoming funds against outgoing obligations.
mod entity;
pub mod error;
mod repo;

use sqlx::PgPool;
use tracing::instrument;

use crate::{ledger_operation::*, primitives::*, remittance::Remittances};

pub use entity::*;
use error::*;
use repo::*;

#[derive(Clone)]
pub struct Settlements {
    repo: SettlementRepo,
    remittances: Remittances,
    pool: PgPool,
}

impl Settlements {
    pub(crate) fn new(pool: &PgPool, remittances: &Remittances) -> Self {
        Self {
            repo: SettlementRepo::new(pool),
            remittances: remittances.clone(),
            pool: pool.clone(),
        }
    }

    #[instrument(name = "remit_ledger.settlements.settle", skip(self), err)]
    pub async fn settle(&self, request: SettleRequest) -> Result<Settlement, SettlementError> {
        let mut op = LedgerOperation::init(&self.pool).await?;
        let settlement = self.settle_in_op(&mut op, request).await?;
        op.commit().await?;
        tracing::info!(
            settlement_id = %settlement.id,
            amount_irr = %settlement.settled_amount_irr,
            profit_cad = %settlement.profit_cad,
            "remittances settled"
        );
        Ok(settlement)
    }

    /// Locks the outgoing row, then the incoming row, and applies the
    /// settlement to both. Nothing is written unless every check passes.
    pub async fn settle_in_op(
        &self,
        op: &mut LedgerOperation<'_>,
        request: SettleRequest,
    ) -> Result<Settlement, SettlementError> {
        if !request.amount_irr.is_positive() {
            return Err(SettlementError::InvalidAmount(request.amount_irr));
        }
        let mut outgoing = self
            .remittances
            .lock_outgoing_in_op(op, request.tenant_id, request.outgoing_id)
            .await?;
        let mut incoming = self
            .remittances
            .lock_incoming_in_op(op, request.tenant_id, request.incoming_id)
            .await?;

        let amount = request.amount_irr;
        let profit = settlement_profit(amount, outgoing.buy_rate_cad, incoming.sell_rate_cad)?;
        outgoing.apply_settlement(amount, profit, op.now())?;
        incoming.apply_allocation(amount, op.now())?;

        let settlement = Settlement {
            id: SettlementId::new(),
            tenant_id: request.tenant_id,
            outgoing_remittance_id: outgoing.id,
            incoming_remittance_id: incoming.id,
            settled_amount_irr: amount,
            outgoing_buy_rate: outgoing.buy_rate_cad,
            incoming_sell_rate: incoming.sell_rate_cad,
            profit_cad: profit,
            notes: request.notes,
            created_by: request.created_by,
            created_at: op.now(),
        };
        self.repo.insert(op.as_executor(), &settlement).await?;
        self.remittances.update_outgoing_in_op(op, &outgoing).await?;
        self.remittances.update_incoming_in_op(op, &incoming).await?;
        Ok(settlement)
    }

    #[instrument(name = "remit_ledger.settlements.list_for_outgoing", skip(self), err)]
    pub async fn list_for_outgoing(
        &self,
        tenant_id: TenantId,
        id: OutgoingRemittanceId,
    ) -> Result<Vec<Settlement>, SettlementError> {
        self.repo.list_for_outgoing(tenant_id, id).await
    }

    #[instrument(name = "remit_ledger.settlements.list_for_incoming", skip(self), err)]
    pub async fn list_for_incoming(
        &self,
        tenant_id: TenantId,
        id: IncomingRemittanceId,
    ) -> Result<Vec<Settlement>, SettlementError> {
        self.repo.list_for_incoming(tenant_id, id).await
    }
}
