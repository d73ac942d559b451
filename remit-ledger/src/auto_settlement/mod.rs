//! Proposes, and optionally executes, settlements for an incoming remittance
//! against the tenant's open outgoing remittances.
mod entity;
pub mod error;
mod strategy;

use sqlx::PgPool;
use tracing::instrument;

use crate::{
    ledger_operation::db_now,
    primitives::*,
    remittance::Remittances,
    settlement::{settlement_profit, SettleRequest, Settlements},
};

pub use entity::*;
use error::*;
pub use strategy::SettlementStrategy;
use strategy::*;

#[derive(Clone)]
pub struct AutoSettlements {
    remittances: Remittances,
    settlements: Settlements,
    pool: PgPool,
}

impl AutoSettlements {
    pub(crate) fn new(
        pool: &PgPool,
        remittances: &Remittances,
        settlements: &Settlements,
    ) -> Self {
        Self {
            remittances: remittances.clone(),
            settlements: settlements.clone(),
            pool: pool.clone(),
        }
    }

    #[instrument(name = "remit_ledger.auto_settlements.suggest", skip(self), err)]
    pub async fn suggest(
        &self,
        tenant_id: TenantId,
        incoming_id: IncomingRemittanceId,
        strategy: SettlementStrategy,
    ) -> Result<Vec<SettlementSuggestion>, AutoSettlementError> {
        let incoming = self.remittances.find_incoming(tenant_id, incoming_id).await?;
        if !incoming.status.is_open() {
            return Err(AutoSettlementError::IncomingNotOpen {
                code: incoming.remittance_code,
                status: incoming.status,
            });
        }
        if strategy == SettlementStrategy::Manual {
            return Ok(Vec::new());
        }
        let candidates = self
            .remittances
            .list_settleable_outgoing(tenant_id)
            .await?;
        let sell_rate = incoming.sell_rate_cad;
        let ranked = rank(candidates, strategy, sell_rate)?;
        let now = db_now(&self.pool).await?;
        allocate(ranked, incoming.remaining_irr)
            .into_iter()
            .map(|(outgoing, amount)| {
                Ok::<_, AutoSettlementError>(SettlementSuggestion {
                    estimated_profit_cad: settlement_profit(
                        amount,
                        outgoing.buy_rate_cad,
                        sell_rate,
                    )?,
                    fully_settles_outgoing: fully_settles(&outgoing, amount),
                    match_score: match_score(&outgoing, sell_rate, amount, now)?,
                    outgoing_id: outgoing.id,
                    outgoing_code: outgoing.remittance_code,
                    incoming_id,
                    amount_irr: amount,
                    buy_rate_cad: outgoing.buy_rate_cad,
                    sell_rate_cad: sell_rate,
                })
            })
            .collect()
    }

    /// Suggests and then executes in one call.
    #[instrument(name = "remit_ledger.auto_settlements.auto_settle", skip(self), err)]
    pub async fn auto_settle(
        &self,
        tenant_id: TenantId,
        incoming_id: IncomingRemittanceId,
        strategy: SettlementStrategy,
        user_id: UserId,
    ) -> Result<AutoSettleResult, AutoSettlementError> {
        let suggestions = self.suggest(tenant_id, incoming_id, strategy).await?;
        Ok(self.execute(tenant_id, strategy, user_id, suggestions).await)
    }

    /// Executes every suggestion as its own settlement. A failing candidate is
    /// reported in the result and does not stop the batch.
    #[instrument(
        name = "remit_ledger.auto_settlements.execute",
        skip(self, suggestions),
        fields(requested = suggestions.len())
    )]
    pub async fn execute(
        &self,
        tenant_id: TenantId,
        strategy: SettlementStrategy,
        user_id: UserId,
        suggestions: Vec<SettlementSuggestion>,
    ) -> AutoSettleResult {
        let mut result = AutoSettleResult {
            strategy,
            requested: suggestions.len(),
            created: 0,
            settlements: Vec::new(),
            failures: Vec::new(),
        };
        for suggestion in suggestions {
            let request = SettleRequest {
                tenant_id,
                outgoing_id: suggestion.outgoing_id,
                incoming_id: suggestion.incoming_id,
                amount_irr: suggestion.amount_irr,
                created_by: user_id,
                notes: Some(format!("auto-settled ({strategy})")),
            };
            match self.settlements.settle(request).await {
                Ok(settlement) => {
                    result.created += 1;
                    result.settlements.push(settlement);
                }
                Err(e) => {
                    tracing::warn!(
                        outgoing = %suggestion.outgoing_code,
                        amount_irr = %suggestion.amount_irr,
                        error = %e,
                        "skipping auto-settlement candidate"
                    );
                    result.failures.push(AutoSettleFailure {
                        outgoing_id: suggestion.outgoing_id,
                        outgoing_code: suggestion.outgoing_code,
                        amount_irr: suggestion.amount_irr,
                        error: e.to_string(),
                    });
                }
            }
        }
        result
    }
}
