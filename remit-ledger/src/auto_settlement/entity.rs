use serde::{Deserialize, Serialize};

use crate::{primitives::*, settlement::Settlement};

use super::strategy::SettlementStrategy;

/// One proposed settlement of an incoming remittance against an outgoing one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettlementSuggestion {
    pub outgoing_id: OutgoingRemittanceId,
    pub outgoing_code: String,
    pub incoming_id: IncomingRemittanceId,
    pub amount_irr: Money,
    pub buy_rate_cad: Money,
    pub sell_rate_cad: Money,
    pub estimated_profit_cad: Money,
    pub fully_settles_outgoing: bool,
    pub match_score: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoSettleFailure {
    pub outgoing_id: OutgoingRemittanceId,
    pub outgoing_code: String,
    pub amount_irr: Money,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoSettleResult {
    pub strategy: SettlementStrategy,
    pub requested: usize,
    pub created: usize,
    pub settlements: Vec<Settlement>,
    pub failures: Vec<AutoSettleFailure>,
}
