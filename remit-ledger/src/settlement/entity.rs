use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::primitives::*;

/// Immutable match of part of an incoming remittance against an outgoing one,
/// with the rates frozen at settlement time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Settlement {
    pub id: SettlementId,
    pub tenant_id: TenantId,
    pub outgoing_remittance_id: OutgoingRemittanceId,
    pub incoming_remittance_id: IncomingRemittanceId,
    pub settled_amount_irr: Money,
    pub outgoing_buy_rate: Money,
    pub incoming_sell_rate: Money,
    pub profit_cad: Money,
    pub notes: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Builder, Debug, Clone)]
pub struct SettleRequest {
    #[builder(setter(into))]
    pub(crate) tenant_id: TenantId,
    #[builder(setter(into))]
    pub(crate) outgoing_id: OutgoingRemittanceId,
    #[builder(setter(into))]
    pub(crate) incoming_id: IncomingRemittanceId,
    #[builder(setter(into))]
    pub(crate) amount_irr: Money,
    #[builder(setter(into))]
    pub(crate) created_by: UserId,
    #[builder(setter(strip_option, into), default)]
    pub(crate) notes: Option<String>,
}

impl SettleRequest {
    pub fn builder() -> SettleRequestBuilder {
        SettleRequestBuilder::default()
    }
}

/// CAD spread earned by settling `amount_irr`: what the IRR cost at the
/// outgoing buy rate minus what it is sold for at the incoming sell rate.
/// Both rates are IRR per CAD.
pub fn settlement_profit(
    amount_irr: Money,
    buy_rate: Money,
    sell_rate: Money,
) -> Result<Money, MoneyError> {
    let cost = amount_irr.checked_div(buy_rate)?;
    let revenue = amount_irr.checked_div(sell_rate)?;
    Ok((cost - revenue).round_money())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn profit_is_positive_when_sell_rate_is_higher() {
        let profit = settlement_profit(
            Money::from(500_000_000),
            Money::from(84_000),
            Money::from(85_500),
        )
        .unwrap();
        assert_eq!(profit, Money::from(dec!(104.42773601)));
    }

    #[test]
    fn profit_is_negative_on_an_inverted_spread() {
        let profit = settlement_profit(
            Money::from(84_000),
            Money::from(84_000),
            Money::from(80_000),
        )
        .unwrap();
        assert_eq!(profit, Money::from(dec!(-0.05)));
    }

    #[test]
    fn zero_rate_is_an_error() {
        assert!(settlement_profit(Money::from(1), Money::ZERO, Money::from(1)).is_err());
    }
}
