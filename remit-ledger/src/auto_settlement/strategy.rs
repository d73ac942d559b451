use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::{primitives::*, remittance::OutgoingRemittance};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SettlementStrategy {
    /// Oldest outgoing first.
    Fifo,
    /// Newest outgoing first.
    Lifo,
    /// Widest spread first.
    BestRate,
    /// No automatic matching.
    Manual,
}

const BASE_SCORE: i64 = 50;
const MAX_AGE_BONUS: i64 = 30;
const MAX_PROFIT_BONUS: i64 = 20;
const FULL_SETTLEMENT_BONUS: i64 = 10;
const MAX_SCORE: u8 = 100;

/// Estimated CAD margin per IRR: `1/buy - 1/sell`.
pub(super) fn margin(buy_rate: Money, sell_rate: Money) -> Result<Money, MoneyError> {
    Ok(Money::ONE.checked_div(buy_rate)? - Money::ONE.checked_div(sell_rate)?)
}

/// Orders settleable outgoings for `strategy`. Ties break on remittance code.
pub(super) fn rank(
    candidates: Vec<OutgoingRemittance>,
    strategy: SettlementStrategy,
    sell_rate: Money,
) -> Result<Vec<OutgoingRemittance>, MoneyError> {
    let by_code = |a: &OutgoingRemittance, b: &OutgoingRemittance| {
        a.remittance_code.cmp(&b.remittance_code)
    };
    let mut ranked = candidates;
    match strategy {
        SettlementStrategy::Manual => ranked.clear(),
        SettlementStrategy::Fifo => {
            ranked.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| by_code(a, b)))
        }
        SettlementStrategy::Lifo => {
            ranked.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| by_code(a, b)))
        }
        SettlementStrategy::BestRate => {
            let mut keyed = ranked
                .into_iter()
                .map(|o| Ok((margin(o.buy_rate_cad, sell_rate)?, o)))
                .collect::<Result<Vec<_>, MoneyError>>()?;
            keyed.sort_by(|(ma, a), (mb, b)| mb.cmp(ma).then_with(|| by_code(a, b)));
            ranked = keyed.into_iter().map(|(_, o)| o).collect();
        }
    }
    Ok(ranked)
}

/// First-fit allocation of `available` over `ranked`, in order.
pub(super) fn allocate(
    ranked: Vec<OutgoingRemittance>,
    available: Money,
) -> Vec<(OutgoingRemittance, Money)> {
    let mut left = available;
    let mut allocations = Vec::new();
    for outgoing in ranked {
        if !left.is_positive() {
            break;
        }
        let amount = outgoing.remaining_irr.min(left);
        if !amount.is_positive() {
            continue;
        }
        left -= amount;
        allocations.push((outgoing, amount));
    }
    allocations
}

/// 0-100 ranking hint for operators. Does not influence allocation.
pub(super) fn match_score(
    outgoing: &OutgoingRemittance,
    sell_rate: Money,
    amount: Money,
    now: DateTime<Utc>,
) -> Result<u8, MoneyError> {
    let age_days = (now - outgoing.created_at).num_days().clamp(0, MAX_AGE_BONUS);
    let margin_percent =
        (Money::ONE - outgoing.buy_rate_cad.checked_div(sell_rate)?) * Money::ONE_HUNDRED;
    let profit_bonus = (margin_percent * Money::from(10))
        .max(Money::ZERO)
        .min(Money::from(MAX_PROFIT_BONUS));
    let full_bonus = if fully_settles(outgoing, amount) {
        FULL_SETTLEMENT_BONUS
    } else {
        0
    };
    let score = Money::from(BASE_SCORE + age_days + full_bonus) + profit_bonus;
    Ok(score
        .to_decimal()
        .floor()
        .to_u8()
        .map_or(MAX_SCORE, |s| s.min(MAX_SCORE)))
}

pub(super) fn fully_settles(outgoing: &OutgoingRemittance, amount: Money) -> bool {
    outgoing.remaining_irr - amount <= SETTLEMENT_TOLERANCE
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn outgoing(code: &str, buy_rate: i64, remaining: i64, days_old: i64) -> OutgoingRemittance {
        let created_at = Utc::now() - Duration::days(days_old);
        OutgoingRemittance {
            id: OutgoingRemittanceId::new(),
            tenant_id: TenantId::new(),
            branch_id: None,
            remittance_code: code.to_string(),
            sender_name: "sender".to_string(),
            recipient_name: "recipient".to_string(),
            amount_irr: Money::from(remaining),
            buy_rate_cad: Money::from(buy_rate),
            equivalent_cad: Money::ZERO,
            settled_amount_irr: Money::ZERO,
            remaining_irr: Money::from(remaining),
            total_profit_cad: Money::ZERO,
            status: OutgoingStatus::Pending,
            notes: None,
            created_by: UserId::new(),
            created_at,
            completed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
        }
    }

    fn codes(ranked: &[OutgoingRemittance]) -> Vec<&str> {
        ranked.iter().map(|o| o.remittance_code.as_str()).collect()
    }

    fn candidates() -> Vec<OutgoingRemittance> {
        vec![
            outgoing("OUT-000002", 84_500, 100, 5),
            outgoing("OUT-000001", 84_000, 100, 10),
            outgoing("OUT-000003", 83_000, 100, 1),
        ]
    }

    #[test]
    fn strategies_parse_from_snake_case() {
        assert_eq!(
            "best_rate".parse::<SettlementStrategy>().unwrap(),
            SettlementStrategy::BestRate
        );
        assert_eq!("FIFO".parse::<SettlementStrategy>().unwrap(), SettlementStrategy::Fifo);
        assert_eq!(SettlementStrategy::Lifo.to_string(), "lifo");
    }

    #[test]
    fn fifo_and_lifo_follow_creation_time() {
        let sell = Money::from(85_500);
        let fifo = rank(candidates(), SettlementStrategy::Fifo, sell).unwrap();
        assert_eq!(codes(&fifo), ["OUT-000001", "OUT-000002", "OUT-000003"]);
        let lifo = rank(candidates(), SettlementStrategy::Lifo, sell).unwrap();
        assert_eq!(codes(&lifo), ["OUT-000003", "OUT-000002", "OUT-000001"]);
    }

    #[test]
    fn best_rate_prefers_the_cheapest_buy() {
        let ranked = rank(candidates(), SettlementStrategy::BestRate, Money::from(85_500)).unwrap();
        assert_eq!(codes(&ranked), ["OUT-000003", "OUT-000001", "OUT-000002"]);
    }

    #[test]
    fn equal_keys_break_on_code() {
        let mut a = outgoing("OUT-000009", 84_000, 100, 0);
        let b = outgoing("OUT-000004", 84_000, 100, 0);
        a.created_at = b.created_at;
        let ranked = rank(vec![a, b], SettlementStrategy::BestRate, Money::from(85_500)).unwrap();
        assert_eq!(codes(&ranked), ["OUT-000004", "OUT-000009"]);
    }

    #[test]
    fn manual_ranks_nothing() {
        let ranked = rank(candidates(), SettlementStrategy::Manual, Money::from(85_500)).unwrap();
        assert!(ranked.is_empty());
    }

    #[test]
    fn allocation_is_first_fit() {
        let ranked = vec![
            outgoing("OUT-000001", 84_000, 100, 3),
            outgoing("OUT-000002", 84_000, 250, 2),
            outgoing("OUT-000003", 84_000, 50, 1),
        ];
        let allocations = allocate(ranked, Money::from(300));
        let amounts: Vec<_> = allocations
            .iter()
            .map(|(o, amount)| (o.remittance_code.as_str(), *amount))
            .collect();
        assert_eq!(
            amounts,
            [
                ("OUT-000001", Money::from(100)),
                ("OUT-000002", Money::from(200)),
            ]
        );
    }

    #[test]
    fn score_combines_age_profit_and_completion() {
        let old = outgoing("OUT-000001", 84_000, 100, 45);
        let fresh = outgoing("OUT-000002", 85_000, 100, 2);
        let losing = outgoing("OUT-000003", 86_000, 100, 0);
        let now = Utc::now();
        let sell = Money::from(85_500);

        // 50 + 30 + 17.54 + 10 is capped
        assert_eq!(match_score(&old, sell, Money::from(100), now).unwrap(), 100);
        // 50 + 2 + 5.84 for a partial match
        assert_eq!(match_score(&fresh, sell, Money::from(40), now).unwrap(), 57);
        // inverted spread earns no profit bonus
        assert_eq!(match_score(&losing, sell, Money::from(100), now).unwrap(), 60);
    }
}
