use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::error::RemittanceError;
use crate::primitives::*;

pub(super) const OUTGOING_CODE_PREFIX: &str = "OUT";
pub(super) const INCOMING_CODE_PREFIX: &str = "IN";

pub(super) fn format_code(prefix: &str, sequence: i64) -> String {
    format!("{prefix}-{sequence:06}")
}

/// Money a customer hands over to be paid out abroad. The bureau owes the
/// recipient `amount_irr` and acquired it at `buy_rate_cad` IRR per CAD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OutgoingRemittance {
    pub id: OutgoingRemittanceId,
    pub tenant_id: TenantId,
    pub branch_id: Option<BranchId>,
    pub remittance_code: String,
    pub sender_name: String,
    pub recipient_name: String,
    pub amount_irr: Money,
    pub buy_rate_cad: Money,
    pub equivalent_cad: Money,
    pub settled_amount_irr: Money,
    pub remaining_irr: Money,
    pub total_profit_cad: Money,
    pub status: OutgoingStatus,
    pub notes: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

impl OutgoingRemittance {
    pub fn is_settled(&self) -> bool {
        self.remaining_irr <= SETTLEMENT_TOLERANCE
    }

    pub(crate) fn apply_settlement(
        &mut self,
        amount: Money,
        profit: Money,
        now: DateTime<Utc>,
    ) -> Result<(), RemittanceError> {
        if !self.status.is_open() {
            return Err(RemittanceError::NotSettleable {
                code: self.remittance_code.clone(),
                status: self.status.to_string(),
            });
        }
        if amount > self.remaining_irr {
            return Err(RemittanceError::ExceedsRemaining {
                code: self.remittance_code.clone(),
                requested: amount,
                remaining: self.remaining_irr,
            });
        }
        self.settled_amount_irr += amount;
        self.remaining_irr -= amount;
        self.total_profit_cad = (self.total_profit_cad + profit).round_money();
        if self.is_settled() {
            self.status = OutgoingStatus::Completed;
            self.completed_at = Some(now);
        } else {
            self.status = OutgoingStatus::Partial;
        }
        Ok(())
    }

    pub(super) fn cancel(
        &mut self,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<(), RemittanceError> {
        if !self.status.is_open() {
            return Err(RemittanceError::InvalidTransition {
                code: self.remittance_code.clone(),
                from: self.status.to_string(),
                to: OutgoingStatus::Cancelled.to_string(),
            });
        }
        if self.settled_amount_irr.is_positive() {
            return Err(RemittanceError::CannotCancel {
                code: self.remittance_code.clone(),
                settled: self.settled_amount_irr,
            });
        }
        self.status = OutgoingStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.cancellation_reason = Some(reason);
        Ok(())
    }
}

/// Money arriving from abroad to be disbursed locally, sold at
/// `sell_rate_cad` IRR per CAD. Settlements allocate it to outgoings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IncomingRemittance {
    pub id: IncomingRemittanceId,
    pub tenant_id: TenantId,
    pub branch_id: Option<BranchId>,
    pub remittance_code: String,
    pub sender_name: String,
    pub recipient_name: String,
    pub amount_irr: Money,
    pub sell_rate_cad: Money,
    pub equivalent_cad: Money,
    pub allocated_irr: Money,
    pub remaining_irr: Money,
    pub status: IncomingStatus,
    pub notes: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub payment_reference: Option<String>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
}

impl IncomingRemittance {
    pub fn is_fully_allocated(&self) -> bool {
        self.remaining_irr <= SETTLEMENT_TOLERANCE
    }

    pub(crate) fn apply_allocation(
        &mut self,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<(), RemittanceError> {
        if !self.status.is_open() {
            return Err(RemittanceError::NotSettleable {
                code: self.remittance_code.clone(),
                status: self.status.to_string(),
            });
        }
        if amount > self.remaining_irr {
            return Err(RemittanceError::ExceedsRemaining {
                code: self.remittance_code.clone(),
                requested: amount,
                remaining: self.remaining_irr,
            });
        }
        self.allocated_irr += amount;
        self.remaining_irr -= amount;
        if self.is_fully_allocated() {
            self.status = IncomingStatus::Completed;
            self.completed_at = Some(now);
        } else {
            self.status = IncomingStatus::Partial;
        }
        Ok(())
    }

    pub(super) fn cancel(
        &mut self,
        reason: String,
        now: DateTime<Utc>,
    ) -> Result<(), RemittanceError> {
        if !self.status.is_open() {
            return Err(RemittanceError::InvalidTransition {
                code: self.remittance_code.clone(),
                from: self.status.to_string(),
                to: IncomingStatus::Cancelled.to_string(),
            });
        }
        if self.allocated_irr.is_positive() {
            return Err(RemittanceError::CannotCancel {
                code: self.remittance_code.clone(),
                settled: self.allocated_irr,
            });
        }
        self.status = IncomingStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.cancellation_reason = Some(reason);
        Ok(())
    }

    pub(super) fn mark_paid(
        &mut self,
        reference: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), RemittanceError> {
        if !self.is_fully_allocated() {
            return Err(RemittanceError::NotFullyAllocated {
                code: self.remittance_code.clone(),
                remaining: self.remaining_irr,
            });
        }
        if self.status != IncomingStatus::Completed {
            return Err(RemittanceError::InvalidTransition {
                code: self.remittance_code.clone(),
                from: self.status.to_string(),
                to: IncomingStatus::Paid.to_string(),
            });
        }
        self.status = IncomingStatus::Paid;
        self.paid_at = Some(now);
        self.payment_reference = reference;
        Ok(())
    }
}

#[derive(Builder, Debug, Clone)]
pub struct NewOutgoingRemittance {
    #[builder(setter(into))]
    pub(super) tenant_id: TenantId,
    #[builder(setter(strip_option, into), default)]
    pub(super) branch_id: Option<BranchId>,
    #[builder(setter(into))]
    pub(super) sender_name: String,
    #[builder(setter(into))]
    pub(super) recipient_name: String,
    #[builder(setter(into))]
    pub(super) amount_irr: Money,
    #[builder(setter(into))]
    pub(super) buy_rate_cad: Money,
    #[builder(setter(strip_option, into), default)]
    pub(super) notes: Option<String>,
    #[builder(setter(into))]
    pub(super) created_by: UserId,
}

impl NewOutgoingRemittance {
    pub fn builder() -> NewOutgoingRemittanceBuilder {
        NewOutgoingRemittanceBuilder::default()
    }

    pub(super) fn validate(&self) -> Result<(), RemittanceError> {
        validate_amount_and_rate(self.amount_irr, self.buy_rate_cad)
    }

    pub(super) fn into_remittance(
        self,
        remittance_code: String,
        now: DateTime<Utc>,
    ) -> Result<OutgoingRemittance, RemittanceError> {
        let equivalent_cad = self.amount_irr.checked_div(self.buy_rate_cad)?.round_money();
        Ok(OutgoingRemittance {
            id: OutgoingRemittanceId::new(),
            tenant_id: self.tenant_id,
            branch_id: self.branch_id,
            remittance_code,
            sender_name: self.sender_name,
            recipient_name: self.recipient_name,
            amount_irr: self.amount_irr,
            buy_rate_cad: self.buy_rate_cad,
            equivalent_cad,
            settled_amount_irr: Money::ZERO,
            remaining_irr: self.amount_irr,
            total_profit_cad: Money::ZERO,
            status: OutgoingStatus::Pending,
            notes: self.notes,
            created_by: self.created_by,
            created_at: now,
            completed_at: None,
            cancelled_at: None,
            cancellation_reason: None,
        })
    }
}

#[derive(Builder, Debug, Clone)]
pub struct NewIncomingRemittance {
    #[builder(setter(into))]
    pub(super) tenant_id: TenantId,
    #[builder(setter(strip_option, into), default)]
    pub(super) branch_id: Option<BranchId>,
    #[builder(setter(into))]
    pub(super) sender_name: String,
    #[builder(setter(into))]
    pub(super) recipient_name: String,
    #[builder(setter(into))]
    pub(super) amount_irr: Money,
    #[builder(setter(into))]
    pub(super) sell_rate_cad: Money,
    #[builder(setter(strip_option, into), default)]
    pub(super) notes: Option<String>,
    #[builder(setter(into))]
    pub(super) created_by: UserId,
}

impl NewIncomingRemittance {
    pub fn builder() -> NewIncomingRemittanceBuilder {
        NewIncomingRemittanceBuilder::default()
    }

    pub(super) fn validate(&self) -> Result<(), RemittanceError> {
        validate_amount_and_rate(self.amount_irr, self.sell_rate_cad)
    }

    pub(super) fn into_remittance(
        self,
        remittance_code: String,
        now: DateTime<Utc>,
    ) -> Result<IncomingRemittance, RemittanceError> {
        let equivalent_cad = self.amount_irr.checked_div(self.sell_rate_cad)?.round_money();
        Ok(IncomingRemittance {
            id: IncomingRemittanceId::new(),
            tenant_id: self.tenant_id,
            branch_id: self.branch_id,
            remittance_code,
            sender_name: self.sender_name,
            recipient_name: self.recipient_name,
            amount_irr: self.amount_irr,
            sell_rate_cad: self.sell_rate_cad,
            equivalent_cad,
            allocated_irr: Money::ZERO,
            remaining_irr: self.amount_irr,
            status: IncomingStatus::Pending,
            notes: self.notes,
            created_by: self.created_by,
            created_at: now,
            completed_at: None,
            paid_at: None,
            payment_reference: None,
            cancelled_at: None,
            cancellation_reason: None,
        })
    }
}

fn validate_amount_and_rate(amount: Money, rate: Money) -> Result<(), RemittanceError> {
    if !amount.is_positive() {
        return Err(RemittanceError::InvalidAmount(amount));
    }
    if !rate.is_positive() {
        return Err(RemittanceError::InvalidRate(rate));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn outgoing(amount: i64, buy_rate: i64) -> OutgoingRemittance {
        NewOutgoingRemittance::builder()
            .tenant_id(TenantId::new())
            .sender_name("Sara")
            .recipient_name("Reza")
            .amount_irr(Money::from(amount))
            .buy_rate_cad(Money::from(buy_rate))
            .created_by(UserId::new())
            .build()
            .unwrap()
            .into_remittance(format_code(OUTGOING_CODE_PREFIX, 1), Utc::now())
            .unwrap()
    }

    fn incoming(amount: i64, sell_rate: i64) -> IncomingRemittance {
        NewIncomingRemittance::builder()
            .tenant_id(TenantId::new())
            .sender_name("Ali")
            .recipient_name("Mina")
            .amount_irr(Money::from(amount))
            .sell_rate_cad(Money::from(sell_rate))
            .created_by(UserId::new())
            .build()
            .unwrap()
            .into_remittance(format_code(INCOMING_CODE_PREFIX, 1), Utc::now())
            .unwrap()
    }

    fn remaining_invariant_holds(o: &OutgoingRemittance) -> bool {
        o.remaining_irr == o.amount_irr - o.settled_amount_irr && !o.remaining_irr.is_negative()
    }

    #[test]
    fn codes_are_zero_padded() {
        assert_eq!(format_code("OUT", 1), "OUT-000001");
        assert_eq!(format_code("IN", 123_456), "IN-123456");
        assert_eq!(format_code("IN", 1_234_567), "IN-1234567");
    }

    #[test]
    fn new_outgoing_starts_pending_with_equivalent() {
        let o = outgoing(500_000_000, 84_000);
        assert_eq!(o.status, OutgoingStatus::Pending);
        assert_eq!(o.remaining_irr, o.amount_irr);
        assert_eq!(o.equivalent_cad, Money::from(dec!(5952.38095238)));
    }

    #[test]
    fn rejects_non_positive_rate_and_amount() {
        let new = NewOutgoingRemittance::builder()
            .tenant_id(TenantId::new())
            .sender_name("a")
            .recipient_name("b")
            .amount_irr(Money::from(100))
            .buy_rate_cad(Money::ZERO)
            .created_by(UserId::new())
            .build()
            .unwrap();
        assert!(matches!(new.validate(), Err(RemittanceError::InvalidRate(_))));
        let new = NewIncomingRemittance::builder()
            .tenant_id(TenantId::new())
            .sender_name("a")
            .recipient_name("b")
            .amount_irr(Money::from(-1))
            .sell_rate_cad(Money::from(85_500))
            .created_by(UserId::new())
            .build()
            .unwrap();
        assert!(matches!(new.validate(), Err(RemittanceError::InvalidAmount(_))));
    }

    #[test]
    fn settles_partially_then_completes() {
        let now = Utc::now();
        let mut o = outgoing(500_000_000, 84_000);
        o.apply_settlement(Money::from(200_000_000), Money::from(10), now)
            .unwrap();
        assert_eq!(o.status, OutgoingStatus::Partial);
        assert!(remaining_invariant_holds(&o));
        o.apply_settlement(Money::from(300_000_000), Money::from(5), now)
            .unwrap();
        assert_eq!(o.status, OutgoingStatus::Completed);
        assert_eq!(o.completed_at, Some(now));
        assert_eq!(o.total_profit_cad, Money::from(15));
        assert!(remaining_invariant_holds(&o));
    }

    #[test]
    fn residue_within_tolerance_completes() {
        let mut o = outgoing(1_000, 84_000);
        o.apply_settlement(Money::from(dec!(999.995)), Money::ZERO, Utc::now())
            .unwrap();
        assert_eq!(o.status, OutgoingStatus::Completed);
    }

    #[test]
    fn over_settlement_leaves_state_untouched() {
        let mut o = outgoing(1_000, 84_000);
        let before = o.clone();
        let err = o
            .apply_settlement(Money::from(1_001), Money::ZERO, Utc::now())
            .unwrap_err();
        assert!(matches!(err, RemittanceError::ExceedsRemaining { .. }));
        assert_eq!(o, before);
    }

    #[test]
    fn completed_outgoing_is_not_settleable() {
        let mut o = outgoing(1_000, 84_000);
        o.apply_settlement(Money::from(1_000), Money::ZERO, Utc::now())
            .unwrap();
        let err = o
            .apply_settlement(Money::from(dec!(0.001)), Money::ZERO, Utc::now())
            .unwrap_err();
        assert!(matches!(err, RemittanceError::NotSettleable { .. }));
    }

    #[test]
    fn cancel_only_before_any_settlement() {
        let now = Utc::now();
        let mut untouched = outgoing(1_000, 84_000);
        untouched.cancel("customer request".to_string(), now).unwrap();
        assert_eq!(untouched.status, OutgoingStatus::Cancelled);
        assert!(untouched.cancel("again".to_string(), now).is_err());

        let mut settled = outgoing(1_000, 84_000);
        settled
            .apply_settlement(Money::from(10), Money::ZERO, now)
            .unwrap();
        let err = settled.cancel("too late".to_string(), now).unwrap_err();
        assert!(matches!(err, RemittanceError::CannotCancel { .. }));
        assert_eq!(settled.status, OutgoingStatus::Partial);
    }

    #[test]
    fn incoming_is_paid_only_once_fully_allocated() {
        let now = Utc::now();
        let mut i = incoming(1_000, 85_500);
        i.apply_allocation(Money::from(600), now).unwrap();
        assert_eq!(i.status, IncomingStatus::Partial);
        assert!(matches!(
            i.mark_paid(None, now),
            Err(RemittanceError::NotFullyAllocated { .. })
        ));
        i.apply_allocation(Money::from(400), now).unwrap();
        assert_eq!(i.status, IncomingStatus::Completed);
        i.mark_paid(Some("WIRE-42".to_string()), now).unwrap();
        assert_eq!(i.status, IncomingStatus::Paid);
        assert_eq!(i.payment_reference.as_deref(), Some("WIRE-42"));
        assert!(i.mark_paid(None, now).is_err());
    }

    #[test]
    fn allocated_incoming_cannot_be_cancelled() {
        let now = Utc::now();
        let mut i = incoming(1_000, 85_500);
        i.apply_allocation(Money::from(1), now).unwrap();
        assert!(matches!(
            i.cancel("oops".to_string(), now),
            Err(RemittanceError::CannotCancel { .. })
        ));
    }
}
