use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::primitives::*;

/// Money moving through a tenant's till. Positive amounts are cash received,
/// negative amounts cash paid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CashPayment {
    pub id: CashPaymentId,
    pub tenant_id: TenantId,
    pub branch_id: Option<BranchId>,
    pub client_id: Option<ClientId>,
    pub currency: Currency,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub reference: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl CashPayment {
    /// Whether completing this payment moves a cash balance.
    pub fn affects_cash_balance(&self) -> bool {
        self.method == PaymentMethod::Cash
    }
}

#[derive(Builder, Debug, Clone)]
pub struct NewCashPayment {
    #[builder(setter(into))]
    pub(super) tenant_id: TenantId,
    #[builder(setter(strip_option, into), default)]
    pub(super) branch_id: Option<BranchId>,
    #[builder(setter(strip_option, into), default)]
    pub(super) client_id: Option<ClientId>,
    pub(super) currency: Currency,
    #[builder(setter(into))]
    pub(super) amount: Money,
    #[builder(default)]
    pub(super) method: PaymentMethod,
    #[builder(default)]
    pub(super) status: PaymentStatus,
    #[builder(setter(strip_option, into), default)]
    pub(super) reference: Option<String>,
    #[builder(setter(into))]
    pub(super) created_by: UserId,
}

impl NewCashPayment {
    pub fn builder() -> NewCashPaymentBuilder {
        NewCashPaymentBuilder::default()
    }

    pub(super) fn into_payment(self, now: DateTime<Utc>) -> CashPayment {
        let completed_at = (self.status == PaymentStatus::Completed).then_some(now);
        let cancelled_at = (self.status == PaymentStatus::Cancelled).then_some(now);
        CashPayment {
            id: CashPaymentId::new(),
            tenant_id: self.tenant_id,
            branch_id: self.branch_id,
            client_id: self.client_id,
            currency: self.currency,
            amount: self.amount,
            method: self.method,
            status: self.status,
            reference: self.reference,
            created_by: self.created_by,
            created_at: now,
            completed_at,
            cancelled_at,
        }
    }
}
