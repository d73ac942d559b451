use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::{optimistic::Versioned, primitives::*};

/// Running cash position of a tenant (optionally a branch) in one currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CashBalance {
    pub id: CashBalanceId,
    pub tenant_id: TenantId,
    pub branch_id: Option<BranchId>,
    pub currency: Currency,
    pub auto_calculated_balance: Money,
    pub manual_adjustment: Money,
    pub final_balance: Money,
    pub version: i32,
    pub last_calculated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl CashBalance {
    pub(super) fn seed(
        tenant_id: TenantId,
        branch_id: Option<BranchId>,
        currency: Currency,
        auto_calculated_balance: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: CashBalanceId::new(),
            tenant_id,
            branch_id,
            currency,
            auto_calculated_balance,
            manual_adjustment: Money::ZERO,
            final_balance: auto_calculated_balance,
            version: 1,
            last_calculated_at: now,
            created_at: now,
            modified_at: now,
        }
    }

    pub(super) fn with_manual_adjustment(
        &self,
        amount: Money,
        now: DateTime<Utc>,
    ) -> Result<Self, MoneyError> {
        Ok(Self {
            manual_adjustment: self.manual_adjustment.checked_add(amount)?,
            final_balance: self.final_balance.checked_add(amount)?,
            version: self.version + 1,
            modified_at: now,
            ..self.clone()
        })
    }

    pub(super) fn with_payment(
        &self,
        delta: Money,
        now: DateTime<Utc>,
    ) -> Result<Self, MoneyError> {
        Ok(Self {
            auto_calculated_balance: self.auto_calculated_balance.checked_add(delta)?,
            final_balance: self.final_balance.checked_add(delta)?,
            version: self.version + 1,
            modified_at: now,
            ..self.clone()
        })
    }

    pub(super) fn recalculated(
        &self,
        auto_calculated_balance: Money,
        now: DateTime<Utc>,
    ) -> Result<Self, MoneyError> {
        Ok(Self {
            auto_calculated_balance,
            final_balance: auto_calculated_balance.checked_add(self.manual_adjustment)?,
            version: self.version + 1,
            last_calculated_at: now,
            modified_at: now,
            ..self.clone()
        })
    }
}

impl Versioned for CashBalance {
    const TABLE: &'static str = "remit_cash_balances";

    fn row_id(&self) -> uuid::Uuid {
        self.id.into()
    }

    fn version(&self) -> i32 {
        self.version
    }
}

/// Audit row of one manual change to a [`CashBalance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CashAdjustment {
    pub id: CashAdjustmentId,
    pub tenant_id: TenantId,
    pub cash_balance_id: CashBalanceId,
    pub branch_id: Option<BranchId>,
    pub currency: Currency,
    pub amount: Money,
    pub reason: String,
    pub adjusted_by: UserId,
    pub balance_before: Money,
    pub balance_after: Money,
    pub created_at: DateTime<Utc>,
}

#[derive(Builder, Debug, Clone)]
pub struct NewCashAdjustment {
    #[builder(setter(into))]
    pub(super) tenant_id: TenantId,
    #[builder(setter(strip_option, into), default)]
    pub(super) branch_id: Option<BranchId>,
    pub(super) currency: Currency,
    #[builder(setter(into))]
    pub(super) amount: Money,
    #[builder(setter(into))]
    pub(super) reason: String,
    #[builder(setter(into))]
    pub(super) adjusted_by: UserId,
}

impl NewCashAdjustment {
    pub fn builder() -> NewCashAdjustmentBuilder {
        NewCashAdjustmentBuilder::default()
    }

    pub(super) fn into_adjustment(
        self,
        balance: &CashBalance,
        now: DateTime<Utc>,
    ) -> Result<CashAdjustment, MoneyError> {
        Ok(CashAdjustment {
            id: CashAdjustmentId::new(),
            tenant_id: self.tenant_id,
            cash_balance_id: balance.id,
            branch_id: self.branch_id,
            currency: self.currency,
            amount: self.amount,
            reason: self.reason,
            adjusted_by: self.adjusted_by,
            balance_before: balance.final_balance,
            balance_after: balance.final_balance.checked_add(self.amount)?,
            created_at: now,
        })
    }
}
