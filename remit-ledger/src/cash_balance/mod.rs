//! Per tenant, branch and currency cash positions.
//!
//! Rows are guarded by a `version` column instead of long-lived row locks.
//! Every write reads the row, locks it only if the version is unchanged and
//! bumps the version with a conditional update. A concurrent writer makes the
//! operation fail with [`CashBalanceError::ConcurrentModification`]; callers
//! retry the whole operation (see the `*_with_retry` variants).
mod entity;
pub mod error;
mod repo;

use sqlx::PgPool;
use tracing::instrument;

use crate::{ledger_operation::*, optimistic::*, primitives::*};

pub use entity::*;
use error::*;
use repo::*;

#[derive(Clone)]
pub struct CashBalances {
    repo: CashBalanceRepo,
    retry_policy: RetryPolicy,
    pool: PgPool,
}

impl CashBalances {
    pub(crate) fn new(pool: &PgPool, retry_policy: RetryPolicy) -> Self {
        Self {
            repo: CashBalanceRepo::new(pool),
            retry_policy,
            pool: pool.clone(),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    #[instrument(name = "remit_ledger.cash_balances.get_or_create", skip(self), err)]
    pub async fn get_or_create(
        &self,
        tenant_id: TenantId,
        branch_id: Option<BranchId>,
        currency: Currency,
    ) -> Result<CashBalance, CashBalanceError> {
        let mut op = LedgerOperation::init(&self.pool).await?;
        let balance = self
            .get_or_create_in_op(&mut op, tenant_id, branch_id, currency)
            .await?;
        op.commit().await?;
        Ok(balance)
    }

    /// Loads the balance for the scope, creating it seeded from completed cash
    /// payments if it does not exist yet.
    pub async fn get_or_create_in_op(
        &self,
        op: &mut LedgerOperation<'_>,
        tenant_id: TenantId,
        branch_id: Option<BranchId>,
        currency: Currency,
    ) -> Result<CashBalance, CashBalanceError> {
        if let Some(balance) = self
            .repo
            .find_by_scope(op.as_executor(), tenant_id, branch_id, currency)
            .await?
        {
            return Ok(balance);
        }
        let seed = self
            .repo
            .completed_cash_total(op.as_executor(), tenant_id, branch_id, currency)
            .await?;
        let balance = CashBalance::seed(tenant_id, branch_id, currency, seed, op.now());
        self.repo
            .insert_if_absent(op.as_executor(), &balance)
            .await?;
        // Another operation may have won the insert race.
        match self
            .repo
            .find_by_scope(op.as_executor(), tenant_id, branch_id, currency)
            .await?
        {
            Some(balance) => Ok(balance),
            None => Err(CashBalanceError::NotFound(balance.id)),
        }
    }

    #[instrument(name = "remit_ledger.cash_balances.create_manual_adjustment", skip(self), err)]
    pub async fn create_manual_adjustment(
        &self,
        new_adjustment: NewCashAdjustment,
    ) -> Result<CashAdjustment, CashBalanceError> {
        if new_adjustment.amount.is_zero() {
            return Err(CashBalanceError::ZeroAmount);
        }
        if new_adjustment.reason.trim().is_empty() {
            return Err(CashBalanceError::MissingReason);
        }
        let mut op = LedgerOperation::init(&self.pool).await?;
        let balance = self
            .get_or_create_in_op(
                &mut op,
                new_adjustment.tenant_id,
                new_adjustment.branch_id,
                new_adjustment.currency,
            )
            .await?;
        let amount = new_adjustment.amount;
        let adjustment = new_adjustment.into_adjustment(&balance, op.now())?;
        self.repo
            .insert_adjustment(op.as_executor(), &adjustment)
            .await?;
        let next = balance.with_manual_adjustment(amount, op.now())?;
        self.repo
            .compare_and_swap(op.as_executor(), &balance, &next)
            .await?;
        op.commit().await?;
        Ok(adjustment)
    }

    /// [`Self::create_manual_adjustment`] re-run on version conflicts according
    /// to the configured [`RetryPolicy`].
    pub async fn create_manual_adjustment_with_retry(
        &self,
        new_adjustment: NewCashAdjustment,
    ) -> Result<CashAdjustment, CashBalanceError> {
        retry_on_conflict(self.retry_policy, || {
            self.create_manual_adjustment(new_adjustment.clone())
        })
        .await
    }

    /// Recomputes the automatic part from payment history and keeps the manual
    /// part as is.
    #[instrument(name = "remit_ledger.cash_balances.refresh", skip(self), err)]
    pub async fn refresh(
        &self,
        tenant_id: TenantId,
        id: CashBalanceId,
    ) -> Result<CashBalance, CashBalanceError> {
        retry_on_conflict(self.retry_policy, || self.refresh_once(tenant_id, id)).await
    }

    async fn refresh_once(
        &self,
        tenant_id: TenantId,
        id: CashBalanceId,
    ) -> Result<CashBalance, CashBalanceError> {
        let mut op = LedgerOperation::init(&self.pool).await?;
        let balance = self.repo.find_in(op.as_executor(), tenant_id, id).await?;
        let auto = self
            .repo
            .completed_cash_total(
                op.as_executor(),
                tenant_id,
                balance.branch_id,
                balance.currency,
            )
            .await?;
        let next = balance.recalculated(auto, op.now())?;
        self.repo
            .compare_and_swap(op.as_executor(), &balance, &next)
            .await?;
        op.commit().await?;
        Ok(next)
    }

    #[instrument(name = "remit_ledger.cash_balances.refresh_all", skip(self), err)]
    pub async fn refresh_all(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<CashBalance>, CashBalanceError> {
        let mut refreshed = Vec::new();
        for balance in self.repo.list(tenant_id).await? {
            refreshed.push(self.refresh(tenant_id, balance.id).await?);
        }
        Ok(refreshed)
    }

    /// Moves the automatic part of `balance` by `delta`. `balance` must have
    /// been read inside `op` before the payment itself was marked completed.
    pub async fn apply_payment_in_op(
        &self,
        op: &mut LedgerOperation<'_>,
        balance: &CashBalance,
        delta: Money,
    ) -> Result<CashBalance, CashBalanceError> {
        let next = balance.with_payment(delta, op.now())?;
        self.repo
            .compare_and_swap(op.as_executor(), balance, &next)
            .await?;
        Ok(next)
    }

    #[instrument(name = "remit_ledger.cash_balances.find", skip(self), err)]
    pub async fn find(
        &self,
        tenant_id: TenantId,
        id: CashBalanceId,
    ) -> Result<CashBalance, CashBalanceError> {
        self.repo.find(tenant_id, id).await
    }

    #[instrument(name = "remit_ledger.cash_balances.list", skip(self), err)]
    pub async fn list(&self, tenant_id: TenantId) -> Result<Vec<CashBalance>, CashBalanceError> {
        self.repo.list(tenant_id).await
    }

    #[instrument(name = "remit_ledger.cash_balances.list_adjustments", skip(self), err)]
    pub async fn list_adjustments(
        &self,
        tenant_id: TenantId,
        id: CashBalanceId,
    ) -> Result<Vec<CashAdjustment>, CashBalanceError> {
        self.repo.list_adjustments(tenant_id, id).await
    }
}
