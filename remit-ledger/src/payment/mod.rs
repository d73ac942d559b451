//! Till payments. Completed cash payments are the source of truth for the
//! automatic part of every [`CashBalance`](crate::cash_balance::CashBalance).
mod entity;
pub mod error;
mod repo;

use sqlx::PgPool;
use tracing::instrument;

use crate::{cash_balance::CashBalances, ledger_operation::*, optimistic::*, primitives::*};

pub use entity::*;
use error::*;
use repo::*;

#[derive(Clone)]
pub struct CashPayments {
    repo: CashPaymentRepo,
    balances: CashBalances,
    pool: PgPool,
}

impl CashPayments {
    pub(crate) fn new(pool: &PgPool, balances: &CashBalances) -> Self {
        Self {
            repo: CashPaymentRepo::new(pool),
            balances: balances.clone(),
            pool: pool.clone(),
        }
    }

    #[instrument(name = "remit_ledger.cash_payments.record", skip(self), err)]
    pub async fn record(&self, new_payment: NewCashPayment) -> Result<CashPayment, PaymentError> {
        if new_payment.amount.is_zero() {
            return Err(PaymentError::ZeroAmount);
        }
        retry_on_conflict(self.balances.retry_policy(), || {
            self.record_once(new_payment.clone())
        })
        .await
    }

    async fn record_once(
        &self,
        new_payment: NewCashPayment,
    ) -> Result<CashPayment, PaymentError> {
        let mut op = LedgerOperation::init(&self.pool).await?;
        let payment = new_payment.into_payment(op.now());
        if payment.status == PaymentStatus::Completed && payment.affects_cash_balance() {
            // The balance must be loaded before the payment row exists so a
            // freshly seeded balance does not count it twice.
            let balance = self
                .balances
                .get_or_create_in_op(
                    &mut op,
                    payment.tenant_id,
                    payment.branch_id,
                    payment.currency,
                )
                .await?;
            self.repo.insert(op.as_executor(), &payment).await?;
            self.balances
                .apply_payment_in_op(&mut op, &balance, payment.amount)
                .await?;
        } else {
            self.repo.insert(op.as_executor(), &payment).await?;
        }
        op.commit().await?;
        Ok(payment)
    }

    #[instrument(name = "remit_ledger.cash_payments.complete", skip(self), err)]
    pub async fn complete(
        &self,
        tenant_id: TenantId,
        id: CashPaymentId,
    ) -> Result<CashPayment, PaymentError> {
        retry_on_conflict(self.balances.retry_policy(), || {
            self.complete_once(tenant_id, id)
        })
        .await
    }

    async fn complete_once(
        &self,
        tenant_id: TenantId,
        id: CashPaymentId,
    ) -> Result<CashPayment, PaymentError> {
        let mut op = LedgerOperation::init(&self.pool).await?;
        let mut payment = self
            .repo
            .find_for_update(op.as_executor(), tenant_id, id)
            .await?;
        if payment.status != PaymentStatus::Pending {
            return Err(PaymentError::NotPending {
                id,
                status: payment.status,
            });
        }
        let balance = if payment.affects_cash_balance() {
            Some(
                self.balances
                    .get_or_create_in_op(
                        &mut op,
                        payment.tenant_id,
                        payment.branch_id,
                        payment.currency,
                    )
                    .await?,
            )
        } else {
            None
        };
        let now = op.now();
        self.repo.mark_completed(op.as_executor(), id, now).await?;
        if let Some(balance) = balance {
            self.balances
                .apply_payment_in_op(&mut op, &balance, payment.amount)
                .await?;
        }
        payment.status = PaymentStatus::Completed;
        payment.completed_at = Some(now);
        op.commit().await?;
        Ok(payment)
    }

    #[instrument(name = "remit_ledger.cash_payments.cancel", skip(self), err)]
    pub async fn cancel(
        &self,
        tenant_id: TenantId,
        id: CashPaymentId,
    ) -> Result<CashPayment, PaymentError> {
        let mut op = LedgerOperation::init(&self.pool).await?;
        let mut payment = self
            .repo
            .find_for_update(op.as_executor(), tenant_id, id)
            .await?;
        if payment.status != PaymentStatus::Pending {
            return Err(PaymentError::NotPending {
                id,
                status: payment.status,
            });
        }
        let now = op.now();
        self.repo.mark_cancelled(op.as_executor(), id, now).await?;
        payment.status = PaymentStatus::Cancelled;
        payment.cancelled_at = Some(now);
        op.commit().await?;
        Ok(payment)
    }

    #[instrument(name = "remit_ledger.cash_payments.find", skip(self), err)]
    pub async fn find(
        &self,
        tenant_id: TenantId,
        id: CashPaymentId,
    ) -> Result<CashPayment, PaymentError> {
        self.repo.find(tenant_id, id).await
    }

    #[instrument(name = "remit_ledger.cash_payments.list", skip(self), err)]
    pub async fn list(&self, tenant_id: TenantId) -> Result<Vec<CashPayment>, PaymentError> {
        self.repo.list(tenant_id).await
    }
}
