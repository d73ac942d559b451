use thiserror::Error;

use crate::{cash_balance::error::CashBalanceError, optimistic::RetryableError, primitives::*};

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("PaymentError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("PaymentError - CashBalanceError: {0}")]
    CashBalanceError(#[from] CashBalanceError),
    #[error("PaymentError - NotFound: payment {0} does not exist")]
    NotFound(CashPaymentId),
    #[error("PaymentError - NotPending: payment {id} is {status:?}")]
    NotPending {
        id: CashPaymentId,
        status: PaymentStatus,
    },
    #[error("PaymentError - ZeroAmount: payment amount cannot be zero")]
    ZeroAmount,
}

impl RetryableError for PaymentError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::CashBalanceError(e) if e.is_retryable())
    }
}
