use thiserror::Error;

use crate::{optimistic::RetryableError, primitives::*};

#[derive(Error, Debug)]
pub enum CashBalanceError {
    #[error("CashBalanceError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("CashBalanceError - MoneyError: {0}")]
    MoneyError(#[from] MoneyError),
    #[error("CashBalanceError - NotFound: cash balance {0} does not exist")]
    NotFound(CashBalanceId),
    #[error("CashBalanceError - ConcurrentModification: cash balance {0} was updated concurrently")]
    ConcurrentModification(CashBalanceId),
    #[error("CashBalanceError - ZeroAmount: adjustment amount cannot be zero")]
    ZeroAmount,
    #[error("CashBalanceError - MissingReason: adjustments require a reason")]
    MissingReason,
}

impl RetryableError for CashBalanceError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification(_))
    }
}
