use thiserror::Error;

use crate::{primitives::*, remittance::error::RemittanceError};

#[derive(Error, Debug)]
pub enum SettlementError {
    #[error("SettlementError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("SettlementError - MoneyError: {0}")]
    MoneyError(#[from] MoneyError),
    #[error("SettlementError - RemittanceError: {0}")]
    RemittanceError(#[from] RemittanceError),
    #[error("SettlementError - InvalidAmount: settled amount must be positive, got {0}")]
    InvalidAmount(Money),
}
