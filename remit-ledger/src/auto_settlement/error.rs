use thiserror::Error;

use crate::{primitives::*, remittance::error::RemittanceError};

#[derive(Error, Debug)]
pub enum AutoSettlementError {
    #[error("AutoSettlementError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("AutoSettlementError - RemittanceError: {0}")]
    RemittanceError(#[from] RemittanceError),
    #[error("AutoSettlementError - MoneyError: {0}")]
    MoneyError(#[from] MoneyError),
    #[error("AutoSettlementError - IncomingNotOpen: {code} is {status}")]
    IncomingNotOpen { code: String, status: IncomingStatus },
}
