use thiserror::Error;

use crate::primitives::*;

#[derive(Error, Debug)]
pub enum RemittanceError {
    #[error("RemittanceError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("RemittanceError - MoneyError: {0}")]
    MoneyError(#[from] MoneyError),
    #[error("RemittanceError - InvalidAmount: amount must be positive, got {0}")]
    InvalidAmount(Money),
    #[error("RemittanceError - InvalidRate: rate must be positive, got {0}")]
    InvalidRate(Money),
    #[error("RemittanceError - OutgoingNotFound: outgoing remittance {0} does not exist")]
    OutgoingNotFound(OutgoingRemittanceId),
    #[error("RemittanceError - IncomingNotFound: incoming remittance {0} does not exist")]
    IncomingNotFound(IncomingRemittanceId),
    #[error("RemittanceError - ExceedsRemaining: {requested} exceeds remaining {remaining} of {code}")]
    ExceedsRemaining {
        code: String,
        requested: Money,
        remaining: Money,
    },
    #[error("RemittanceError - NotSettleable: {code} is {status}")]
    NotSettleable { code: String, status: String },
    #[error("RemittanceError - CannotCancel: {code} already has {settled} settled")]
    CannotCancel { code: String, settled: Money },
    #[error("RemittanceError - NotFullyAllocated: {code} still has {remaining} unallocated")]
    NotFullyAllocated { code: String, remaining: Money },
    #[error("RemittanceError - InvalidTransition: {code} cannot move from {from} to {to}")]
    InvalidTransition {
        code: String,
        from: String,
        to: String,
    },
}
