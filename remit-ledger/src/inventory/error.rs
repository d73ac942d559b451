use thiserror::Error;

use crate::primitives::*;

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("InventoryError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("InventoryError - MoneyError: {0}")]
    MoneyError(#[from] MoneyError),
    #[error("InventoryError - InvalidQuantity: quantity must be positive, got {0}")]
    InvalidQuantity(Money),
    #[error("InventoryError - InvalidRate: rate must be positive, got {0}")]
    InvalidRate(Money),
    #[error("InventoryError - ZeroAdjustment: adjustment quantity cannot be zero")]
    ZeroAdjustment,
    #[error("InventoryError - InsufficientHolding: {available} {currency} held, {requested} requested")]
    InsufficientHolding {
        currency: Currency,
        requested: Money,
        available: Money,
    },
    #[error("InventoryError - HoldingNotFound: no {0} holding")]
    HoldingNotFound(Currency),
}
