use thiserror::Error;

use crate::primitives::*;

#[derive(Error, Debug)]
pub enum LedgerEntryError {
    #[error("LedgerEntryError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("LedgerEntryError - MoneyError: {0}")]
    MoneyError(#[from] MoneyError),
    #[error("LedgerEntryError - ZeroAmount: amount cannot be zero")]
    ZeroAmount,
    #[error("LedgerEntryError - InvalidAmount: amount must be positive, got {0}")]
    InvalidAmount(Money),
    #[error("LedgerEntryError - InvalidRate: exchange rate must be positive, got {0}")]
    InvalidRate(Money),
    #[error("LedgerEntryError - SameCurrency: cannot exchange {0} into itself")]
    SameCurrency(Currency),
    #[error("LedgerEntryError - InsufficientFunds: client {client_id} has {available} {currency}, requested {requested}")]
    InsufficientFunds {
        client_id: ClientId,
        currency: Currency,
        requested: Money,
        available: Money,
    },
}
