use thiserror::Error;

use crate::{
    auto_settlement::error::AutoSettlementError, cash_balance::error::CashBalanceError,
    entry::error::LedgerEntryError, inventory::error::InventoryError,
    payment::error::PaymentError, remittance::error::RemittanceError,
    settlement::error::SettlementError,
};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("LedgerError - Sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("LedgerError - Migrate: {0}")]
    SqlxMigrate(#[from] sqlx::migrate::MigrateError),
    #[error("LedgerError - Config: {0}")]
    ConfigError(String),
    #[error("LedgerError - LedgerEntryError: {0}")]
    LedgerEntryError(#[from] LedgerEntryError),
    #[error("LedgerError - CashBalanceError: {0}")]
    CashBalanceError(#[from] CashBalanceError),
    #[error("LedgerError - PaymentError: {0}")]
    PaymentError(#[from] PaymentError),
    #[error("LedgerError - InventoryError: {0}")]
    InventoryError(#[from] InventoryError),
    #[error("LedgerError - RemittanceError: {0}")]
    RemittanceError(#[from] RemittanceError),
    #[error("LedgerError - SettlementError: {0}")]
    SettlementError(#[from] SettlementError),
    #[error("LedgerError - AutoSettlementError: {0}")]
    AutoSettlementError(#[from] AutoSettlementError),
}
