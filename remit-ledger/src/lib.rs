#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![cfg_attr(feature = "fail-on-warnings", deny(clippy::all))]

pub mod auto_settlement;
pub mod cash_balance;
pub mod entry;
pub mod inventory;
mod ledger;
pub mod migrate;
mod ledger_operation;
pub mod optimistic;
pub mod payment;
pub mod remittance;
pub mod settlement;

pub use ledger::*;
pub use ledger_operation::*;

pub mod primitives {
    pub use remit_types::primitives::*;
}

pub use primitives::*;
