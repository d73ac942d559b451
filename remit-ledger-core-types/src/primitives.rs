use serde::{Deserialize, Serialize};

pub use crate::{
    currency::{Currency, ParseCurrencyError},
    money::{Money, MoneyError, MONEY_SCALE},
};

crate::entity_id! { TenantId }
crate::entity_id! { BranchId }
crate::entity_id! { ClientId }
crate::entity_id! { UserId }
crate::entity_id! { LedgerEntryId }
crate::entity_id! { CashBalanceId }
crate::entity_id! { CashAdjustmentId }
crate::entity_id! { CashPaymentId }
crate::entity_id! { CurrencyHoldingId }
crate::entity_id! { WacRecordId }
crate::entity_id! { OutgoingRemittanceId }
crate::entity_id! { IncomingRemittanceId }
crate::entity_id! { SettlementId }

/// Remaining amounts at or below this are considered fully settled.
pub const SETTLEMENT_TOLERANCE: Money = Money::new(1, 2);

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "LedgerEntryType", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    Deposit,
    Withdrawal,
    ExchangeIn,
    ExchangeOut,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "PaymentMethod", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Other,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        Self::Cash
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "PaymentStatus", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Cancelled,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        Self::Pending
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "WacTransactionType", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WacTransactionType {
    Buy,
    Sell,
    Adjustment,
}

#[derive(
    Debug,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    sqlx::Type,
    strum::Display,
    strum::EnumString,
)]
#[sqlx(type_name = "OutgoingStatus", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum OutgoingStatus {
    Pending,
    Partial,
    Completed,
    Cancelled,
}

impl OutgoingStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Partial)
    }
}

#[derive(
    Debug,
    Serialize,
    Deserialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    sqlx::Type,
    strum::Display,
    strum::EnumString,
)]
#[sqlx(type_name = "IncomingStatus", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum IncomingStatus {
    Pending,
    Partial,
    Completed,
    Paid,
    Cancelled,
}

impl IncomingStatus {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Partial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_names_round_trip_through_strum() {
        assert_eq!(OutgoingStatus::Partial.to_string(), "PARTIAL");
        assert_eq!(
            "completed".parse::<IncomingStatus>().unwrap(),
            IncomingStatus::Completed
        );
    }

    #[test]
    fn only_pending_and_partial_are_open() {
        assert!(OutgoingStatus::Pending.is_open());
        assert!(OutgoingStatus::Partial.is_open());
        assert!(!OutgoingStatus::Completed.is_open());
        assert!(!IncomingStatus::Paid.is_open());
        assert!(!IncomingStatus::Cancelled.is_open());
    }

    #[test]
    fn ids_parse_from_strings() {
        let id = TenantId::new();
        let parsed: TenantId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
