use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::primitives::*;

/// Immutable movement of client money in one currency.
/// Positive amounts credit the client, negative amounts debit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub tenant_id: TenantId,
    pub client_id: ClientId,
    pub branch_id: Option<BranchId>,
    pub entry_type: LedgerEntryType,
    pub currency: Currency,
    pub amount: Money,
    pub exchange_rate: Option<Money>,
    pub related_entry_id: Option<LedgerEntryId>,
    pub description: Option<String>,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn is_credit(&self) -> bool {
        self.amount.is_positive()
    }
}

#[derive(Builder, Debug, Clone)]
pub struct NewLedgerEntry {
    #[builder(setter(strip_option, into), default)]
    pub(super) id: Option<LedgerEntryId>,
    #[builder(setter(into))]
    pub(super) tenant_id: TenantId,
    #[builder(setter(into))]
    pub(super) client_id: ClientId,
    #[builder(setter(strip_option, into), default)]
    pub(super) branch_id: Option<BranchId>,
    pub(super) entry_type: LedgerEntryType,
    pub(super) currency: Currency,
    #[builder(setter(into))]
    pub(super) amount: Money,
    #[builder(setter(strip_option, into), default)]
    pub(super) exchange_rate: Option<Money>,
    #[builder(setter(strip_option, into), default)]
    pub(super) related_entry_id: Option<LedgerEntryId>,
    #[builder(setter(strip_option, into), default)]
    pub(super) description: Option<String>,
    #[builder(setter(into))]
    pub(super) created_by: UserId,
}

impl NewLedgerEntry {
    pub fn builder() -> NewLedgerEntryBuilder {
        NewLedgerEntryBuilder::default()
    }

    pub(super) fn into_entry(self, created_at: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            id: self.id.unwrap_or_else(LedgerEntryId::new),
            tenant_id: self.tenant_id,
            client_id: self.client_id,
            branch_id: self.branch_id,
            entry_type: self.entry_type,
            currency: self.currency,
            amount: self.amount,
            exchange_rate: self.exchange_rate,
            related_entry_id: self.related_entry_id,
            description: self.description,
            created_by: self.created_by,
            created_at,
        }
    }
}

/// Conversion of `amount` units of `from_currency` into `to_currency` at `rate`
/// (units of `to_currency` per unit of `from_currency`).
#[derive(Builder, Debug, Clone)]
pub struct ExchangeRequest {
    #[builder(setter(into))]
    pub(super) tenant_id: TenantId,
    #[builder(setter(into))]
    pub(super) client_id: ClientId,
    #[builder(setter(strip_option, into), default)]
    pub(super) branch_id: Option<BranchId>,
    #[builder(setter(into))]
    pub(super) user_id: UserId,
    pub(super) from_currency: Currency,
    pub(super) to_currency: Currency,
    #[builder(setter(into))]
    pub(super) amount: Money,
    #[builder(setter(into))]
    pub(super) rate: Money,
    #[builder(setter(strip_option, into), default)]
    pub(super) description: Option<String>,
}

impl ExchangeRequest {
    pub fn builder() -> ExchangeRequestBuilder {
        ExchangeRequestBuilder::default()
    }

    /// Debit and credit legs, each pointing at the other.
    pub(super) fn legs(&self) -> Result<(NewLedgerEntry, NewLedgerEntry), MoneyError> {
        let credited = self.amount.checked_mul(self.rate)?.round_money();
        let debit_id = LedgerEntryId::new();
        let credit_id = LedgerEntryId::new();
        let debit = NewLedgerEntry {
            id: Some(debit_id),
            tenant_id: self.tenant_id,
            client_id: self.client_id,
            branch_id: self.branch_id,
            entry_type: LedgerEntryType::ExchangeOut,
            currency: self.from_currency,
            amount: -self.amount,
            exchange_rate: Some(self.rate),
            related_entry_id: Some(credit_id),
            description: self.description.clone(),
            created_by: self.user_id,
        };
        let credit = NewLedgerEntry {
            id: Some(credit_id),
            tenant_id: self.tenant_id,
            client_id: self.client_id,
            branch_id: self.branch_id,
            entry_type: LedgerEntryType::ExchangeIn,
            currency: self.to_currency,
            amount: credited,
            exchange_rate: Some(self.rate),
            related_entry_id: Some(debit_id),
            description: self.description.clone(),
            created_by: self.user_id,
        };
        Ok((debit, credit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_legs_reference_each_other() {
        let request = ExchangeRequest::builder()
            .tenant_id(TenantId::new())
            .client_id(ClientId::new())
            .user_id(UserId::new())
            .from_currency("CAD".parse().unwrap())
            .to_currency("USD".parse().unwrap())
            .amount(Money::from(100))
            .rate(Money::new(73, 2))
            .build()
            .unwrap();
        let (debit, credit) = request.legs().unwrap();
        assert_eq!(debit.amount, Money::from(-100));
        assert_eq!(credit.amount, Money::from(73));
        assert_eq!(debit.related_entry_id, credit.id);
        assert_eq!(credit.related_entry_id, debit.id);
        assert_eq!(debit.entry_type, LedgerEntryType::ExchangeOut);
        assert_eq!(credit.entry_type, LedgerEntryType::ExchangeIn);
    }

    #[test]
    fn overflowing_exchange_is_an_error() {
        let request = ExchangeRequest::builder()
            .tenant_id(TenantId::new())
            .client_id(ClientId::new())
            .user_id(UserId::new())
            .from_currency("IRR".parse().unwrap())
            .to_currency("USD".parse().unwrap())
            .amount("100000000000000000000".parse::<Money>().unwrap())
            .rate("10000000000".parse::<Money>().unwrap())
            .build()
            .unwrap();
        assert!(matches!(request.legs(), Err(MoneyError::Overflow(..))));
    }

    #[test]
    fn fails_when_mandatory_fields_are_missing() {
        let new_entry = NewLedgerEntry::builder().build();
        assert!(new_entry.is_err());
    }
}
