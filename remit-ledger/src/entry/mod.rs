//! Append-only client ledger. A client's balance in a currency is the sum of
//! its entries; entries are never updated or deleted.
mod entity;
pub mod error;
mod repo;

use sqlx::PgPool;
use tracing::instrument;

use std::collections::HashMap;

use crate::{ledger_operation::*, primitives::*};

pub use entity::*;
use error::*;
use repo::*;

#[derive(Clone)]
pub struct Entries {
    repo: LedgerEntryRepo,
    pool: PgPool,
}

impl Entries {
    pub(crate) fn new(pool: &PgPool) -> Self {
        Self {
            repo: LedgerEntryRepo::new(pool),
            pool: pool.clone(),
        }
    }

    #[instrument(name = "remit_ledger.entries.add_entry", skip(self), err)]
    pub async fn add_entry(
        &self,
        new_entry: NewLedgerEntry,
    ) -> Result<LedgerEntry, LedgerEntryError> {
        let mut op = LedgerOperation::init(&self.pool).await?;
        let entry = self.add_entry_in_op(&mut op, new_entry).await?;
        op.commit().await?;
        Ok(entry)
    }

    #[instrument(name = "remit_ledger.entries.add_entry_in_op", skip(self, op), err)]
    pub async fn add_entry_in_op(
        &self,
        op: &mut LedgerOperation<'_>,
        new_entry: NewLedgerEntry,
    ) -> Result<LedgerEntry, LedgerEntryError> {
        if new_entry.amount.is_zero() {
            return Err(LedgerEntryError::ZeroAmount);
        }
        let entry = new_entry.into_entry(op.now());
        self.repo
            .lock_client(op.as_executor(), entry.tenant_id, entry.client_id, false)
            .await?;
        self.repo.insert(op.as_executor(), &entry).await?;
        Ok(entry)
    }

    /// Books both legs of a currency exchange atomically.
    /// Returns `(debit, credit)`.
    #[instrument(name = "remit_ledger.entries.exchange", skip(self), err)]
    pub async fn exchange(
        &self,
        request: ExchangeRequest,
    ) -> Result<(LedgerEntry, LedgerEntry), LedgerEntryError> {
        if !request.amount.is_positive() {
            return Err(LedgerEntryError::InvalidAmount(request.amount));
        }
        if !request.rate.is_positive() {
            return Err(LedgerEntryError::InvalidRate(request.rate));
        }
        if request.from_currency == request.to_currency {
            return Err(LedgerEntryError::SameCurrency(request.from_currency));
        }
        let (debit, credit) = request.legs()?;
        let mut op = LedgerOperation::init(&self.pool).await?;
        let debit = self.add_entry_in_op(&mut op, debit).await?;
        let credit = self.add_entry_in_op(&mut op, credit).await?;
        op.commit().await?;
        Ok((debit, credit))
    }

    #[instrument(name = "remit_ledger.entries.deposit", skip(self), err)]
    pub async fn deposit(
        &self,
        tenant_id: TenantId,
        client_id: ClientId,
        currency: Currency,
        amount: Money,
        created_by: UserId,
    ) -> Result<LedgerEntry, LedgerEntryError> {
        if !amount.is_positive() {
            return Err(LedgerEntryError::InvalidAmount(amount));
        }
        let new_entry = NewLedgerEntry {
            id: None,
            tenant_id,
            client_id,
            branch_id: None,
            entry_type: LedgerEntryType::Deposit,
            currency,
            amount,
            exchange_rate: None,
            related_entry_id: None,
            description: None,
            created_by,
        };
        self.add_entry(new_entry).await
    }

    #[instrument(name = "remit_ledger.entries.withdraw", skip(self), err)]
    pub async fn withdraw(
        &self,
        tenant_id: TenantId,
        client_id: ClientId,
        currency: Currency,
        amount: Money,
        created_by: UserId,
    ) -> Result<LedgerEntry, LedgerEntryError> {
        if !amount.is_positive() {
            return Err(LedgerEntryError::InvalidAmount(amount));
        }
        let mut op = LedgerOperation::init(&self.pool).await?;
        let available = self
            .client_balance_for_currency_in_op(&mut op, tenant_id, client_id, currency)
            .await?;
        if available < amount {
            return Err(LedgerEntryError::InsufficientFunds {
                client_id,
                currency,
                requested: amount,
                available,
            });
        }
        let new_entry = NewLedgerEntry {
            id: None,
            tenant_id,
            client_id,
            branch_id: None,
            entry_type: LedgerEntryType::Withdrawal,
            currency,
            amount: -amount,
            exchange_rate: None,
            related_entry_id: None,
            description: None,
            created_by,
        };
        let entry = self.add_entry_in_op(&mut op, new_entry).await?;
        op.commit().await?;
        Ok(entry)
    }

    #[instrument(name = "remit_ledger.entries.client_balances", skip(self), err)]
    pub async fn client_balances(
        &self,
        tenant_id: TenantId,
        client_id: ClientId,
    ) -> Result<HashMap<Currency, Money>, LedgerEntryError> {
        let mut conn = self.pool.acquire().await?;
        self.repo.balances(&mut conn, tenant_id, client_id).await
    }

    /// Balances read under a shared lock that blocks writers to this client
    /// until `op` ends.
    #[instrument(name = "remit_ledger.entries.client_balances_in_op", skip(self, op), err)]
    pub async fn client_balances_in_op(
        &self,
        op: &mut LedgerOperation<'_>,
        tenant_id: TenantId,
        client_id: ClientId,
    ) -> Result<HashMap<Currency, Money>, LedgerEntryError> {
        self.repo
            .lock_client(op.as_executor(), tenant_id, client_id, true)
            .await?;
        self.repo
            .balances(op.as_executor(), tenant_id, client_id)
            .await
    }

    /// Balance read under the exclusive client lock, held until `op` ends.
    #[instrument(
        name = "remit_ledger.entries.client_balance_for_currency_in_op",
        skip(self, op),
        err
    )]
    pub async fn client_balance_for_currency_in_op(
        &self,
        op: &mut LedgerOperation<'_>,
        tenant_id: TenantId,
        client_id: ClientId,
        currency: Currency,
    ) -> Result<Money, LedgerEntryError> {
        self.repo
            .lock_client(op.as_executor(), tenant_id, client_id, false)
            .await?;
        self.repo
            .balance_for_currency(op.as_executor(), tenant_id, client_id, currency)
            .await
    }

    #[instrument(name = "remit_ledger.entries.list_for_client", skip(self), err)]
    pub async fn list_for_client(
        &self,
        tenant_id: TenantId,
        client_id: ClientId,
    ) -> Result<Vec<LedgerEntry>, LedgerEntryError> {
        self.repo.list_for_client(tenant_id, client_id).await
    }
}
