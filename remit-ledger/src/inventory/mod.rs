//! Weighted average cost tracking of foreign currency stock.
mod entity;
pub mod error;
mod repo;

use sqlx::PgPool;
use tracing::instrument;

use crate::{ledger_operation::*, primitives::*};

pub use entity::*;
use error::*;
use repo::*;

#[derive(Clone)]
pub struct Inventory {
    repo: InventoryRepo,
    pool: PgPool,
}

impl Inventory {
    pub(crate) fn new(pool: &PgPool) -> Self {
        Self {
            repo: InventoryRepo::new(pool),
            pool: pool.clone(),
        }
    }

    #[instrument(name = "remit_ledger.inventory.record_purchase", skip(self), err)]
    pub async fn record_purchase(
        &self,
        movement: NewCurrencyMovement,
    ) -> Result<WacRecord, InventoryError> {
        validate(&movement)?;
        let mut op = LedgerOperation::init(&self.pool).await?;
        let holding = self
            .lock_or_create(&mut op, movement.tenant_id, movement.currency)
            .await?;
        let change = holding.purchase(movement.quantity, movement.rate, op.now())?;
        let record = WacRecord::new(
            WacTransactionType::Buy,
            &holding,
            &change,
            movement.rate,
            movement.reference_id,
            movement.notes,
        );
        self.persist(&mut op, &change, &record).await?;
        op.commit().await?;
        Ok(record)
    }

    #[instrument(name = "remit_ledger.inventory.record_sale", skip(self), err)]
    pub async fn record_sale(
        &self,
        movement: NewCurrencyMovement,
    ) -> Result<WacRecord, InventoryError> {
        validate(&movement)?;
        let mut op = LedgerOperation::init(&self.pool).await?;
        let holding = self
            .repo
            .find_for_update(op.as_executor(), movement.tenant_id, movement.currency)
            .await?
            .ok_or(InventoryError::InsufficientHolding {
                currency: movement.currency,
                requested: movement.quantity,
                available: Money::ZERO,
            })?;
        let change = holding.sale(movement.quantity, movement.rate, op.now())?;
        let record = WacRecord::new(
            WacTransactionType::Sell,
            &holding,
            &change,
            movement.rate,
            movement.reference_id,
            movement.notes,
        );
        self.persist(&mut op, &change, &record).await?;
        op.commit().await?;
        Ok(record)
    }

    /// Corrects the held quantity by a signed `delta` without touching the
    /// average cost.
    #[instrument(name = "remit_ledger.inventory.record_adjustment", skip(self), err)]
    pub async fn record_adjustment(
        &self,
        tenant_id: TenantId,
        currency: Currency,
        delta: Money,
        notes: Option<String>,
    ) -> Result<WacRecord, InventoryError> {
        if delta.is_zero() {
            return Err(InventoryError::ZeroAdjustment);
        }
        let mut op = LedgerOperation::init(&self.pool).await?;
        let holding = self.lock_or_create(&mut op, tenant_id, currency).await?;
        let change = holding.adjust(delta, op.now())?;
        let record = WacRecord::new(
            WacTransactionType::Adjustment,
            &holding,
            &change,
            holding.wac,
            None,
            notes,
        );
        self.persist(&mut op, &change, &record).await?;
        op.commit().await?;
        Ok(record)
    }

    /// Live positions (quantity > 0) in every currency other than `base_currency`.
    #[instrument(name = "remit_ledger.inventory.currency_inventory", skip(self), err)]
    pub async fn currency_inventory(
        &self,
        tenant_id: TenantId,
        base_currency: Currency,
    ) -> Result<Vec<CurrencyPosition>, InventoryError> {
        Ok(self
            .repo
            .live_positions(tenant_id, base_currency)
            .await?
            .iter()
            .map(CurrencyHolding::position)
            .collect())
    }

    #[instrument(name = "remit_ledger.inventory.find_holding", skip(self), err)]
    pub async fn find_holding(
        &self,
        tenant_id: TenantId,
        currency: Currency,
    ) -> Result<CurrencyHolding, InventoryError> {
        self.repo
            .find(tenant_id, currency)
            .await?
            .ok_or(InventoryError::HoldingNotFound(currency))
    }

    #[instrument(name = "remit_ledger.inventory.history", skip(self), err)]
    pub async fn history(
        &self,
        tenant_id: TenantId,
        currency: Currency,
    ) -> Result<Vec<WacRecord>, InventoryError> {
        self.repo.history(tenant_id, currency).await
    }

    async fn lock_or_create(
        &self,
        op: &mut LedgerOperation<'_>,
        tenant_id: TenantId,
        currency: Currency,
    ) -> Result<CurrencyHolding, InventoryError> {
        if let Some(holding) = self
            .repo
            .find_for_update(op.as_executor(), tenant_id, currency)
            .await?
        {
            return Ok(holding);
        }
        let empty = CurrencyHolding::empty(tenant_id, currency, op.now());
        self.repo.insert_if_absent(op.as_executor(), &empty).await?;
        self.repo
            .find_for_update(op.as_executor(), tenant_id, currency)
            .await?
            .ok_or(InventoryError::HoldingNotFound(currency))
    }

    async fn persist(
        &self,
        op: &mut LedgerOperation<'_>,
        change: &HoldingChange,
        record: &WacRecord,
    ) -> Result<(), InventoryError> {
        self.repo.insert_record(op.as_executor(), record).await?;
        self.repo.update(op.as_executor(), &change.next).await?;
        Ok(())
    }
}

fn validate(movement: &NewCurrencyMovement) -> Result<(), InventoryError> {
    if !movement.quantity.is_positive() {
        return Err(InventoryError::InvalidQuantity(movement.quantity));
    }
    if !movement.rate.is_positive() {
        return Err(InventoryError::InvalidRate(movement.rate));
    }
    Ok(())
}
