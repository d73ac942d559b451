use chrono::{DateTime, Utc};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use super::error::InventoryError;
use crate::primitives::*;

/// Weighted average cost position of a tenant in one foreign currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CurrencyHolding {
    pub id: CurrencyHoldingId,
    pub tenant_id: TenantId,
    pub currency: Currency,
    pub quantity: Money,
    pub wac: Money,
    pub total_cost: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Result of applying one movement to a holding.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct HoldingChange {
    pub next: CurrencyHolding,
    pub profit_or_loss: Money,
}

impl CurrencyHolding {
    pub(super) fn empty(tenant_id: TenantId, currency: Currency, now: DateTime<Utc>) -> Self {
        Self {
            id: CurrencyHoldingId::new(),
            tenant_id,
            currency,
            quantity: Money::ZERO,
            wac: Money::ZERO,
            total_cost: Money::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn position(&self) -> CurrencyPosition {
        CurrencyPosition {
            currency: self.currency,
            quantity: self.quantity,
            wac: self.wac,
            total_cost: self.total_cost,
        }
    }

    /// `wac` is kept at full precision. Only `total_cost` is rounded.
    fn with(
        &self,
        quantity: Money,
        wac: Money,
        now: DateTime<Utc>,
    ) -> Result<Self, InventoryError> {
        let wac = if quantity.is_zero() { Money::ZERO } else { wac };
        Ok(Self {
            quantity,
            wac,
            total_cost: quantity.checked_mul(wac)?.round_money(),
            updated_at: now,
            ..self.clone()
        })
    }

    pub(super) fn purchase(
        &self,
        quantity: Money,
        rate: Money,
        now: DateTime<Utc>,
    ) -> Result<HoldingChange, InventoryError> {
        let new_quantity = self.quantity.checked_add(quantity)?;
        let new_wac = self
            .quantity
            .checked_mul(self.wac)?
            .checked_add(quantity.checked_mul(rate)?)?
            .checked_div(new_quantity)?;
        Ok(HoldingChange {
            next: self.with(new_quantity, new_wac, now)?,
            profit_or_loss: Money::ZERO,
        })
    }

    /// Sales never move the average cost. A sale that empties the position
    /// resets it.
    pub(super) fn sale(
        &self,
        quantity: Money,
        rate: Money,
        now: DateTime<Utc>,
    ) -> Result<HoldingChange, InventoryError> {
        self.ensure_available(quantity)?;
        let profit_or_loss = rate.checked_sub(self.wac)?.checked_mul(quantity)?;
        Ok(HoldingChange {
            next: self.with(self.quantity.checked_sub(quantity)?, self.wac, now)?,
            profit_or_loss: profit_or_loss.round_money(),
        })
    }

    pub(super) fn adjust(
        &self,
        delta: Money,
        now: DateTime<Utc>,
    ) -> Result<HoldingChange, InventoryError> {
        if delta.is_negative() {
            self.ensure_available(delta.abs())?;
        }
        Ok(HoldingChange {
            next: self.with(self.quantity.checked_add(delta)?, self.wac, now)?,
            profit_or_loss: Money::ZERO,
        })
    }

    fn ensure_available(&self, quantity: Money) -> Result<(), InventoryError> {
        if quantity > self.quantity {
            return Err(InventoryError::InsufficientHolding {
                currency: self.currency,
                requested: quantity,
                available: self.quantity,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyPosition {
    pub currency: Currency,
    pub quantity: Money,
    pub wac: Money,
    pub total_cost: Money,
}

/// Audit trail row, one per movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct WacRecord {
    pub id: WacRecordId,
    pub tenant_id: TenantId,
    pub currency: Currency,
    pub transaction_type: WacTransactionType,
    pub quantity: Money,
    pub rate: Money,
    pub previous_quantity: Money,
    pub previous_wac: Money,
    pub new_quantity: Money,
    pub new_wac: Money,
    pub profit_or_loss: Money,
    pub reference_id: Option<uuid::Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WacRecord {
    pub(super) fn new(
        transaction_type: WacTransactionType,
        previous: &CurrencyHolding,
        change: &HoldingChange,
        rate: Money,
        reference_id: Option<uuid::Uuid>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: WacRecordId::new(),
            tenant_id: previous.tenant_id,
            currency: previous.currency,
            transaction_type,
            quantity: change.next.quantity - previous.quantity,
            rate,
            previous_quantity: previous.quantity,
            previous_wac: previous.wac,
            new_quantity: change.next.quantity,
            new_wac: change.next.wac,
            profit_or_loss: change.profit_or_loss,
            reference_id,
            notes,
            created_at: change.next.updated_at,
        }
    }
}

/// A purchase or sale of `quantity` units of `currency` at `rate`
/// (base currency per unit).
#[derive(Builder, Debug, Clone)]
pub struct NewCurrencyMovement {
    #[builder(setter(into))]
    pub(super) tenant_id: TenantId,
    pub(super) currency: Currency,
    #[builder(setter(into))]
    pub(super) quantity: Money,
    #[builder(setter(into))]
    pub(super) rate: Money,
    #[builder(setter(strip_option, into), default)]
    pub(super) reference_id: Option<uuid::Uuid>,
    #[builder(setter(strip_option, into), default)]
    pub(super) notes: Option<String>,
}

impl NewCurrencyMovement {
    pub fn builder() -> NewCurrencyMovementBuilder {
        NewCurrencyMovementBuilder::default()
    }
}
