pub mod config;
pub mod error;

use sqlx::PgPool;
use tracing::instrument;

pub use config::*;
use error::*;

use crate::{
    auto_settlement::AutoSettlements, cash_balance::CashBalances, entry::Entries,
    inventory::Inventory, ledger_operation::LedgerOperation, migrate, payment::CashPayments,
    remittance::Remittances, settlement::Settlements,
};

#[derive(Clone)]
pub struct RemitLedger {
    pool: PgPool,
    entries: Entries,
    cash_balances: CashBalances,
    cash_payments: CashPayments,
    inventory: Inventory,
    remittances: Remittances,
    settlements: Settlements,
    auto_settlements: AutoSettlements,
}

impl RemitLedger {
    #[instrument(name = "remit_ledger.init", skip(config), err)]
    pub async fn init(config: RemitLedgerConfig) -> Result<Self, LedgerError> {
        let retry_policy = config.retry_policy();
        let pool = match (config.pool, config.pg_con) {
            (Some(pool), None) => pool,
            (None, Some(pg_con)) => {
                let mut pool_opts = sqlx::postgres::PgPoolOptions::new();
                if let Some(max_connections) = config.max_connections {
                    pool_opts = pool_opts.max_connections(max_connections);
                }
                pool_opts.connect(&pg_con).await?
            }
            _ => {
                return Err(LedgerError::ConfigError(
                    "One of pg_con or pool must be set".to_string(),
                ))
            }
        };
        if config.exec_migrations {
            migrate::run(&pool).await?;
        }

        let entries = Entries::new(&pool);
        let cash_balances = CashBalances::new(&pool, retry_policy);
        let cash_payments = CashPayments::new(&pool, &cash_balances);
        let inventory = Inventory::new(&pool);
        let remittances = Remittances::new(&pool);
        let settlements = Settlements::new(&pool, &remittances);
        let auto_settlements = AutoSettlements::new(&pool, &remittances, &settlements);
        Ok(Self {
            entries,
            cash_balances,
            cash_payments,
            inventory,
            remittances,
            settlements,
            auto_settlements,
            pool,
        })
    }

    pub fn entries(&self) -> &Entries {
        &self.entries
    }

    pub fn cash_balances(&self) -> &CashBalances {
        &self.cash_balances
    }

    pub fn cash_payments(&self) -> &CashPayments {
        &self.cash_payments
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn remittances(&self) -> &Remittances {
        &self.remittances
    }

    pub fn settlements(&self) -> &Settlements {
        &self.settlements
    }

    pub fn auto_settlements(&self) -> &AutoSettlements {
        &self.auto_settlements
    }

    /// Opens a transaction that `*_in_op` methods of several services can
    /// share. Nothing is persisted until [`LedgerOperation::commit`].
    pub async fn begin_operation(&self) -> Result<LedgerOperation<'static>, LedgerError> {
        Ok(LedgerOperation::init(&self.pool).await?)
    }
}
