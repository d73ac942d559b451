pub mod config;
mod db;

use clap::{Parser, Subcommand};
use remit_ledger::{auto_settlement::SettlementStrategy, RemitLedger, RemitLedgerConfig};
use remit_types::primitives::{Currency, IncomingRemittanceId, TenantId, UserId};
use serde::Serialize;

use std::path::PathBuf;

use self::config::{Config, EnvOverride};

#[derive(Parser)]
#[clap(version, long_about = None)]
struct Cli {
    #[clap(short, long, env = "REMIT_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,
    #[clap(long, env = "PG_CON")]
    pg_con: Option<String>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Applies pending database migrations.
    Migrate,
    /// Recomputes every cash balance of a tenant from its payment history.
    RefreshCashBalances {
        #[clap(long)]
        tenant: TenantId,
    },
    /// Prints live foreign currency positions.
    Inventory {
        #[clap(long)]
        tenant: TenantId,
        #[clap(long, default_value = "CAD")]
        base_currency: Currency,
    },
    /// Prints settlement suggestions for an incoming remittance.
    Suggest {
        #[clap(long)]
        tenant: TenantId,
        #[clap(long)]
        incoming: IncomingRemittanceId,
        #[clap(long, default_value = "fifo")]
        strategy: SettlementStrategy,
    },
    /// Executes settlement suggestions for an incoming remittance.
    AutoSettle {
        #[clap(long)]
        tenant: TenantId,
        #[clap(long)]
        incoming: IncomingRemittanceId,
        #[clap(long, default_value = "fifo")]
        strategy: SettlementStrategy,
        #[clap(long)]
        user: UserId,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load_config(cli.config, EnvOverride { db_con: cli.pg_con })?;

    run_cmd(config, cli.command).await
}

async fn run_cmd(config: Config, command: Command) -> anyhow::Result<()> {
    remit_tracing::init_tracer(config.tracing.clone())?;
    let pool = db::init_pool(&config.db).await?;

    if let Command::Migrate = command {
        remit_ledger::migrate::run(&pool).await?;
        remit_tracing::info!("migrations applied");
        return Ok(());
    }

    let ledger = init_ledger(&config, pool).await?;
    run_ledger_cmd(&ledger, command).await
}

async fn run_ledger_cmd(ledger: &RemitLedger, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Migrate => Ok(()),
        Command::RefreshCashBalances { tenant } => {
            print_json(&ledger.cash_balances().refresh_all(tenant).await?)
        }
        Command::Inventory {
            tenant,
            base_currency,
        } => print_json(
            &ledger
                .inventory()
                .currency_inventory(tenant, base_currency)
                .await?,
        ),
        Command::Suggest {
            tenant,
            incoming,
            strategy,
        } => print_json(
            &ledger
                .auto_settlements()
                .suggest(tenant, incoming, strategy)
                .await?,
        ),
        Command::AutoSettle {
            tenant,
            incoming,
            strategy,
            user,
        } => print_json(
            &ledger
                .auto_settlements()
                .auto_settle(tenant, incoming, strategy, user)
                .await?,
        ),
    }
}

async fn init_ledger(config: &Config, pool: sqlx::PgPool) -> anyhow::Result<RemitLedger> {
    let mut builder = RemitLedgerConfig::builder();
    builder
        .pool(pool)
        .exec_migrations(config.ledger.exec_migrations);
    if let Some(attempts) = config.ledger.max_cas_attempts {
        builder.max_cas_attempts(attempts);
    }
    Ok(RemitLedger::init(builder.build()?).await?)
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
