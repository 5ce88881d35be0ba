//! Command Line Interface for the recurring trade execution service.
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use dca_api::{ApiServer, AppState, ServerConfig};
use dca_data::memory::{MemoryExecutionLedger, MemoryStrategyStore};
use dca_data::repositories::Database;
use dca_data::store::{ExecutionLedger, StrategyStore};
use dca_domain::entities::{StrategyConfig, StrategyId};
use dca_domain::enums::Cadence;
use dca_domain::value_objects::gas_price;
use dca_domain::value_objects::{Slippage, TokenPair};
use dca_engine::prelude::*;
use dca_gateway::{
    DryRunPolicyRegistrar, DryRunSigningGateway, HttpPolicyRegistrar, HttpSigningGateway,
    PolicyRegistrar, SigningGateway,
};
use dotenv::dotenv;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "dca")]
#[command(about = "Recurring trade automation with a local execution guard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the sweep scheduler and REST API
    Serve {
        /// Bind address for the REST API
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: String,

        /// Sweep tick interval in seconds
        #[arg(long, default_value_t = 60)]
        tick_secs: u64,

        /// In-memory storage and logging gateways, no external services
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Create a strategy and register its policy rule
    Create {
        /// Strategy name
        #[arg(long)]
        name: String,

        /// Target network
        #[arg(long, default_value = "ethereum")]
        network: String,

        /// Custodial wallet address
        #[arg(long)]
        wallet: String,

        /// Source token symbol (e.g. USDC)
        #[arg(long)]
        source: String,

        /// Destination token symbol (e.g. ETH)
        #[arg(long)]
        destination: String,

        /// Per-execution amount in source-token units
        #[arg(long)]
        amount: Decimal,

        /// Cadence: hourly, daily or weekly
        #[arg(long, default_value = "daily")]
        cadence: String,

        /// Gas price ceiling in gwei
        #[arg(long)]
        max_gas_gwei: u64,

        /// Slippage tolerance in basis points
        #[arg(long, default_value_t = 100)]
        slippage_bps: u16,

        /// Lifetime budget in source-token units
        #[arg(long)]
        budget: Decimal,
    },
    /// Compare strategy counters against the ledger
    Reconcile {
        /// Strategy id; checks every strategy when omitted
        #[arg(long)]
        strategy: Option<Uuid>,
    },
}

struct Components {
    store: Arc<dyn StrategyStore>,
    ledger: Arc<dyn ExecutionLedger>,
    signer: Arc<dyn SigningGateway>,
    registrar: Arc<dyn PolicyRegistrar>,
}

fn env_secs(key: &str, default: u64) -> Duration {
    let secs = env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default);
    Duration::from_secs(secs)
}

async fn components(dry_run: bool) -> Result<Components> {
    if dry_run {
        return Ok(Components {
            store: Arc::new(MemoryStrategyStore::new()),
            ledger: Arc::new(MemoryExecutionLedger::new()),
            signer: Arc::new(DryRunSigningGateway),
            registrar: Arc::new(DryRunPolicyRegistrar),
        });
    }

    let database_url =
        env::var("DATABASE_URL").context("DATABASE_URL must be set in .env or environment")?;
    let db = Database::connect(&database_url).await?;
    db.migrate().await?;

    let signer_url =
        env::var("SIGNER_URL").context("SIGNER_URL must be set in .env or environment")?;
    let registrar_url =
        env::var("REGISTRAR_URL").context("REGISTRAR_URL must be set in .env or environment")?;

    Ok(Components {
        store: Arc::new(db.strategies()),
        ledger: Arc::new(db.ledger()),
        signer: Arc::new(HttpSigningGateway::new(
            signer_url,
            env_secs("SIGNING_TIMEOUT_SECS", 30),
        )),
        registrar: Arc::new(HttpPolicyRegistrar::new(
            registrar_url,
            env_secs("REGISTRAR_TIMEOUT_SECS", 10),
        )),
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            tick_secs,
            dry_run,
        } => serve(bind, tick_secs, dry_run).await,
        Commands::Create {
            name,
            network,
            wallet,
            source,
            destination,
            amount,
            cadence,
            max_gas_gwei,
            slippage_bps,
            budget,
        } => {
            let config = StrategyConfig {
                name,
                network,
                wallet_address: wallet,
                pair: TokenPair::new(source, destination)?,
                amount,
                cadence: cadence.parse::<Cadence>()?,
                max_gas_price: gas_price::gwei_to_base(max_gas_gwei),
                slippage: Slippage::from_bps(slippage_bps)?,
                total_budget: budget,
            };
            create(config).await
        }
        Commands::Reconcile { strategy } => reconcile(strategy).await,
    }
}

async fn serve(bind: String, tick_secs: u64, dry_run: bool) -> Result<()> {
    let components = components(dry_run).await?;

    let pipeline = Arc::new(ExecutionPipeline::new(
        components.store.clone(),
        components.ledger.clone(),
        components.signer.clone(),
        PipelineConfig {
            signing_timeout: env_secs("SIGNING_TIMEOUT_SECS", 30),
        },
    ));
    let provisioner = Arc::new(StrategyProvisioner::new(
        components.store.clone(),
        components.registrar.clone(),
        ProvisionerConfig {
            registrar_timeout: env_secs("REGISTRAR_TIMEOUT_SECS", 10),
        },
    ));
    let reconciler = Arc::new(LedgerReconciler::new(
        components.store.clone(),
        components.ledger.clone(),
    ));
    let scheduler = Arc::new(SweepScheduler::new(
        components.store.clone(),
        pipeline.clone(),
        SchedulerConfig {
            tick: Duration::from_secs(tick_secs),
        },
    ));

    let state = AppState {
        provisioner,
        pipeline,
        reconciler,
        store: components.store,
        ledger: components.ledger,
    };

    let bind: SocketAddr = bind.parse().context("invalid bind address")?;

    let sweeper = scheduler.clone();
    tokio::spawn(async move { sweeper.run().await });

    let result = ApiServer::new(state, ServerConfig { bind }).run().await;
    scheduler.stop();
    Ok(result?)
}

async fn create(config: StrategyConfig) -> Result<()> {
    let components = components(false).await?;
    let provisioner = StrategyProvisioner::new(
        components.store,
        components.registrar,
        ProvisionerConfig {
            registrar_timeout: env_secs("REGISTRAR_TIMEOUT_SECS", 10),
        },
    );

    let provisioned = provisioner.create(config, Utc::now()).await?;
    let strategy = &provisioned.strategy;

    println!("✅ Strategy created");
    println!("════════════════════════════════════");
    println!("Id:              {}", strategy.id);
    println!("Pair:            {}", strategy.config.pair);
    println!("Amount:          {}", strategy.config.amount);
    println!("Cadence:         {}", strategy.config.cadence);
    println!("Budget:          {}", strategy.config.total_budget);
    println!(
        "Gas ceiling:     {} gwei",
        gas_price::base_to_gwei(strategy.config.max_gas_price)
    );
    println!("Next execution:  {}", strategy.next_execution);
    match &provisioned.registration {
        PolicyRegistration::Registered { rule_ids } => {
            println!("Policy rules:    {}", rule_ids.join(", "));
        }
        PolicyRegistration::Failed { warning } => {
            println!("⚠️ Policy registration failed: {warning}");
            println!("   The local guard remains authoritative; strategy is active.");
        }
    }
    println!("════════════════════════════════════");

    Ok(())
}

async fn reconcile(strategy: Option<Uuid>) -> Result<()> {
    let components = components(false).await?;
    let reconciler = LedgerReconciler::new(components.store, components.ledger);

    let reports = match strategy {
        Some(id) => vec![reconciler.reconcile(StrategyId(id)).await?],
        None => reconciler.reconcile_all().await?,
    };

    if reports.is_empty() {
        println!("No strategies found.");
        return Ok(());
    }

    println!(
        "{:<38} | {:<12} | {:<12} | {:<8}",
        "Strategy", "Counter", "Ledger", "In sync"
    );
    println!("{}", "-".repeat(80));
    for report in &reports {
        println!(
            "{:<38} | {:<12} | {:<12} | {}",
            report.strategy_id,
            report.counter_amount,
            report.ledger_amount,
            if report.in_sync { "✅" } else { "❌ drift" }
        );
    }

    let drifted = reports.iter().filter(|r| !r.in_sync).count();
    if drifted > 0 {
        println!("\n⚠️ {drifted} strategy(ies) drifted; the ledger is the source of truth.");
    }

    Ok(())
}
