use anyhow::Result;
use bridge_ledger::config::Config;
use bridge_ledger::query::commands::{
    FlowMode, ReportContext, report_assets, report_flows, report_latest, report_networks,
    report_sync, report_top_addresses,
};
use bridge_ledger::query::formatters::OutputFormat;
use bridge_ledger::repository::SnapshotSource;
use bridge_ledger::source::{BridgeDataSource, CachedSource, HttpSource};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "report")]
#[command(about = "Bridge asset/liability reconciliation and flow reports", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "table")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Indexer sync state per rollup
    Sync,
    /// Assets originating on a rollup against their wrapped liabilities
    Assets {
        #[arg(long)]
        rollup: u32,
        #[arg(long, default_value = "1")]
        page: usize,
    },
    /// Bridge flows between networks
    Flows {
        #[arg(long)]
        chain: Option<u32>,
        #[arg(long, value_enum, default_value = "aggregated")]
        mode: FlowMode,
    },
    /// Addresses that bridged the most from a chain
    TopAddresses {
        #[arg(long)]
        chain: u32,
        #[arg(long, default_value = "10")]
        count: usize,
    },
    /// Bridge and claim counts per network
    Networks,
    /// Most recent bridge transactions
    Latest {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

async fn run<S>(source: &S, command: Commands, ctx: &ReportContext) -> Result<String>
where
    S: BridgeDataSource + ?Sized,
{
    match command {
        Commands::Sync => report_sync(source, ctx).await,
        Commands::Assets { rollup, page } => report_assets(source, rollup, page, ctx).await,
        Commands::Flows { chain, mode } => report_flows(source, chain, mode, ctx).await,
        Commands::TopAddresses { chain, count } => {
            report_top_addresses(source, chain, count, ctx).await
        }
        Commands::Networks => report_networks(source, ctx).await,
        Commands::Latest { limit } => report_latest(source, limit, ctx).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let format = OutputFormat::from(cli.format.as_str());

    let config = Config::from_env()?;
    let ctx = ReportContext::from_config(&config, format);

    let source: Box<dyn BridgeDataSource> = match &config.database_url {
        Some(database_url) => {
            let snapshot = SnapshotSource::open(database_url, config.bridge_address)?;
            Box::new(CachedSource::new(snapshot, config.cache_ttl))
        }
        None => {
            info!("Using backend at {}", config.api_base_url);
            let http = HttpSource::new(&config.api_base_url, config.request_timeout)?;
            Box::new(CachedSource::new(http, config.cache_ttl))
        }
    };

    let output = run(source.as_ref(), cli.command, &ctx).await?;
    println!("{output}");

    Ok(())
}
