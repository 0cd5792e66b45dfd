//! NFT Union CLI: page through fixture sources the way the gateway would.
//!
//! Commands:
//! - `page`: fetch one merged page, optionally resuming from a continuation
//! - `drain`: follow continuations until the stream ends
//! - `single`: page one source and get its raw per-entity cursor
//! - `decode`: show the per-source state packed in a combined continuation
//!
//! Log verbosity follows `RUST_LOG` (default `warn`); logs go to stderr and
//! JSON results to stdout.

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nftunion_core::{
    ArgPaging, ByLastUpdatedAndId, CombinedContinuation, ContinuationFactory, Slice, SortDirection,
    SourceState,
};
use nftunion_runner::fixture::{blockchain_sources, currency_sources};
use nftunion_runner::presets::{self, ByLastUpdated};
use nftunion_runner::{
    AggregateError, Aggregator, Fixture, GatewayConfig, InMemorySource, PageRequest, UnionOrder,
};

#[derive(Parser)]
#[command(
    name = "nftunion",
    about = "NFT Union CLI: merged pagination over multi-chain sources"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one merged page across all sources.
    Page {
        #[command(flatten)]
        selection: Selection,

        /// Combined continuation returned by the previous page.
        #[arg(long)]
        continuation: Option<String>,
    },
    /// Follow continuations until the stream ends and print every entity.
    Drain {
        #[command(flatten)]
        selection: Selection,
    },
    /// Fetch one page from a single source.
    Single {
        #[command(flatten)]
        selection: Selection,

        /// Source id (blockchain, or currency with --by-currency).
        #[arg(long)]
        from: String,

        /// Raw cursor returned by the previous single-source page.
        #[arg(long)]
        continuation: Option<String>,
    },
    /// Print the per-source states of a combined continuation.
    Decode {
        /// Combined continuation, e.g. "ETHEREUM:1700000000000_ETHEREUM:0xabc:1;FLOW:COMPLETED".
        continuation: String,
    },
}

#[derive(Args)]
struct Selection {
    /// JSON fixture with items, ownerships, orders and activities.
    #[arg(long)]
    fixture: PathBuf,

    /// Entity type to page.
    #[arg(long, value_enum, default_value_t = EntityKind::Items)]
    entity: EntityKind,

    /// Ordering. Price orderings apply to orders only.
    #[arg(long, value_enum, default_value_t = SortKey::LastUpdatedDesc)]
    sort: SortKey,

    /// Page size. Defaults to the configured default size.
    #[arg(long)]
    size: Option<usize>,

    /// Restrict to these source ids.
    #[arg(long = "source")]
    sources: Vec<String>,

    /// Split orders into one source per currency instead of per blockchain.
    #[arg(long, default_value_t = false)]
    by_currency: bool,

    /// Gateway config TOML file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fetch sources one after another.
    #[arg(long, default_value_t = false)]
    sequential: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EntityKind {
    Items,
    Ownerships,
    Orders,
    Activities,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SortKey {
    LastUpdatedAsc,
    LastUpdatedDesc,
    PriceAsc,
    PriceDesc,
}

impl SortKey {
    fn direction(self) -> SortDirection {
        match self {
            SortKey::LastUpdatedAsc | SortKey::PriceAsc => SortDirection::Asc,
            SortKey::LastUpdatedDesc | SortKey::PriceDesc => SortDirection::Desc,
        }
    }

    fn is_price(self) -> bool {
        matches!(self, SortKey::PriceAsc | SortKey::PriceDesc)
    }
}

enum Action {
    Page { continuation: Option<String> },
    Drain,
    Single { from: String, continuation: Option<String> },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Page {
            selection,
            continuation,
        } => run(&selection, Action::Page { continuation }),
        Commands::Drain { selection } => run(&selection, Action::Drain),
        Commands::Single {
            selection,
            from,
            continuation,
        } => run(&selection, Action::Single { from, continuation }),
        Commands::Decode { continuation } => run_decode(&continuation),
    }
}

fn load_config(selection: &Selection) -> Result<GatewayConfig> {
    let mut config = match &selection.config {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default(),
    };
    if selection.sequential {
        config.parallel = false;
    }
    Ok(config)
}

/// Listing presets are newest-first; ascending swaps in the mirrored order.
fn listing(preset: ByLastUpdated, direction: SortDirection) -> ByLastUpdated {
    match direction {
        SortDirection::Desc => preset,
        SortDirection::Asc => ArgPaging::single(ByLastUpdatedAndId::ASC),
    }
}

fn run(selection: &Selection, action: Action) -> Result<()> {
    let fixture = Fixture::from_file(&selection.fixture)?;
    let config = load_config(selection)?;
    let direction = selection.sort.direction();

    if selection.by_currency && selection.entity != EntityKind::Orders {
        bail!("--by-currency applies to orders only");
    }

    match selection.entity {
        EntityKind::Orders if selection.sort.is_price() => {
            let paging = match direction {
                SortDirection::Asc => presets::sell_orders_by_price(),
                SortDirection::Desc => presets::bids_by_price(),
            };
            let sources = order_sources(fixture.orders, *paging.source_order(), selection)?;
            execute(paging, sources, config, selection, action)
        }
        _ if selection.sort.is_price() => bail!("price ordering applies to orders only"),
        EntityKind::Items => {
            let paging = listing(presets::items_by_last_updated(), direction);
            let sources = blockchain_sources(fixture.items, *paging.source_order())?;
            execute(paging, sources, config, selection, action)
        }
        EntityKind::Ownerships => {
            let paging = listing(presets::ownerships_by_last_updated(), direction);
            let sources = blockchain_sources(fixture.ownerships, *paging.source_order())?;
            execute(paging, sources, config, selection, action)
        }
        EntityKind::Orders => {
            let paging = listing(presets::orders_by_last_updated(), direction);
            let sources = order_sources(fixture.orders, *paging.source_order(), selection)?;
            execute(paging, sources, config, selection, action)
        }
        EntityKind::Activities => {
            let paging = presets::activities_by_date(direction);
            let sources = blockchain_sources(fixture.activities, *paging.source_order())?;
            execute(paging, sources, config, selection, action)
        }
    }
}

fn order_sources<F>(
    orders: Vec<UnionOrder>,
    order: F,
    selection: &Selection,
) -> Result<Vec<InMemorySource<UnionOrder, F>>>
where
    F: ContinuationFactory<UnionOrder> + Clone,
{
    Ok(if selection.by_currency {
        currency_sources(orders, order)?
    } else {
        blockchain_sources(orders, order)?
    })
}

fn execute<E, F>(
    paging: ArgPaging<F, F>,
    sources: Vec<InMemorySource<E, F>>,
    config: GatewayConfig,
    selection: &Selection,
    action: Action,
) -> Result<()>
where
    E: Serialize + Clone + Send + Sync + 'static,
    F: ContinuationFactory<E> + 'static,
{
    let mut gateway = Aggregator::new(paging, config);
    for source in sources {
        gateway.add_source(Arc::new(source)).map_err(gateway_error)?;
    }
    info!(sources = ?gateway.source_ids(), "gateway ready");

    let request = PageRequest {
        continuation: None,
        size: selection.size,
        sources: selection.sources.clone(),
    };

    match action {
        Action::Page { continuation } => {
            let request = PageRequest {
                continuation,
                ..request
            };
            let slice = gateway.fetch_page(&request).map_err(gateway_error)?;
            print_json(&slice)
        }
        Action::Drain => {
            let entities = gateway.drain(&request).map_err(gateway_error)?;
            info!(total = entities.len(), "drained");
            print_json(&Slice::new(None, entities))
        }
        Action::Single { from, continuation } => {
            let slice = gateway
                .fetch_single(&from, continuation.as_deref(), selection.size)
                .map_err(gateway_error)?;
            print_json(&slice)
        }
    }
}

fn gateway_error(error: AggregateError) -> anyhow::Error {
    anyhow!("[{}] {error}", error.http_status())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_decode(continuation: &str) -> Result<()> {
    let combined = CombinedContinuation::parse(Some(continuation))?;
    if combined.is_empty() {
        println!("(start of stream)");
        return Ok(());
    }
    for (source_id, state) in combined.iter() {
        match state {
            SourceState::Completed => println!("{source_id:<12} COMPLETED"),
            SourceState::Active(cursor) => println!("{source_id:<12} after {cursor}"),
            SourceState::Unset => println!("{source_id:<12} not started"),
        }
    }
    Ok(())
}
