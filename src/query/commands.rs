use crate::config::Config;
use crate::explorer::ExplorerTable;
use crate::fetch::{FetchOptions, fetch_page_balances, fetch_sync_states, load_or_empty};
use crate::flows::{build_from_aggregated_rows, build_inbound_outbound, build_per_destination};
use crate::pagination::{clamp_page, paginate, total_pages};
use crate::query::formatters::{
    OutputFormat, format_asset_page, format_chain_flows, format_destination_graphs,
    format_latest_events, format_network_activity, format_sync_states, format_top_addresses,
};
use crate::ranking::{latest_events, network_activity, top_addresses_by_origin_chain};
use crate::reconcile::group_by_origin_asset;
use crate::repository::{EventFilter, EventKind, Rollup};
use crate::source::BridgeDataSource;
use crate::source::http::retry_budget;
use anyhow::{Result, bail};
use clap::ValueEnum;
use std::collections::HashMap;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlowMode {
    /// Counts aggregated by the backend for one chain
    Aggregated,
    /// Inbound/outbound graphs counted from raw events
    Events,
    /// One inbound graph per destination network
    Destinations,
}

/// Settings every report needs besides the source itself.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub fetch: FetchOptions,
    pub page_size: usize,
    pub event_limit: usize,
    pub explorer: ExplorerTable,
    pub format: OutputFormat,
}

impl ReportContext {
    pub fn from_config(config: &Config, format: OutputFormat) -> Self {
        Self {
            fetch: FetchOptions {
                concurrency: config.max_concurrent_requests,
                timeout: retry_budget(config.request_timeout),
            },
            page_size: config.page_size,
            event_limit: config.event_limit,
            explorer: ExplorerTable::default().with_overrides(&config.explorer_overrides),
            format,
        }
    }
}

fn network_names(rollups: &[Rollup]) -> HashMap<u32, String> {
    rollups.iter().map(|r| (r.id, r.name.clone())).collect()
}

async fn load_names<S>(source: &S) -> HashMap<u32, String>
where
    S: BridgeDataSource + ?Sized,
{
    network_names(&load_or_empty("rollups", source.list_rollups()).await)
}

pub async fn report_sync<S>(source: &S, ctx: &ReportContext) -> Result<String>
where
    S: BridgeDataSource + ?Sized,
{
    let rollups = load_or_empty("rollups", source.list_rollups()).await;
    let states = fetch_sync_states(source, &rollups, ctx.fetch).await;
    Ok(format_sync_states(&states, ctx.format))
}

/// One page of the asset/liability reconciliation for assets originating
/// on `rollup`. Balances are only looked up for the requested page.
pub async fn report_assets<S>(
    source: &S,
    rollup: u32,
    page: usize,
    ctx: &ReportContext,
) -> Result<String>
where
    S: BridgeDataSource + ?Sized,
{
    let names = load_names(source).await;
    let mappings = load_or_empty("wrapped tokens", source.list_wrapped_tokens(rollup)).await;
    let groups = group_by_origin_asset(&mappings);

    let page_number = clamp_page(page, total_pages(groups.len(), ctx.page_size));
    if page_number != page {
        info!("Requested page {} clamped to {}", page, page_number);
    }
    let mut page = paginate(groups, page_number, ctx.page_size);
    page.items = fetch_page_balances(source, page.items, ctx.fetch).await;

    Ok(format_asset_page(&page, &names, &ctx.explorer, ctx.format))
}

pub async fn report_flows<S>(
    source: &S,
    chain: Option<u32>,
    mode: FlowMode,
    ctx: &ReportContext,
) -> Result<String>
where
    S: BridgeDataSource + ?Sized,
{
    let names = load_names(source).await;

    match mode {
        FlowMode::Aggregated => {
            let Some(chain) = chain else {
                bail!("--chain is required for aggregated flows");
            };
            let rows =
                load_or_empty("aggregated flows", source.query_aggregated_flows(chain)).await;
            let flows = build_from_aggregated_rows(&rows, chain);
            Ok(format_chain_flows(&[flows], &names, ctx.format))
        }
        FlowMode::Events => {
            let filter = match chain {
                Some(chain) => EventFilter::for_chain(chain, ctx.event_limit),
                None => EventFilter::latest(ctx.event_limit),
            };
            let events = load_or_empty("bridge events", source.query_bridge_events(filter)).await;
            info!("Building flows from {} bridge events", events.len());
            let flows: Vec<_> = build_inbound_outbound(&events, chain)
                .into_values()
                .collect();
            Ok(format_chain_flows(&flows, &names, ctx.format))
        }
        FlowMode::Destinations => {
            let events = load_or_empty(
                "bridge events",
                source.query_bridge_events(EventFilter::latest(ctx.event_limit)),
            )
            .await;
            let mut graphs = build_per_destination(&events);
            if let Some(chain) = chain {
                graphs.retain(|destination, _| *destination == chain);
            }
            Ok(format_destination_graphs(&graphs, &names, ctx.format))
        }
    }
}

pub async fn report_top_addresses<S>(
    source: &S,
    chain: u32,
    count: usize,
    ctx: &ReportContext,
) -> Result<String>
where
    S: BridgeDataSource + ?Sized,
{
    let events = load_or_empty(
        "bridge events",
        source.query_bridge_events(EventFilter::for_chain(chain, ctx.event_limit)),
    )
    .await;
    let top = top_addresses_by_origin_chain(&events, chain, count);
    Ok(format_top_addresses(&top, ctx.format))
}

pub async fn report_networks<S>(source: &S, ctx: &ReportContext) -> Result<String>
where
    S: BridgeDataSource + ?Sized,
{
    let names = load_names(source).await;
    let bridges = load_or_empty(
        "bridge counts",
        source.query_event_counts_by_network(EventKind::Bridge),
    )
    .await;
    let claims = load_or_empty(
        "claim counts",
        source.query_event_counts_by_network(EventKind::Claim),
    )
    .await;

    let activity = network_activity(&bridges, &claims);
    Ok(format_network_activity(&activity, &names, ctx.format))
}

pub async fn report_latest<S>(source: &S, limit: usize, ctx: &ReportContext) -> Result<String>
where
    S: BridgeDataSource + ?Sized,
{
    let names = load_names(source).await;
    let events = load_or_empty(
        "bridge events",
        source.query_bridge_events(EventFilter::latest(limit)),
    )
    .await;
    let latest = latest_events(&events, limit);
    Ok(format_latest_events(
        &latest,
        &names,
        &ctx.explorer,
        ctx.format,
    ))
}
