use crate::explorer::ExplorerTable;
use crate::fetch::SyncState;
use crate::flows::{ChainFlows, FlowGraph, network_label};
use crate::numeric::Balance;
use crate::pagination::Page;
use crate::ranking::{AddressCount, NetworkActivity, shorten};
use crate::reconcile::AssetGroup;
use crate::repository::{BridgeEvent, Rollup};
use comfy_table::{Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use csv::Writer;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};

pub const NO_DATA: &str = "No data available";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Table,
        }
    }
}

fn new_table<const N: usize>(header: [&str; N]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header.to_vec());
    table
}

fn csv_string(wtr: Writer<Vec<u8>>) -> String {
    String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}

fn balance_text(balance: Option<Balance>) -> String {
    balance.unwrap_or(Balance::Unavailable).to_string()
}

/// Address with its explorer link underneath, when there is one.
fn linked(text: String, url: Option<&String>) -> String {
    match url {
        Some(url) => format!("{text}\n{url}"),
        None => text,
    }
}

pub fn format_sync_states(states: &[(Rollup, SyncState)], format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            if states.is_empty() {
                return NO_DATA.to_string();
            }
            let mut table = new_table(["Rollup", "Network", "Synced Block", "State"]);
            for (rollup, state) in states {
                table.add_row(vec![
                    Cell::new(rollup.id),
                    Cell::new(&rollup.name),
                    Cell::new(rollup.latest_synced_block),
                    Cell::new(state.to_string()),
                ]);
            }
            table.to_string()
        }
        OutputFormat::Json => {
            let rows: Vec<_> = states
                .iter()
                .map(|(rollup, state)| {
                    let distance = match state {
                        SyncState::Synced => Some(0),
                        SyncState::Behind(d) => Some(*d),
                        SyncState::Unreachable => None,
                    };
                    json!({
                        "rollup_id": rollup.id,
                        "network_name": rollup.name,
                        "latest_synced_block": rollup.latest_synced_block,
                        "distance": distance,
                        "state": state.to_string(),
                    })
                })
                .collect();
            pretty(&Value::Array(rows))
        }
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record(["rollup_id", "network_name", "latest_synced_block", "state"]);
            for (rollup, state) in states {
                let _ = wtr.write_record([
                    &rollup.id.to_string(),
                    &rollup.name,
                    &rollup.latest_synced_block.to_string(),
                    &state.to_string(),
                ]);
            }
            csv_string(wtr)
        }
    }
}

/// Precomputed display values for one asset group.
struct AssetView<'a> {
    group: &'a AssetGroup,
    asset_url: Option<String>,
    liability_urls: Vec<Option<String>>,
}

impl<'a> AssetView<'a> {
    fn new(group: &'a AssetGroup, explorer: &ExplorerTable) -> Self {
        let asset_url = group
            .origin_token_address
            .and_then(|address| explorer.address_url(group.origin_network, &address));
        let liability_urls = group
            .liabilities
            .iter()
            .map(|entry| {
                entry
                    .wrapped_token_address
                    .and_then(|address| explorer.address_url(entry.destination_rollup_id, &address))
            })
            .collect();
        Self {
            group,
            asset_url,
            liability_urls,
        }
    }

    fn origin_address(&self) -> String {
        self.group
            .origin_token_address
            .map(|a| a.to_checksum(None))
            .unwrap_or_default()
    }
}

fn diff_marker(over_minted: bool) -> &'static str {
    if over_minted { "OVER-MINTED" } else { "OK" }
}

pub fn format_asset_page(
    page: &Page<AssetGroup>,
    names: &HashMap<u32, String>,
    explorer: &ExplorerTable,
    format: OutputFormat,
) -> String {
    let views: Vec<AssetView> = page
        .items
        .iter()
        .map(|group| AssetView::new(group, explorer))
        .collect();

    match format {
        OutputFormat::Table => format_asset_page_table(page, &views, names),
        OutputFormat::Json => format_asset_page_json(page, &views, names),
        OutputFormat::Csv => format_asset_page_csv(&views, names),
    }
}

fn format_asset_page_table(
    page: &Page<AssetGroup>,
    views: &[AssetView],
    names: &HashMap<u32, String>,
) -> String {
    if views.is_empty() {
        return NO_DATA.to_string();
    }

    let mut sections = Vec::with_capacity(views.len() + 1);
    for view in views {
        let group = view.group;
        let result = group.reconcile();
        let mut table = new_table([
            "Asset Address",
            "Asset Balance",
            "Liability Address",
            "Liability Balance",
            "Liability Origin",
            "Liability Destination",
        ]);

        for (i, (entry, url)) in group
            .liabilities
            .iter()
            .zip(&view.liability_urls)
            .enumerate()
        {
            let (asset_address, asset_balance) = if i == 0 {
                (
                    linked(view.origin_address(), view.asset_url.as_ref()),
                    balance_text(group.asset_balance),
                )
            } else {
                (String::new(), String::new())
            };
            let wrapped = entry
                .wrapped_token_address
                .map(|a| a.to_checksum(None))
                .unwrap_or_default();

            table.add_row(vec![
                Cell::new(asset_address),
                Cell::new(asset_balance),
                Cell::new(linked(wrapped, url.as_ref())),
                Cell::new(balance_text(entry.balance)),
                Cell::new(network_label(entry.origin_network, names)),
                Cell::new(network_label(entry.destination_rollup_id, names)),
            ]);
        }

        table.add_row(vec![
            Cell::new("Total"),
            Cell::new(balance_text(group.asset_balance)),
            Cell::new(""),
            Cell::new(result.total_liability_balance),
            Cell::new(""),
            Cell::new(""),
        ]);
        table.add_row(vec![
            Cell::new("Diff"),
            Cell::new(format!(
                "{} {}",
                result.deficit,
                diff_marker(result.is_over_minted())
            )),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
            Cell::new(""),
        ]);

        sections.push(format!("{}\n{}", group.display_name(), table));
    }
    sections.push(page.caption());
    sections.join("\n\n")
}

fn format_asset_page_json(
    page: &Page<AssetGroup>,
    views: &[AssetView],
    names: &HashMap<u32, String>,
) -> String {
    let assets: Vec<_> = views
        .iter()
        .map(|view| {
            let group = view.group;
            let result = group.reconcile();
            let liabilities: Vec<_> = group
                .liabilities
                .iter()
                .zip(&view.liability_urls)
                .map(|(entry, url)| {
                    json!({
                        "wrapped_token_address":
                            entry.wrapped_token_address.map(|a| a.to_checksum(None)),
                        "origin_network": entry.origin_network,
                        "destination_rollup_id": entry.destination_rollup_id,
                        "destination": network_label(entry.destination_rollup_id, names),
                        "balance": balance_text(entry.balance),
                        "explorer_url": url,
                    })
                })
                .collect();

            json!({
                "asset": group.display_name(),
                "key": group.key,
                "symbol": group.token.as_ref().map(|t| t.symbol.clone()),
                "origin_network": group.origin_network,
                "origin_token_address": group.origin_token_address.map(|a| a.to_checksum(None)),
                "explorer_url": view.asset_url,
                "asset_balance": balance_text(group.asset_balance),
                "liabilities": liabilities,
                "total_liability_balance": result.total_liability_balance.to_string(),
                "deficit": result.deficit.to_string(),
                "over_minted": result.is_over_minted(),
            })
        })
        .collect();

    pretty(&json!({
        "page": page.page_number,
        "total_pages": page.total_pages,
        "assets": assets,
    }))
}

fn format_asset_page_csv(views: &[AssetView], names: &HashMap<u32, String>) -> String {
    let mut wtr = Writer::from_writer(vec![]);
    let _ = wtr.write_record(["asset", "row", "network", "address", "balance", "explorer_url"]);

    for view in views {
        let group = view.group;
        let asset = group.display_name();
        let result = group.reconcile();

        let _ = wtr.write_record([
            asset.as_str(),
            "asset",
            &network_label(group.origin_network, names),
            &view.origin_address(),
            &balance_text(group.asset_balance),
            view.asset_url.as_deref().unwrap_or_default(),
        ]);
        for (entry, url) in group.liabilities.iter().zip(&view.liability_urls) {
            let _ = wtr.write_record([
                asset.as_str(),
                "liability",
                &network_label(entry.destination_rollup_id, names),
                &entry
                    .wrapped_token_address
                    .map(|a| a.to_checksum(None))
                    .unwrap_or_default(),
                &balance_text(entry.balance),
                url.as_deref().unwrap_or_default(),
            ]);
        }
        let _ = wtr.write_record([
            asset.as_str(),
            "total",
            "",
            "",
            &result.total_liability_balance.to_string(),
            "",
        ]);
        let _ = wtr.write_record([
            asset.as_str(),
            "diff",
            "",
            "",
            &result.deficit.to_string(),
            "",
        ]);
    }

    csv_string(wtr)
}

fn sankey_json(graph: &FlowGraph, names: &HashMap<u32, String>) -> Value {
    let links = graph.links();
    json!({
        "nodes": graph.labels(names),
        "source": links.sources,
        "target": links.targets,
        "value": links.values,
        "total": graph.total(),
    })
}

fn add_edges(table: &mut Table, direction: &str, graph: &FlowGraph, names: &HashMap<u32, String>) {
    for edge in graph.edges() {
        table.add_row(vec![
            Cell::new(direction),
            Cell::new(network_label(edge.source, names)),
            Cell::new(network_label(edge.target, names)),
            Cell::new(edge.count),
        ]);
    }
}

pub fn format_chain_flows(
    flows: &[ChainFlows],
    names: &HashMap<u32, String>,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Table => {
            let non_empty: Vec<&ChainFlows> = flows
                .iter()
                .filter(|f| !f.inbound.is_empty() || !f.outbound.is_empty())
                .collect();
            if non_empty.is_empty() {
                return NO_DATA.to_string();
            }

            non_empty
                .iter()
                .map(|f| {
                    let mut table = new_table(["Direction", "From", "To", "Count"]);
                    add_edges(&mut table, "Inbound", &f.inbound, names);
                    add_edges(&mut table, "Outbound", &f.outbound, names);
                    format!(
                        "{} (ID {}): inbound {}, outbound {}\n{}",
                        network_label(f.chain, names),
                        f.chain,
                        f.total_inbound(),
                        f.total_outbound(),
                        table
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n")
        }
        OutputFormat::Json => {
            let rows: Vec<_> = flows
                .iter()
                .map(|f| {
                    json!({
                        "chain": f.chain,
                        "label": network_label(f.chain, names),
                        "inbound": sankey_json(&f.inbound, names),
                        "outbound": sankey_json(&f.outbound, names),
                    })
                })
                .collect();
            pretty(&Value::Array(rows))
        }
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record(["chain", "direction", "source", "target", "count"]);
            for f in flows {
                for (direction, graph) in [("inbound", &f.inbound), ("outbound", &f.outbound)] {
                    for edge in graph.edges() {
                        let _ = wtr.write_record([
                            f.chain.to_string().as_str(),
                            direction,
                            &edge.source.to_string(),
                            &edge.target.to_string(),
                            &edge.count.to_string(),
                        ]);
                    }
                }
            }
            csv_string(wtr)
        }
    }
}

pub fn format_destination_graphs(
    graphs: &BTreeMap<u32, FlowGraph>,
    names: &HashMap<u32, String>,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Table => {
            if graphs.is_empty() {
                return NO_DATA.to_string();
            }
            let total: u64 = graphs.values().map(FlowGraph::total).sum();
            let mut sections = vec![format!("Total bridge events processed: {total}")];
            for (destination, graph) in graphs {
                let mut table = new_table(["Direction", "From", "To", "Count"]);
                add_edges(&mut table, "Inbound", graph, names);
                sections.push(format!(
                    "Inbound bridges to {} (ID {}): {}\n{}",
                    network_label(*destination, names),
                    destination,
                    graph.total(),
                    table
                ));
            }
            sections.join("\n\n")
        }
        OutputFormat::Json => {
            let rows: Vec<_> = graphs
                .iter()
                .map(|(destination, graph)| {
                    json!({
                        "destination": destination,
                        "label": network_label(*destination, names),
                        "graph": sankey_json(graph, names),
                    })
                })
                .collect();
            pretty(&Value::Array(rows))
        }
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record(["destination", "origin", "count"]);
            for (destination, graph) in graphs {
                for edge in graph.edges() {
                    let _ = wtr.write_record([
                        &destination.to_string(),
                        &edge.source.to_string(),
                        &edge.count.to_string(),
                    ]);
                }
            }
            csv_string(wtr)
        }
    }
}

fn share(count: u64, total: u64) -> String {
    if total == 0 {
        return "0.0%".to_string();
    }
    format!("{:.1}%", count as f64 * 100.0 / total as f64)
}

pub fn format_top_addresses(addresses: &[AddressCount], format: OutputFormat) -> String {
    let total: u64 = addresses.iter().map(|a| a.count).sum();

    match format {
        OutputFormat::Table => {
            if addresses.is_empty() {
                return NO_DATA.to_string();
            }
            let mut table = new_table(["Rank", "Address", "Bridges", "Share"]);
            for (rank, entry) in addresses.iter().enumerate() {
                table.add_row(vec![
                    Cell::new(rank + 1),
                    Cell::new(entry.short_label()),
                    Cell::new(entry.count),
                    Cell::new(share(entry.count, total)),
                ]);
            }
            table.to_string()
        }
        OutputFormat::Json => {
            let rows: Vec<_> = addresses
                .iter()
                .enumerate()
                .map(|(rank, entry)| {
                    json!({
                        "rank": rank + 1,
                        "address": entry.address,
                        "label": entry.short_label(),
                        "count": entry.count,
                    })
                })
                .collect();
            pretty(&Value::Array(rows))
        }
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record(["rank", "address", "count"]);
            for (rank, entry) in addresses.iter().enumerate() {
                let _ = wtr.write_record([
                    &(rank + 1).to_string(),
                    &entry.address,
                    &entry.count.to_string(),
                ]);
            }
            csv_string(wtr)
        }
    }
}

pub fn format_network_activity(
    activity: &[NetworkActivity],
    names: &HashMap<u32, String>,
    format: OutputFormat,
) -> String {
    let total_bridges: u64 = activity.iter().map(|a| a.bridges).sum();
    let total_claims: u64 = activity.iter().map(|a| a.claims).sum();

    match format {
        OutputFormat::Table => {
            if activity.is_empty() {
                return NO_DATA.to_string();
            }
            let mut table =
                new_table(["Network", "Bridges", "Bridge Share", "Claims", "Claim Share"]);
            for entry in activity {
                table.add_row(vec![
                    Cell::new(network_label(entry.network, names)),
                    Cell::new(entry.bridges),
                    Cell::new(share(entry.bridges, total_bridges)),
                    Cell::new(entry.claims),
                    Cell::new(share(entry.claims, total_claims)),
                ]);
            }
            table.to_string()
        }
        OutputFormat::Json => {
            let rows: Vec<_> = activity
                .iter()
                .map(|entry| {
                    json!({
                        "network": entry.network,
                        "label": network_label(entry.network, names),
                        "bridges": entry.bridges,
                        "claims": entry.claims,
                    })
                })
                .collect();
            pretty(&Value::Array(rows))
        }
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record(["network", "bridges", "claims"]);
            for entry in activity {
                let _ = wtr.write_record([
                    &entry.network.to_string(),
                    &entry.bridges.to_string(),
                    &entry.claims.to_string(),
                ]);
            }
            csv_string(wtr)
        }
    }
}

fn optional_label(id: Option<u32>, names: &HashMap<u32, String>) -> String {
    id.map(|id| network_label(id, names))
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Explorer link for a bridge transaction, looked up on its origin network.
fn event_tx_url(event: &BridgeEvent, explorer: &ExplorerTable) -> Option<String> {
    let hash = event.tx_hash.as_deref()?;
    explorer.tx_url(event.origin_network.unwrap_or(0), hash)
}

pub fn format_latest_events(
    events: &[BridgeEvent],
    names: &HashMap<u32, String>,
    explorer: &ExplorerTable,
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Table => {
            if events.is_empty() {
                return NO_DATA.to_string();
            }
            let mut table = new_table(["Block", "Tx", "Origin", "Destination", "Amount"]);
            for event in events {
                let tx = shorten(event.tx_hash.as_deref().unwrap_or_default());
                table.add_row(vec![
                    Cell::new(event.block_number),
                    Cell::new(linked(tx, event_tx_url(event, explorer).as_ref())),
                    Cell::new(optional_label(event.origin_network, names)),
                    Cell::new(optional_label(event.destination_network, names)),
                    Cell::new(event.amount),
                ]);
            }
            table.to_string()
        }
        OutputFormat::Json => {
            let rows: Vec<_> = events
                .iter()
                .map(|event| {
                    json!({
                        "block_number": event.block_number,
                        "transaction_hash": event.tx_hash,
                        "explorer_url": event_tx_url(event, explorer),
                        "origin_network": event.origin_network,
                        "destination_network": event.destination_network,
                        "origin_address": event.origin_address,
                        "amount": event.amount.to_string(),
                    })
                })
                .collect();
            pretty(&Value::Array(rows))
        }
        OutputFormat::Csv => {
            let mut wtr = Writer::from_writer(vec![]);
            let _ = wtr.write_record([
                "block_number",
                "transaction_hash",
                "origin_network",
                "destination_network",
                "origin_address",
                "amount",
            ]);
            for event in events {
                let _ = wtr.write_record([
                    event.block_number.to_string().as_str(),
                    event.tx_hash.as_deref().unwrap_or_default(),
                    &event
                        .origin_network
                        .map(|n| n.to_string())
                        .unwrap_or_default(),
                    &event
                        .destination_network
                        .map(|n| n.to_string())
                        .unwrap_or_default(),
                    event.origin_address.as_deref().unwrap_or_default(),
                    &event.amount.to_string(),
                ]);
            }
            csv_string(wtr)
        }
    }
}
