mod common;

use alloy_primitives::{Address, U256};
use bridge_ledger::explorer::ExplorerTable;
use bridge_ledger::fetch::FetchOptions;
use bridge_ledger::query::commands::{
    FlowMode, ReportContext, report_assets, report_flows, report_latest, report_networks,
    report_top_addresses,
};
use bridge_ledger::query::formatters::{NO_DATA, OutputFormat};
use bridge_ledger::repository::{FlowRow, NetworkCount};
use common::{MockSource, event, mapping, rollup};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

fn ctx(format: OutputFormat) -> ReportContext {
    ReportContext {
        fetch: FetchOptions {
            concurrency: 4,
            timeout: Duration::from_millis(500),
        },
        page_size: 5,
        event_limit: 5_000,
        explorer: ExplorerTable::default(),
        format,
    }
}

fn json(output: &str) -> Value {
    serde_json::from_str(output).unwrap()
}

#[tokio::test]
async fn over_minted_asset_is_flagged() {
    let source = MockSource {
        rollups: vec![rollup(0, "Ethereum"), rollup(1, "Polygon zkEVM")],
        mappings: vec![
            mapping("USD Coin", 0x11, 0x21, 1),
            mapping("USD Coin", 0x11, 0x22, 2),
        ],
        asset_balances: HashMap::from([((0, Address::repeat_byte(0x11)), U256::from(1_000))]),
        liability_balances: HashMap::from([
            ((1, Address::repeat_byte(0x21)), U256::from(700)),
            ((2, Address::repeat_byte(0x22)), U256::from(450)),
        ]),
        ..Default::default()
    };

    let output = report_assets(&source, 0, 1, &ctx(OutputFormat::Json))
        .await
        .unwrap();
    let parsed = json(&output);
    let asset = &parsed["assets"][0];

    assert_eq!(parsed["assets"].as_array().unwrap().len(), 1);
    assert_eq!(asset["asset"], "USD Coin");
    assert_eq!(asset["liabilities"].as_array().unwrap().len(), 2);
    assert_eq!(asset["total_liability_balance"], "1150");
    assert_eq!(asset["deficit"], "-150");
    assert_eq!(asset["over_minted"], true);
    assert_eq!(asset["liabilities"][0]["destination"], "Polygon zkEVM");
    assert_eq!(asset["liabilities"][1]["destination"], "Network 2");
}

#[tokio::test]
async fn out_of_range_page_is_clamped() {
    let mappings: Vec<_> = (0..7u8)
        .map(|i| mapping(&format!("Token {i}"), 0x10 + i, 0x40 + i, 1))
        .collect();
    let source = MockSource {
        mappings,
        ..Default::default()
    };

    let output = report_assets(&source, 0, 9, &ctx(OutputFormat::Json))
        .await
        .unwrap();
    let parsed = json(&output);
    assert_eq!(parsed["page"], 2);
    assert_eq!(parsed["total_pages"], 2);
    assert_eq!(parsed["assets"].as_array().unwrap().len(), 2);
    assert_eq!(parsed["assets"][0]["asset_balance"], "N/A");
}

#[tokio::test]
async fn empty_rollup_reports_no_data() {
    let source = MockSource::default();
    let output = report_assets(&source, 5, 1, &ctx(OutputFormat::Table))
        .await
        .unwrap();
    assert_eq!(output, NO_DATA);
}

#[tokio::test]
async fn aggregated_flows_split_by_direction() {
    let source = MockSource {
        flows: vec![
            FlowRow::new(1, 2, 5),
            FlowRow::new(2, 1, 3),
            FlowRow::new(3, 4, 9),
        ],
        ..Default::default()
    };

    let output = report_flows(&source, Some(1), FlowMode::Aggregated, &ctx(OutputFormat::Json))
        .await
        .unwrap();
    let parsed = json(&output);
    assert_eq!(parsed[0]["outbound"]["total"], 5);
    assert_eq!(parsed[0]["inbound"]["total"], 3);

    let missing_chain =
        report_flows(&source, None, FlowMode::Aggregated, &ctx(OutputFormat::Json)).await;
    assert!(missing_chain.is_err());
}

#[tokio::test]
async fn event_flows_skip_self_loops() {
    let source = MockSource {
        events: vec![event(5, 5, "0xa", 1), event(5, 6, "0xa", 2)],
        ..Default::default()
    };

    let output = report_flows(&source, None, FlowMode::Events, &ctx(OutputFormat::Csv))
        .await
        .unwrap();
    assert!(!output.contains(",5,5,"));
    assert!(output.contains("5,outbound,5,6,1"));
    assert!(output.contains("6,inbound,5,6,1"));
}

#[tokio::test]
async fn top_addresses_rank_with_stable_ties() {
    let source = MockSource {
        events: vec![
            event(0, 1, "0xA", 1),
            event(0, 1, "0xB", 2),
            event(0, 1, "0xa", 3),
            event(0, 1, "0xC", 4),
            event(0, 2, "0xb", 5),
            event(0, 2, "0xB", 6),
            event(0, 2, "0xA", 7),
        ],
        ..Default::default()
    };

    let output = report_top_addresses(&source, 0, 2, &ctx(OutputFormat::Json))
        .await
        .unwrap();
    let parsed = json(&output);
    assert_eq!(parsed[0]["address"], "0xa");
    assert_eq!(parsed[1]["address"], "0xb");
    assert_eq!(parsed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn networks_merge_bridge_and_claim_counts() {
    let count = |network, count| NetworkCount {
        network: Some(network),
        count,
    };
    let source = MockSource {
        rollups: vec![rollup(0, "Ethereum")],
        bridge_counts: vec![count(0, 30), count(1, 10)],
        claim_counts: vec![count(1, 25)],
        ..Default::default()
    };

    let output = report_networks(&source, &ctx(OutputFormat::Json))
        .await
        .unwrap();
    let parsed = json(&output);
    assert_eq!(parsed[0]["network"], 1);
    assert_eq!(parsed[0]["claims"], 25);
    assert_eq!(parsed[1]["label"], "Ethereum");
}

#[tokio::test]
async fn latest_events_newest_first_with_links() {
    let source = MockSource {
        events: vec![
            event(0, 1, "0xa", 10),
            event(0, 1, "0xa", 30),
            event(9, 1, "0xa", 20),
        ],
        ..Default::default()
    };

    let output = report_latest(&source, 2, &ctx(OutputFormat::Json))
        .await
        .unwrap();
    let parsed = json(&output);
    assert_eq!(parsed[0]["block_number"], 30);
    assert!(
        parsed[0]["explorer_url"]
            .as_str()
            .unwrap()
            .starts_with("https://etherscan.io/tx/0x")
    );
    assert_eq!(parsed.as_array().unwrap().len(), 2);
}
