mod common;

use alloy_primitives::{Address, U256};
use bridge_ledger::fetch::{FetchOptions, SyncState, fetch_page_balances, fetch_sync_states};
use bridge_ledger::numeric::Balance;
use bridge_ledger::pagination::paginate;
use bridge_ledger::reconcile::group_by_origin_asset;
use common::{MockSource, mapping, rollup};
use std::collections::HashMap;
use std::time::Duration;

fn fast() -> FetchOptions {
    FetchOptions {
        concurrency: 4,
        timeout: Duration::from_millis(200),
    }
}

#[tokio::test]
async fn sync_states_keep_rollup_order_and_isolate_failures() {
    let source = MockSource {
        sync_distances: HashMap::from([(0, 0), (1, 42)]),
        slow_sync: vec![2],
        ..Default::default()
    };
    let rollups = vec![
        rollup(2, "Astar zkEVM"),
        rollup(0, "Ethereum"),
        rollup(1, "Polygon zkEVM"),
        rollup(3, "X Layer"),
    ];

    let states = fetch_sync_states(&source, &rollups, fast()).await;

    let summary: Vec<(u32, SyncState)> = states.iter().map(|(r, s)| (r.id, *s)).collect();
    assert_eq!(
        summary,
        vec![
            (2, SyncState::Unreachable),
            (0, SyncState::Synced),
            (1, SyncState::Behind(42)),
            (3, SyncState::Unreachable),
        ]
    );
}

#[tokio::test]
async fn balances_fetched_for_visible_page_only() {
    let mappings: Vec<_> = (0..7u8)
        .map(|i| mapping(&format!("Token {i}"), 0x10 + i, 0x40 + i, 1))
        .collect();
    let source = MockSource {
        mappings: mappings.clone(),
        ..Default::default()
    };

    let page = paginate(group_by_origin_asset(&mappings), 2, 5);
    assert_eq!(page.items.len(), 2);

    fetch_page_balances(&source, page.items, fast()).await;

    // one asset and one liability lookup per visible group
    assert_eq!(source.balance_calls(), 4);
}

#[tokio::test]
async fn failed_balances_become_unavailable() {
    let usdc = mapping("USD Coin", 0x11, 0x22, 1);
    let source = MockSource {
        asset_balances: HashMap::from([((0, Address::repeat_byte(0x11)), U256::from(100))]),
        ..Default::default()
    };

    let groups = fetch_page_balances(&source, group_by_origin_asset(&[usdc]), fast()).await;

    assert_eq!(groups[0].asset_balance, Some(Balance::Amount(U256::from(100))));
    assert_eq!(groups[0].liabilities[0].balance, Some(Balance::Unavailable));

    let result = groups[0].reconcile();
    assert_eq!(result.total_liability_balance, U256::ZERO);
    assert_eq!(result.deficit.to_string(), "100");
}
