#![allow(dead_code)]

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use bridge_ledger::error::RetrievalError;
use bridge_ledger::metadata::TokenMetadata;
use bridge_ledger::repository::{
    BridgeEvent, EventFilter, EventKind, FlowRow, NetworkCount, Rollup, WrappedTokenMapping,
};
use bridge_ledger::source::{BridgeDataSource, SourceResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// In-process source with canned answers. Balances missing from the maps
/// fail with a backend error; `slow_sync` rollups never answer in time.
#[derive(Default)]
pub struct MockSource {
    pub rollups: Vec<Rollup>,
    pub mappings: Vec<WrappedTokenMapping>,
    pub asset_balances: HashMap<(u32, Address), U256>,
    pub liability_balances: HashMap<(u32, Address), U256>,
    pub sync_distances: HashMap<u32, u64>,
    pub slow_sync: Vec<u32>,
    pub events: Vec<BridgeEvent>,
    pub flows: Vec<FlowRow>,
    pub bridge_counts: Vec<NetworkCount>,
    pub claim_counts: Vec<NetworkCount>,
    pub balance_calls: AtomicUsize,
}

impl MockSource {
    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BridgeDataSource for MockSource {
    async fn list_rollups(&self) -> SourceResult<Vec<Rollup>> {
        Ok(self.rollups.clone())
    }

    async fn list_wrapped_tokens(
        &self,
        origin_network: u32,
    ) -> SourceResult<Vec<WrappedTokenMapping>> {
        Ok(self
            .mappings
            .iter()
            .filter(|m| m.origin_network == origin_network)
            .cloned()
            .collect())
    }

    async fn get_asset_balance(
        &self,
        network_id: u32,
        token: Address,
    ) -> SourceResult<Option<U256>> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.asset_balances
            .get(&(network_id, token))
            .map(|b| Some(*b))
            .ok_or_else(|| RetrievalError::Backend("no asset balance".to_string()))
    }

    async fn get_liability_balance(
        &self,
        network_id: u32,
        token: Address,
    ) -> SourceResult<Option<U256>> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        self.liability_balances
            .get(&(network_id, token))
            .map(|b| Some(*b))
            .ok_or_else(|| RetrievalError::Backend("no liability balance".to_string()))
    }

    async fn get_sync_distance(&self, rollup_id: u32) -> SourceResult<Option<u64>> {
        if self.slow_sync.contains(&rollup_id) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
        Ok(self.sync_distances.get(&rollup_id).copied())
    }

    async fn query_bridge_events(&self, filter: EventFilter) -> SourceResult<Vec<BridgeEvent>> {
        let mut events: Vec<BridgeEvent> = self
            .events
            .iter()
            .filter(|e| match filter.chain {
                Some(chain) => {
                    e.origin_network == Some(chain) || e.destination_network == Some(chain)
                }
                None => true,
            })
            .cloned()
            .collect();
        events.truncate(filter.limit);
        Ok(events)
    }

    async fn query_aggregated_flows(&self, _chain_id: u32) -> SourceResult<Vec<FlowRow>> {
        Ok(self.flows.clone())
    }

    async fn query_event_counts_by_network(
        &self,
        kind: EventKind,
    ) -> SourceResult<Vec<NetworkCount>> {
        Ok(match kind {
            EventKind::Bridge => self.bridge_counts.clone(),
            EventKind::Claim => self.claim_counts.clone(),
        })
    }
}

pub fn rollup(id: u32, name: &str) -> Rollup {
    Rollup {
        id,
        name: name.to_string(),
        latest_synced_block: 1_000,
    }
}

pub fn mapping(name: &str, origin: u8, wrapped: u8, destination: u32) -> WrappedTokenMapping {
    WrappedTokenMapping {
        origin_network: 0,
        origin_token_address: Some(Address::repeat_byte(origin)),
        wrapped_token_address: Some(Address::repeat_byte(wrapped)),
        destination_rollup_id: destination,
        metadata: TokenMetadata {
            name: name.to_string(),
            symbol: name.to_uppercase(),
        }
        .encode(),
    }
}

pub fn event(origin: u32, destination: u32, address: &str, block_number: u64) -> BridgeEvent {
    BridgeEvent {
        origin_network: Some(origin),
        destination_network: Some(destination),
        origin_address: Some(address.to_string()),
        block_number,
        tx_hash: Some(format!("0x{block_number:064x}")),
        amount: U256::from(block_number),
    }
}
