pub mod cache;
pub mod http;

use crate::error::RetrievalError;
use crate::repository::{
    BridgeEvent, EventFilter, EventKind, FlowRow, NetworkCount, Rollup, WrappedTokenMapping,
};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;

pub use cache::CachedSource;
pub use http::HttpSource;

pub type SourceResult<T> = Result<T, RetrievalError>;

/// Backend operations the core depends on. Implementations validate the
/// backend's shapes into typed records; balances and distances use `None`
/// when the backend has no value for the key.
#[async_trait]
pub trait BridgeDataSource: Send + Sync {
    async fn list_rollups(&self) -> SourceResult<Vec<Rollup>>;

    async fn list_wrapped_tokens(
        &self,
        origin_network: u32,
    ) -> SourceResult<Vec<WrappedTokenMapping>>;

    /// Origin asset locked in the bridge on `network_id`.
    async fn get_asset_balance(
        &self,
        network_id: u32,
        token: Address,
    ) -> SourceResult<Option<U256>>;

    /// Circulating supply of a wrapped token on `network_id`.
    async fn get_liability_balance(
        &self,
        network_id: u32,
        token: Address,
    ) -> SourceResult<Option<U256>>;

    /// Blocks behind head; `Some(0)` is fully synced.
    async fn get_sync_distance(&self, rollup_id: u32) -> SourceResult<Option<u64>>;

    async fn query_bridge_events(&self, filter: EventFilter) -> SourceResult<Vec<BridgeEvent>>;

    async fn query_aggregated_flows(&self, chain_id: u32) -> SourceResult<Vec<FlowRow>>;

    async fn query_event_counts_by_network(
        &self,
        kind: EventKind,
    ) -> SourceResult<Vec<NetworkCount>>;
}
