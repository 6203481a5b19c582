use super::{BridgeDataSource, SourceResult};
use crate::repository::{
    BridgeEvent, EventFilter, EventKind, FlowRow, NetworkCount, Rollup, WrappedTokenMapping,
};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

/// `(key, ttl) -> value | recompute`. Only successful results are stored.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, (Instant, V)>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, recompute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if self.ttl.is_zero() {
            return recompute().await;
        }

        if let Some((stored_at, value)) = self.entries.lock().await.get(&key) {
            if stored_at.elapsed() < self.ttl {
                return Ok(value.clone());
            }
        }

        let value = recompute().await?;
        self.entries
            .lock()
            .await
            .insert(key, (Instant::now(), value.clone()));
        Ok(value)
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

/// Wraps any source with per-operation TTL caches.
pub struct CachedSource<S> {
    inner: S,
    rollups: TtlCache<(), Vec<Rollup>>,
    wrapped_tokens: TtlCache<u32, Vec<WrappedTokenMapping>>,
    asset_balances: TtlCache<(u32, Address), Option<U256>>,
    liability_balances: TtlCache<(u32, Address), Option<U256>>,
    sync_distances: TtlCache<u32, Option<u64>>,
    events: TtlCache<EventFilter, Vec<BridgeEvent>>,
    flows: TtlCache<u32, Vec<FlowRow>>,
    counts: TtlCache<EventKind, Vec<NetworkCount>>,
}

impl<S: BridgeDataSource> CachedSource<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            rollups: TtlCache::new(ttl),
            wrapped_tokens: TtlCache::new(ttl),
            asset_balances: TtlCache::new(ttl),
            liability_balances: TtlCache::new(ttl),
            sync_distances: TtlCache::new(ttl),
            events: TtlCache::new(ttl),
            flows: TtlCache::new(ttl),
            counts: TtlCache::new(ttl),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop everything so the next call hits the backend.
    pub async fn clear(&self) {
        self.rollups.clear().await;
        self.wrapped_tokens.clear().await;
        self.asset_balances.clear().await;
        self.liability_balances.clear().await;
        self.sync_distances.clear().await;
        self.events.clear().await;
        self.flows.clear().await;
        self.counts.clear().await;
        debug!("Retrieval cache cleared");
    }
}

#[async_trait]
impl<S: BridgeDataSource> BridgeDataSource for CachedSource<S> {
    async fn list_rollups(&self) -> SourceResult<Vec<Rollup>> {
        self.rollups
            .get_or_try_insert_with((), || self.inner.list_rollups())
            .await
    }

    async fn list_wrapped_tokens(
        &self,
        origin_network: u32,
    ) -> SourceResult<Vec<WrappedTokenMapping>> {
        self.wrapped_tokens
            .get_or_try_insert_with(origin_network, || {
                self.inner.list_wrapped_tokens(origin_network)
            })
            .await
    }

    async fn get_asset_balance(
        &self,
        network_id: u32,
        token: Address,
    ) -> SourceResult<Option<U256>> {
        self.asset_balances
            .get_or_try_insert_with((network_id, token), || {
                self.inner.get_asset_balance(network_id, token)
            })
            .await
    }

    async fn get_liability_balance(
        &self,
        network_id: u32,
        token: Address,
    ) -> SourceResult<Option<U256>> {
        self.liability_balances
            .get_or_try_insert_with((network_id, token), || {
                self.inner.get_liability_balance(network_id, token)
            })
            .await
    }

    async fn get_sync_distance(&self, rollup_id: u32) -> SourceResult<Option<u64>> {
        self.sync_distances
            .get_or_try_insert_with(rollup_id, || self.inner.get_sync_distance(rollup_id))
            .await
    }

    async fn query_bridge_events(&self, filter: EventFilter) -> SourceResult<Vec<BridgeEvent>> {
        self.events
            .get_or_try_insert_with(filter, || self.inner.query_bridge_events(filter))
            .await
    }

    async fn query_aggregated_flows(&self, chain_id: u32) -> SourceResult<Vec<FlowRow>> {
        self.flows
            .get_or_try_insert_with(chain_id, || self.inner.query_aggregated_flows(chain_id))
            .await
    }

    async fn query_event_counts_by_network(
        &self,
        kind: EventKind,
    ) -> SourceResult<Vec<NetworkCount>> {
        self.counts
            .get_or_try_insert_with(kind, || self.inner.query_event_counts_by_network(kind))
            .await
    }
}
