use crate::numeric::Balance;
use crate::reconcile::AssetGroup;
use crate::repository::Rollup;
use crate::source::{BridgeDataSource, SourceResult};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub concurrency: usize,
    pub timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            concurrency: 8,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Synced,
    Behind(u64),
    Unreachable,
}

impl From<Option<u64>> for SyncState {
    fn from(distance: Option<u64>) -> Self {
        match distance {
            Some(0) => SyncState::Synced,
            Some(distance) => SyncState::Behind(distance),
            None => SyncState::Unreachable,
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Synced => f.write_str("Synced"),
            SyncState::Behind(distance) => write!(f, "Distance from head: {distance}"),
            SyncState::Unreachable => f.write_str("Could not sync. Endpoint down"),
        }
    }
}

/// Runs `call` with the per-call timeout. Errors and timeouts become `None`.
async fn bounded<T, Fut>(label: &str, limit: Duration, call: Fut) -> Option<T>
where
    Fut: Future<Output = SourceResult<T>>,
{
    match timeout(limit, call).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            warn!("{} failed: {}", label, e);
            None
        }
        Err(_) => {
            warn!("{} timed out after {:?}", label, limit);
            None
        }
    }
}

/// Sync state of every rollup, in the order the rollups were given.
pub async fn fetch_sync_states<S>(
    source: &S,
    rollups: &[Rollup],
    opts: FetchOptions,
) -> Vec<(Rollup, SyncState)>
where
    S: BridgeDataSource + ?Sized,
{
    let results: HashMap<u32, SyncState> = stream::iter(rollups.iter().map(|r| r.id))
        .map(|id| async move {
            let distance = bounded(
                &format!("Sync lookup for rollup {id}"),
                opts.timeout,
                source.get_sync_distance(id),
            )
            .await
            .flatten();
            (id, SyncState::from(distance))
        })
        .buffer_unordered(opts.concurrency.max(1))
        .collect()
        .await;

    rollups
        .iter()
        .map(|rollup| {
            let state = results
                .get(&rollup.id)
                .copied()
                .unwrap_or(SyncState::Unreachable);
            (rollup.clone(), state)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum BalanceKey {
    Asset(usize),
    Liability(usize, usize),
}

/// Fills in the asset and liability balances of `groups`. Only pass the
/// visible page: one lookup is issued per balance.
pub async fn fetch_page_balances<S>(
    source: &S,
    mut groups: Vec<AssetGroup>,
    opts: FetchOptions,
) -> Vec<AssetGroup>
where
    S: BridgeDataSource + ?Sized,
{
    let mut lookups = Vec::new();
    for (g, group) in groups.iter().enumerate() {
        if let Some(token) = group.origin_token_address {
            lookups.push((BalanceKey::Asset(g), group.origin_network, token));
        }
        for (l, entry) in group.liabilities.iter().enumerate() {
            if let Some(token) = entry.wrapped_token_address {
                lookups.push((
                    BalanceKey::Liability(g, l),
                    entry.destination_rollup_id,
                    token,
                ));
            }
        }
    }
    debug!(
        "Fetching {} balances for {} assets",
        lookups.len(),
        groups.len()
    );

    let results: HashMap<BalanceKey, Balance> = stream::iter(lookups)
        .map(|(key, network, token)| async move {
            let amount = match key {
                BalanceKey::Asset(_) => {
                    bounded(
                        &format!("Asset balance of {token:?} on {network}"),
                        opts.timeout,
                        source.get_asset_balance(network, token),
                    )
                    .await
                }
                BalanceKey::Liability(..) => {
                    bounded(
                        &format!("Liability balance of {token:?} on {network}"),
                        opts.timeout,
                        source.get_liability_balance(network, token),
                    )
                    .await
                }
            };
            (key, Balance::from(amount.flatten()))
        })
        .buffer_unordered(opts.concurrency.max(1))
        .collect()
        .await;

    for (g, group) in groups.iter_mut().enumerate() {
        group.asset_balance = Some(
            results
                .get(&BalanceKey::Asset(g))
                .copied()
                .unwrap_or(Balance::Unavailable),
        );
        for (l, entry) in group.liabilities.iter_mut().enumerate() {
            entry.balance = Some(
                results
                    .get(&BalanceKey::Liability(g, l))
                    .copied()
                    .unwrap_or(Balance::Unavailable),
            );
        }
    }
    groups
}

/// A failed list lookup renders as an empty list.
pub async fn load_or_empty<T, Fut>(label: &str, call: Fut) -> Vec<T>
where
    Fut: Future<Output = SourceResult<Vec<T>>>,
{
    match call.await {
        Ok(items) => items,
        Err(e) => {
            warn!("Could not load {}: {}", label, e);
            Vec::new()
        }
    }
}
