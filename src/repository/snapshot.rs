use super::{
    BalanceRepository, BridgeEvent, Database, EventFilter, EventKind, EventRepository, FlowRow,
    NetworkCount, Rollup, RollupRepository, WrappedTokenMapping, WrappedTokenRepository,
};
use crate::error::RetrievalError;
use crate::source::{BridgeDataSource, SourceResult};
use alloy_primitives::{Address, U256};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

/// Serves the retrieval operations from a local SQLite snapshot.
pub struct SnapshotSource {
    db: Mutex<Database>,
    bridge_address: Address,
}

impl SnapshotSource {
    pub fn open(database_url: &str, bridge_address: Address) -> Result<Self> {
        info!("Opening snapshot database {}", database_url);
        Ok(Self::new(Database::new(database_url)?, bridge_address))
    }

    pub fn new(db: Database, bridge_address: Address) -> Self {
        Self {
            db: Mutex::new(db),
            bridge_address,
        }
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> rusqlite::Result<T>) -> SourceResult<T> {
        let db = self
            .db
            .lock()
            .map_err(|_| RetrievalError::Backend("snapshot database lock poisoned".to_string()))?;
        Ok(f(&db)?)
    }
}

#[async_trait]
impl BridgeDataSource for SnapshotSource {
    async fn list_rollups(&self) -> SourceResult<Vec<Rollup>> {
        self.with_db(|db| RollupRepository::new(&db.conn).list())
    }

    async fn list_wrapped_tokens(
        &self,
        origin_network: u32,
    ) -> SourceResult<Vec<WrappedTokenMapping>> {
        self.with_db(|db| {
            WrappedTokenRepository::new(&db.conn).list_by_origin_network(origin_network)
        })
    }

    async fn get_asset_balance(
        &self,
        network_id: u32,
        token: Address,
    ) -> SourceResult<Option<U256>> {
        self.with_db(|db| {
            BalanceRepository::new(&db.conn, self.bridge_address).asset_balance(network_id, &token)
        })
    }

    async fn get_liability_balance(
        &self,
        network_id: u32,
        token: Address,
    ) -> SourceResult<Option<U256>> {
        self.with_db(|db| {
            BalanceRepository::new(&db.conn, self.bridge_address)
                .liability_balance(network_id, &token)
        })
    }

    /// A snapshot has no live chain head to compare against.
    async fn get_sync_distance(&self, _rollup_id: u32) -> SourceResult<Option<u64>> {
        Ok(None)
    }

    async fn query_bridge_events(&self, filter: EventFilter) -> SourceResult<Vec<BridgeEvent>> {
        self.with_db(|db| EventRepository::new(&db.conn).query_bridge_events(filter))
    }

    async fn query_aggregated_flows(&self, chain_id: u32) -> SourceResult<Vec<FlowRow>> {
        self.with_db(|db| EventRepository::new(&db.conn).aggregated_flows(chain_id))
    }

    async fn query_event_counts_by_network(
        &self,
        kind: EventKind,
    ) -> SourceResult<Vec<NetworkCount>> {
        self.with_db(|db| EventRepository::new(&db.conn).counts_by_network(kind))
    }
}
