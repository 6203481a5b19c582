use super::models::{Rollup, WrappedTokenMapping};
use alloy_primitives::Address;
use rusqlite::{Result, Row, params};
use std::str::FromStr;

pub struct RollupRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> RollupRepository<'a> {
    const UPSERT_ROLLUP: &'static str = "INSERT OR REPLACE INTO rollups
         (rollup_id, network_name, latest_bridge_synced_block) VALUES (?1, ?2, ?3)";

    const SELECT_ROLLUPS: &'static str = "SELECT rollup_id, network_name,
         latest_bridge_synced_block FROM rollups ORDER BY rollup_id";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn upsert(&self, rollup: &Rollup) -> Result<()> {
        self.conn.execute(
            Self::UPSERT_ROLLUP,
            params![rollup.id, rollup.name, rollup.latest_synced_block],
        )?;
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<Rollup>> {
        let mut stmt = self.conn.prepare(Self::SELECT_ROLLUPS)?;
        let rollups = stmt
            .query_map([], |row| {
                Ok(Rollup {
                    id: row.get(0)?,
                    name: row
                        .get::<_, Option<String>>(1)?
                        .unwrap_or_else(|| "Unknown Network".to_string()),
                    latest_synced_block: row
                        .get::<_, Option<i64>>(2)?
                        .and_then(|b| u64::try_from(b).ok())
                        .unwrap_or(0),
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(rollups)
    }
}

pub struct WrappedTokenRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> WrappedTokenRepository<'a> {
    const INSERT_MAPPING: &'static str = "INSERT INTO new_wrapped_token_events
         (rollup_id, originNetwork, originTokenAddress, wrappedTokenAddress, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5)";

    const SELECT_BY_ORIGIN_NETWORK: &'static str = "SELECT rollup_id, originNetwork,
         originTokenAddress, wrappedTokenAddress, metadata
         FROM new_wrapped_token_events WHERE originNetwork = ?1 ORDER BY id";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, mapping: &WrappedTokenMapping) -> Result<()> {
        self.conn.execute(
            Self::INSERT_MAPPING,
            params![
                mapping.destination_rollup_id,
                mapping.origin_network,
                mapping.origin_token_address.map(|a| format!("{a:?}")),
                mapping.wrapped_token_address.map(|a| format!("{a:?}")),
                mapping.metadata,
            ],
        )?;
        Ok(())
    }

    /// Insertion order is the order the indexer saw the events in.
    pub fn list_by_origin_network(&self, origin_network: u32) -> Result<Vec<WrappedTokenMapping>> {
        let mut stmt = self.conn.prepare(Self::SELECT_BY_ORIGIN_NETWORK)?;
        let mappings = stmt
            .query_map(params![origin_network], Self::row_to_mapping)?
            .collect::<Result<Vec<_>>>()?;
        Ok(mappings)
    }

    fn row_to_mapping(row: &Row) -> Result<WrappedTokenMapping> {
        Ok(WrappedTokenMapping {
            destination_rollup_id: row.get(0)?,
            origin_network: row.get(1)?,
            origin_token_address: parse_address(row.get(2)?),
            wrapped_token_address: parse_address(row.get(3)?),
            metadata: row
                .get::<_, Option<String>>(4)?
                .unwrap_or_else(|| "0x".to_string()),
        })
    }
}

fn parse_address(raw: Option<String>) -> Option<Address> {
    raw.and_then(|s| Address::from_str(s.trim()).ok())
}
