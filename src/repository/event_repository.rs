use super::models::{BridgeEvent, EventFilter, EventKind, FlowRow, NetworkCount};
use crate::numeric::parse_amount;
use alloy_primitives::U256;
use rusqlite::{Result, Row, ToSql, params, params_from_iter};
use tracing::warn;

pub struct EventRepository<'a> {
    conn: &'a rusqlite::Connection,
}

impl<'a> EventRepository<'a> {
    const INSERT_BRIDGE_EVENT: &'static str = "INSERT INTO bridge_events (
            rollup_id, transaction_hash, block_number,
            originNetwork, originAddress, destinationNetwork, amount
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

    const INSERT_CLAIM_EVENT: &'static str = "INSERT INTO claim_events (
            rollup_id, transaction_hash, block_number, originNetwork, originAddress, amount
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

    const SELECT_BRIDGE_EVENT: &'static str = "SELECT originNetwork, destinationNetwork, \
         originAddress, block_number, transaction_hash, amount FROM bridge_events";

    // Both directions through the chain, counted per (source, target) pair
    const SELECT_FLOWS: &'static str = "WITH flows AS (
            SELECT rollup_id AS source, destinationNetwork AS target
            FROM bridge_events WHERE rollup_id = ?1
            UNION ALL
            SELECT rollup_id AS source, destinationNetwork AS target
            FROM bridge_events WHERE destinationNetwork = ?1
        )
        SELECT source, target, COUNT(*) AS value FROM flows
        GROUP BY source, target ORDER BY value DESC";

    pub fn new(conn: &'a rusqlite::Connection) -> Self {
        Self { conn }
    }

    pub fn insert_bridge_events(&self, rollup_id: u32, events: &[BridgeEvent]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut count = 0;

        {
            let mut stmt = tx.prepare(Self::INSERT_BRIDGE_EVENT)?;
            for event in events {
                count += stmt.execute(params![
                    rollup_id,
                    event.tx_hash,
                    event.block_number,
                    event.origin_network,
                    event.origin_address,
                    event.destination_network,
                    event.amount.to_string(),
                ])?;
            }
        }

        tx.commit()?;
        Ok(count)
    }

    /// Claims only keep the origin side; the destination is `rollup_id`.
    pub fn insert_claim_event(&self, rollup_id: u32, event: &BridgeEvent) -> Result<()> {
        self.conn.execute(
            Self::INSERT_CLAIM_EVENT,
            params![
                rollup_id,
                event.tx_hash,
                event.block_number,
                event.origin_network,
                event.origin_address,
                event.amount.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Newest first.
    pub fn query_bridge_events(&self, filter: EventFilter) -> Result<Vec<BridgeEvent>> {
        let mut sql = Self::SELECT_BRIDGE_EVENT.to_string();
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(chain) = filter.chain {
            sql.push_str(" WHERE originNetwork = ?1 OR destinationNetwork = ?1");
            params.push(Box::new(chain));
        }
        sql.push_str(&format!(
            " ORDER BY block_number DESC LIMIT ?{}",
            params.len() + 1
        ));
        params.push(Box::new(filter.limit));

        let mut stmt = self.conn.prepare(&sql)?;
        let events = stmt
            .query_map(params_from_iter(params.iter()), Self::row_to_event)?
            .collect::<Result<Vec<_>>>()?;
        Ok(events)
    }

    pub fn aggregated_flows(&self, chain_id: u32) -> Result<Vec<FlowRow>> {
        let mut stmt = self.conn.prepare(Self::SELECT_FLOWS)?;
        let rows = stmt
            .query_map(params![chain_id], |row| {
                Ok(FlowRow {
                    source: network_id(row, 0)?,
                    target: network_id(row, 1)?,
                    value: row.get::<_, i64>(2)?.max(0) as u64,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn counts_by_network(&self, kind: EventKind) -> Result<Vec<NetworkCount>> {
        let sql = format!(
            "SELECT rollup_id AS network, COUNT(*) AS count FROM {}
             GROUP BY rollup_id ORDER BY count DESC",
            kind.table()
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(NetworkCount {
                    network: network_id(row, 0)?,
                    count: row.get::<_, i64>(1)?.max(0) as u64,
                })
            })?
            .collect::<Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn row_to_event(row: &Row) -> Result<BridgeEvent> {
        let amount: Option<String> = row.get(5)?;
        let amount = match amount.as_deref().map(parse_amount) {
            Some(Ok(amount)) => amount,
            Some(Err(e)) => {
                warn!("Treating unparseable bridge amount as zero: {}", e);
                U256::ZERO
            }
            None => U256::ZERO,
        };

        Ok(BridgeEvent {
            origin_network: network_id(row, 0)?,
            destination_network: network_id(row, 1)?,
            origin_address: row.get(2)?,
            block_number: row.get::<_, i64>(3)?.max(0) as u64,
            tx_hash: row.get(4)?,
            amount,
        })
    }
}

/// Nullable network id column; out-of-range values read as missing.
fn network_id(row: &Row, idx: usize) -> Result<Option<u32>> {
    let raw: Option<i64> = row.get(idx)?;
    Ok(raw.and_then(|id| u32::try_from(id).ok()))
}
