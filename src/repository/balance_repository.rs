use crate::numeric::parse_amount;
use alloy_primitives::{Address, U256};
use rusqlite::{Connection, Result, params};
use tracing::warn;

/// One ERC20 `Transfer` log as stored in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    pub rollup_id: u32,
    pub token_address: Address,
    pub from_address: Address,
    pub to_address: Address,
    pub value: U256,
    pub block_number: u64,
}

/// Derives bridge-locked and wrapped-supply balances from transfer logs.
/// Values are TEXT in the database and summed here as 256-bit integers.
pub struct BalanceRepository<'a> {
    conn: &'a Connection,
    bridge_address: Address,
}

impl<'a> BalanceRepository<'a> {
    const INSERT_BRIDGE_TRANSFER: &'static str = "INSERT INTO bridge_transfer_events
         (rollup_id, token_address, from_address, to_address, value, block_number)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

    const INSERT_WRAPPED_TRANSFER: &'static str = "INSERT INTO wrapped_transfer_events
         (rollup_id, token_address, from_address, to_address, value, block_number)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

    const SELECT_BRIDGE_INCOMING: &'static str = "SELECT value FROM bridge_transfer_events
         WHERE rollup_id = ?1 AND LOWER(token_address) = ?2 AND LOWER(to_address) = ?3";

    const SELECT_BRIDGE_OUTGOING: &'static str = "SELECT value FROM bridge_transfer_events
         WHERE rollup_id = ?1 AND LOWER(token_address) = ?2 AND LOWER(from_address) = ?3";

    const SELECT_MINTED: &'static str = "SELECT value FROM wrapped_transfer_events
         WHERE rollup_id = ?1 AND LOWER(token_address) = ?2 AND LOWER(from_address) = ?3";

    const SELECT_BURNED: &'static str = "SELECT value FROM wrapped_transfer_events
         WHERE rollup_id = ?1 AND LOWER(token_address) = ?2 AND LOWER(to_address) = ?3";

    const SELECT_TOKEN_SEEN: &'static str = "SELECT EXISTS(
         SELECT 1 FROM bridge_transfer_events WHERE rollup_id = ?1 AND LOWER(token_address) = ?2
         UNION ALL
         SELECT 1 FROM wrapped_transfer_events WHERE rollup_id = ?1 AND LOWER(token_address) = ?2)";

    pub fn new(conn: &'a Connection, bridge_address: Address) -> Self {
        Self {
            conn,
            bridge_address,
        }
    }

    pub fn insert_bridge_transfer(&self, transfer: &TokenTransfer) -> Result<()> {
        self.insert(Self::INSERT_BRIDGE_TRANSFER, transfer)
    }

    pub fn insert_wrapped_transfer(&self, transfer: &TokenTransfer) -> Result<()> {
        self.insert(Self::INSERT_WRAPPED_TRANSFER, transfer)
    }

    fn insert(&self, sql: &str, transfer: &TokenTransfer) -> Result<()> {
        self.conn.execute(
            sql,
            params![
                transfer.rollup_id,
                format!("{:?}", transfer.token_address),
                format!("{:?}", transfer.from_address),
                format!("{:?}", transfer.to_address),
                transfer.value.to_string(),
                transfer.block_number,
            ],
        )?;
        Ok(())
    }

    /// Transfers into the bridge minus transfers out of it. `None` when the
    /// snapshot has no transfers of `token` on `network_id`.
    pub fn asset_balance(&self, network_id: u32, token: &Address) -> Result<Option<U256>> {
        if !self.token_seen(network_id, token)? {
            return Ok(None);
        }
        let bridge = self.bridge_address;
        let incoming = self.sum_values(Self::SELECT_BRIDGE_INCOMING, network_id, token, &bridge)?;
        let outgoing = self.sum_values(Self::SELECT_BRIDGE_OUTGOING, network_id, token, &bridge)?;
        Ok(Some(incoming.saturating_sub(outgoing)))
    }

    /// Mints from the zero address minus burns to it.
    pub fn liability_balance(&self, network_id: u32, token: &Address) -> Result<Option<U256>> {
        if !self.token_seen(network_id, token)? {
            return Ok(None);
        }
        let zero = Address::ZERO;
        let minted = self.sum_values(Self::SELECT_MINTED, network_id, token, &zero)?;
        let burned = self.sum_values(Self::SELECT_BURNED, network_id, token, &zero)?;
        Ok(Some(minted.saturating_sub(burned)))
    }

    fn token_seen(&self, network_id: u32, token: &Address) -> Result<bool> {
        self.conn.query_row(
            Self::SELECT_TOKEN_SEEN,
            params![network_id, format!("{token:?}")],
            |row| row.get(0),
        )
    }

    fn sum_values(
        &self,
        sql: &str,
        network_id: u32,
        token: &Address,
        counterparty: &Address,
    ) -> Result<U256> {
        let mut stmt = self.conn.prepare(sql)?;
        let values = stmt
            .query_map(
                params![network_id, format!("{token:?}"), format!("{counterparty:?}")],
                |row| row.get::<_, String>(0),
            )?
            .collect::<Result<Vec<_>>>()?;

        let mut total = U256::ZERO;
        for value in values {
            match parse_amount(&value) {
                Ok(amount) => total = total.saturating_add(amount),
                Err(e) => warn!("Skipping transfer of {:?}: {}", token, e),
            }
        }
        Ok(total)
    }
}
