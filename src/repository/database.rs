use anyhow::{Context, Result};
use rusqlite::Connection;

/// Local snapshot of the bridge indexer's tables.
pub struct Database {
    pub conn: Connection,
}

impl Database {
    pub fn new(db_path: &str) -> Result<Self> {
        let db_path = db_path.strip_prefix("sqlite:").unwrap_or(db_path);
        let conn = Connection::open(db_path).context("Failed to open database")?;

        let db = Database { conn };
        db.create_tables()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;

        let db = Database { conn };
        db.create_tables()?;
        Ok(db)
    }

    fn create_tables(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS rollups (
                rollup_id INTEGER PRIMARY KEY,
                network_name TEXT,
                latest_bridge_synced_block INTEGER
            )",
            [],
        )?;

        // One row per NewWrappedToken event on the destination rollup
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS new_wrapped_token_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rollup_id INTEGER NOT NULL,
                originNetwork INTEGER NOT NULL,
                originTokenAddress TEXT,
                wrappedTokenAddress TEXT,
                metadata TEXT
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS bridge_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rollup_id INTEGER NOT NULL,
                transaction_hash TEXT,
                block_number INTEGER NOT NULL,
                originNetwork INTEGER,
                originAddress TEXT,
                destinationNetwork INTEGER,
                amount TEXT
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS claim_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rollup_id INTEGER NOT NULL,
                transaction_hash TEXT,
                block_number INTEGER NOT NULL,
                originNetwork INTEGER,
                originAddress TEXT,
                amount TEXT
            )",
            [],
        )?;

        // ERC20 transfers touching the bridge contract, per rollup
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS bridge_transfer_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rollup_id INTEGER NOT NULL,
                token_address TEXT NOT NULL,
                from_address TEXT NOT NULL,
                to_address TEXT NOT NULL,
                value TEXT NOT NULL,
                block_number INTEGER NOT NULL
            )",
            [],
        )?;

        // Transfers of wrapped tokens; mints come from and burns go to 0x0
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS wrapped_transfer_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rollup_id INTEGER NOT NULL,
                token_address TEXT NOT NULL,
                from_address TEXT NOT NULL,
                to_address TEXT NOT NULL,
                value TEXT NOT NULL,
                block_number INTEGER NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_bridge_events_block_number
             ON bridge_events(block_number)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_wrapped_tokens_origin
             ON new_wrapped_token_events(originNetwork)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_bridge_transfers_token
             ON bridge_transfer_events(rollup_id, token_address)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_wrapped_transfers_token
             ON wrapped_transfer_events(rollup_id, token_address)",
            [],
        )?;

        Ok(())
    }
}
