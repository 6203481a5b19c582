pub mod balance_repository;
pub mod database;
pub mod event_repository;
pub mod models;
pub mod snapshot;
pub mod token_repository;

pub use balance_repository::{BalanceRepository, TokenTransfer};
pub use database::Database;
pub use event_repository::EventRepository;
pub use models::{
    BridgeEvent, EventFilter, EventKind, FlowRow, NetworkCount, Rollup, WrappedTokenMapping,
};
pub use snapshot::SnapshotSource;
pub use token_repository::{RollupRepository, WrappedTokenRepository};
