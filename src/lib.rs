pub mod config;
pub mod error;
pub mod explorer;
pub mod fetch;
pub mod flows;
pub mod metadata;
pub mod numeric;
pub mod pagination;
pub mod query;
pub mod ranking;
pub mod reconcile;
pub mod repository;
pub mod source;
pub mod tally;
