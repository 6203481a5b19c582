use super::{BridgeDataSource, SourceResult};
use crate::error::RetrievalError;
use crate::numeric::parse_amount;
use crate::repository::{
    BridgeEvent, EventFilter, EventKind, FlowRow, NetworkCount, Rollup, WrappedTokenMapping,
};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tokio_retry::RetryIf;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tracing::{debug, warn};

/// Talks to the bridge indexer's HTTP API.
#[derive(Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

pub const MAX_RETRIES: usize = 3;

fn backoff() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(100)
        .factor(2)
        .max_delay(Duration::from_secs(5))
        .take(MAX_RETRIES)
}

/// Worst-case wall time of one call: every attempt timing out plus the
/// longest backoff between them.
pub fn retry_budget(request_timeout: Duration) -> Duration {
    request_timeout * (MAX_RETRIES as u32 + 1) + backoff().sum::<Duration>()
}

impl HttpSource {
    const ROLLUPS_PATH: &'static str = "/table/rollups";
    const WRAPPED_TOKENS_PATH: &'static str = "/table/new_wrapped_token_events/filter";
    const ASSET_BALANCE_PATH: &'static str = "/bridge_balance";
    const LIABILITY_BALANCE_PATH: &'static str = "/wrapped_balance";
    const SYNC_PATH: &'static str = "/sync";
    const QUERY_PATH: &'static str = "/query";

    const EVENT_COLUMNS: &'static str = "SELECT originNetwork, destinationNetwork, originAddress, \
         block_number, transaction_hash, amount FROM bridge_events";

    pub fn new(base_url: &str, request_timeout: Duration) -> SourceResult<Self> {
        let client = reqwest::Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout,
        })
    }

    async fn get_once(&self, url: &str, query: &[(&str, String)]) -> SourceResult<Value> {
        let request = async {
            let response = self.client.get(url).query(query).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(RetrievalError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            Ok::<Value, RetrievalError>(response.json().await?)
        };

        match timeout(self.request_timeout, request).await {
            Ok(Ok(body)) => match body.get("error").and_then(Value::as_str) {
                Some(message) => Err(RetrievalError::Backend(message.to_string())),
                None => Ok(body),
            },
            Ok(Err(e)) => {
                warn!("Request to {} failed: {}", url, e);
                Err(e)
            }
            Err(_) => {
                warn!(
                    "Request timeout after {} seconds on {}",
                    self.request_timeout.as_secs(),
                    url
                );
                Err(RetrievalError::Timeout {
                    secs: self.request_timeout.as_secs(),
                })
            }
        }
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> SourceResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        let url = url.as_str();
        RetryIf::spawn(
            backoff().map(jitter),
            move || self.get_once(url, query),
            RetrievalError::is_transient,
        )
        .await
    }

    async fn run_sql<T: DeserializeOwned>(&self, sql: String) -> SourceResult<Vec<T>> {
        debug!("Running backend query: {}", sql);
        let body = self.get_json(Self::QUERY_PATH, &[("q", sql)]).await?;
        Ok(typed_rows(body))
    }

    async fn get_balance(
        &self,
        path: &str,
        field: &str,
        network_id: u32,
        token: Address,
    ) -> SourceResult<Option<U256>> {
        let query = [
            ("rollup_id", network_id.to_string()),
            ("token_address", format!("{token:?}")),
        ];
        let body = self.get_json(path, &query).await?;

        let raw = match body.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => return Ok(None),
        };
        match parse_amount(&raw) {
            Ok(amount) => Ok(Some(amount)),
            Err(e) => {
                warn!("Backend balance for {:?} on {}: {}", token, network_id, e);
                Ok(None)
            }
        }
    }
}

/// Rows from either a bare JSON array or `{"data": [...]}`. Rows that do
/// not fit `T` are dropped.
fn typed_rows<T: DeserializeOwned>(body: Value) -> Vec<T> {
    let rows = match body {
        Value::Array(rows) => rows,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(rows)) => rows,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(row) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Skipping malformed backend row: {}", e);
                None
            }
        })
        .collect()
}

fn event_query(filter: EventFilter) -> String {
    match filter.chain {
        Some(chain) => format!(
            "{} WHERE originNetwork = {chain} OR destinationNetwork = {chain} \
             ORDER BY block_number DESC LIMIT {}",
            HttpSource::EVENT_COLUMNS,
            filter.limit
        ),
        None => format!(
            "{} ORDER BY block_number DESC LIMIT {}",
            HttpSource::EVENT_COLUMNS,
            filter.limit
        ),
    }
}

fn flow_query(chain_id: u32) -> String {
    format!(
        "WITH flows AS ( \
         SELECT rollup_id AS source, destinationNetwork AS target FROM bridge_events \
         WHERE rollup_id = {chain_id} \
         UNION ALL \
         SELECT rollup_id AS source, destinationNetwork AS target FROM bridge_events \
         WHERE destinationNetwork = {chain_id}) \
         SELECT source, target, COUNT(*) AS value FROM flows \
         GROUP BY source, target ORDER BY value DESC"
    )
}

fn count_query(kind: EventKind) -> String {
    format!(
        "SELECT rollup_id AS network, COUNT(*) AS count FROM {} \
         GROUP BY rollup_id ORDER BY count DESC",
        kind.table()
    )
}

#[async_trait]
impl BridgeDataSource for HttpSource {
    async fn list_rollups(&self) -> SourceResult<Vec<Rollup>> {
        let body = self.get_json(Self::ROLLUPS_PATH, &[]).await?;
        Ok(typed_rows(body))
    }

    async fn list_wrapped_tokens(
        &self,
        origin_network: u32,
    ) -> SourceResult<Vec<WrappedTokenMapping>> {
        let query = [("originNetwork", origin_network.to_string())];
        let body = self.get_json(Self::WRAPPED_TOKENS_PATH, &query).await?;
        Ok(typed_rows(body))
    }

    async fn get_asset_balance(
        &self,
        network_id: u32,
        token: Address,
    ) -> SourceResult<Option<U256>> {
        self.get_balance(Self::ASSET_BALANCE_PATH, "balance_bridge", network_id, token)
            .await
    }

    async fn get_liability_balance(
        &self,
        network_id: u32,
        token: Address,
    ) -> SourceResult<Option<U256>> {
        self.get_balance(
            Self::LIABILITY_BALANCE_PATH,
            "circulating_supply",
            network_id,
            token,
        )
        .await
    }

    async fn get_sync_distance(&self, rollup_id: u32) -> SourceResult<Option<u64>> {
        let path = format!("{}/{rollup_id}", Self::SYNC_PATH);
        let body = self.get_json(&path, &[]).await?;
        Ok(body.get("distance").and_then(Value::as_u64))
    }

    async fn query_bridge_events(&self, filter: EventFilter) -> SourceResult<Vec<BridgeEvent>> {
        self.run_sql(event_query(filter)).await
    }

    async fn query_aggregated_flows(&self, chain_id: u32) -> SourceResult<Vec<FlowRow>> {
        self.run_sql(flow_query(chain_id)).await
    }

    async fn query_event_counts_by_network(
        &self,
        kind: EventKind,
    ) -> SourceResult<Vec<NetworkCount>> {
        self.run_sql(count_query(kind)).await
    }
}
