use alloy_primitives::{Address, U256};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Rollup {
    #[serde(rename = "rollup_id", default, deserialize_with = "null_as_default")]
    pub id: u32,
    #[serde(
        rename = "network_name",
        default = "unknown_network",
        deserialize_with = "network_name_or_unknown"
    )]
    pub name: String,
    #[serde(
        rename = "latest_bridge_synced_block",
        default,
        deserialize_with = "lenient_u64_or_zero"
    )]
    pub latest_synced_block: u64,
}

fn unknown_network() -> String {
    "Unknown Network".to_string()
}

/// One origin asset -> wrapped token relationship, as emitted by the
/// bridge's `NewWrappedToken` event on the destination rollup.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WrappedTokenMapping {
    #[serde(rename = "originNetwork", default, deserialize_with = "null_as_default")]
    pub origin_network: u32,
    #[serde(
        rename = "originTokenAddress",
        default,
        deserialize_with = "lenient_address"
    )]
    pub origin_token_address: Option<Address>,
    #[serde(
        rename = "wrappedTokenAddress",
        default,
        deserialize_with = "lenient_address"
    )]
    pub wrapped_token_address: Option<Address>,
    #[serde(rename = "rollup_id", default, deserialize_with = "null_as_default")]
    pub destination_rollup_id: u32,
    #[serde(default = "empty_metadata", deserialize_with = "metadata_or_empty")]
    pub metadata: String,
}

fn empty_metadata() -> String {
    "0x".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BridgeEvent {
    #[serde(rename = "originNetwork", default, deserialize_with = "lenient_u32")]
    pub origin_network: Option<u32>,
    #[serde(
        rename = "destinationNetwork",
        default,
        deserialize_with = "lenient_u32"
    )]
    pub destination_network: Option<u32>,
    #[serde(rename = "originAddress", default)]
    pub origin_address: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64_or_zero")]
    pub block_number: u64,
    #[serde(rename = "transaction_hash", default)]
    pub tx_hash: Option<String>,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: U256,
}

/// Pre-aggregated `(source, target, count)` row. Ids that are not numeric
/// deserialize to `None` and the row is skipped by the flow builder.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FlowRow {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub source: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub target: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u64_or_zero")]
    pub value: u64,
}

impl FlowRow {
    pub fn new(source: u32, target: u32, value: u64) -> Self {
        Self {
            source: Some(source),
            target: Some(target),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkCount {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub network: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u64_or_zero")]
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Bridge,
    Claim,
}

impl EventKind {
    pub fn table(&self) -> &'static str {
        match self {
            EventKind::Bridge => "bridge_events",
            EventKind::Claim => "claim_events",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Bridge => f.write_str("bridge"),
            EventKind::Claim => f.write_str("claim"),
        }
    }
}

/// Which bridge events to fetch: those touching `chain` (as origin or
/// destination), newest first, at most `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventFilter {
    pub chain: Option<u32>,
    pub limit: usize,
}

impl EventFilter {
    pub fn latest(limit: usize) -> Self {
        Self { chain: None, limit }
    }

    pub fn for_chain(chain: u32, limit: usize) -> Self {
        Self {
            chain: Some(chain),
            limit,
        }
    }
}

/// Nullable columns come back as explicit `null`; treat them like a
/// missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn network_name_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(unknown_network))
}

fn metadata_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(empty_metadata))
}

fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let parsed = value
        .as_ref()
        .and_then(value_to_u64)
        .and_then(|v| u32::try_from(v).ok());
    if parsed.is_none() && value.as_ref().is_some_and(|v| !v.is_null()) {
        debug!("Dropping non-numeric network id {:?}", value);
    }
    Ok(parsed)
}

fn lenient_u64_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_u64).unwrap_or(0))
}

fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let amount = match &value {
        Some(Value::String(s)) => crate::numeric::parse_amount(s).ok(),
        Some(Value::Number(n)) => n.as_u64().map(U256::from),
        _ => None,
    };
    Ok(amount.unwrap_or(U256::ZERO))
}

fn lenient_address<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Address>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| {
        let parsed = Address::from_str(s.trim()).ok();
        if parsed.is_none() && !s.trim().is_empty() {
            debug!("Dropping invalid address {:?}", s);
        }
        parsed
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrapped_token_from_backend_row() {
        let row = json!({
            "id": "abc",
            "rollup_id": 1,
            "originNetwork": 0,
            "originTokenAddress": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
            "wrappedTokenAddress": "0x37eaa0ef3549a5bb7d431be78a3d99bd360d19e5",
            "metadata": "0x"
        });
        let mapping: WrappedTokenMapping = serde_json::from_value(row).unwrap();
        assert_eq!(mapping.destination_rollup_id, 1);
        assert_eq!(mapping.origin_network, 0);
        assert!(mapping.origin_token_address.is_some());
        assert!(mapping.wrapped_token_address.is_some());
    }

    #[test]
    fn missing_or_null_addresses_are_none() {
        let mapping: WrappedTokenMapping =
            serde_json::from_value(json!({ "originTokenAddress": null, "rollup_id": 2 })).unwrap();
        assert_eq!(mapping.origin_token_address, None);
        assert_eq!(mapping.wrapped_token_address, None);
        assert_eq!(mapping.metadata, "0x");
    }

    #[test]
    fn null_columns_fall_back_to_defaults() {
        let mapping: WrappedTokenMapping = serde_json::from_value(json!({
            "rollup_id": null,
            "originNetwork": null,
            "originTokenAddress": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
            "wrappedTokenAddress": "0x37eaa0ef3549a5bb7d431be78a3d99bd360d19e5",
            "metadata": null
        }))
        .unwrap();
        assert_eq!(mapping.destination_rollup_id, 0);
        assert_eq!(mapping.origin_network, 0);
        assert_eq!(mapping.metadata, "0x");

        let rollup: Rollup = serde_json::from_value(json!({
            "rollup_id": 3,
            "network_name": null,
            "latest_bridge_synced_block": null
        }))
        .unwrap();
        assert_eq!(rollup.name, "Unknown Network");
        assert_eq!(rollup.latest_synced_block, 0);
    }

    #[test]
    fn flow_row_accepts_numeric_strings_and_drops_garbage() {
        let row: FlowRow =
            serde_json::from_value(json!({ "source": "3", "target": 4, "value": "9" })).unwrap();
        assert_eq!(row, FlowRow::new(3, 4, 9));

        let row: FlowRow =
            serde_json::from_value(json!({ "source": "abc", "target": 4, "value": 2 })).unwrap();
        assert_eq!(row.source, None);
        assert_eq!(row.target, Some(4));
    }

    #[test]
    fn bridge_event_amount_is_exact() {
        let event: BridgeEvent = serde_json::from_value(json!({
            "originNetwork": 0,
            "destinationNetwork": 1,
            "originAddress": "0xAbC",
            "block_number": 19000000,
            "transaction_hash": "0x01",
            "amount": "123456789012345678901234567890"
        }))
        .unwrap();
        assert_eq!(event.origin_network, Some(0));
        assert_eq!(event.destination_network, Some(1));
        assert_eq!(
            event.amount,
            U256::from_str("123456789012345678901234567890").unwrap()
        );
    }
}
