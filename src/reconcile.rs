use crate::metadata::TokenMetadata;
use crate::numeric::{Balance, SignedAmount, sum_balances};
use crate::repository::WrappedTokenMapping;
use alloy_primitives::{Address, U256};
use indexmap::IndexMap;
use tracing::{debug, warn};

pub const UNKNOWN_TOKEN: &str = "Unknown Token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiabilityEntry {
    pub wrapped_token_address: Option<Address>,
    pub origin_network: u32,
    pub destination_rollup_id: u32,
    /// `None` until fetched.
    pub balance: Option<Balance>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetGroup {
    pub key: String,
    pub token: Option<TokenMetadata>,
    pub origin_network: u32,
    pub origin_token_address: Option<Address>,
    /// `None` until fetched.
    pub asset_balance: Option<Balance>,
    pub liabilities: Vec<LiabilityEntry>,
}

impl AssetGroup {
    pub fn display_name(&self) -> String {
        match (&self.token, &self.origin_token_address) {
            (Some(token), _) => token.name.clone(),
            (None, Some(address)) => address.to_checksum(None),
            (None, None) => UNKNOWN_TOKEN.to_string(),
        }
    }

    pub fn liability_balances(&self) -> Vec<Balance> {
        self.liabilities
            .iter()
            .map(|entry| entry.balance.unwrap_or(Balance::Unavailable))
            .collect()
    }

    pub fn reconcile(&self) -> ReconciliationResult {
        reconcile(
            self,
            &self.asset_balance.unwrap_or(Balance::Unavailable),
            &self.liability_balances(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconciliationResult {
    pub asset_balance: U256,
    pub total_liability_balance: U256,
    pub deficit: SignedAmount,
}

impl ReconciliationResult {
    pub fn is_over_minted(&self) -> bool {
        self.deficit.is_negative()
    }
}

fn group_key(mapping: &WrappedTokenMapping) -> (String, Option<TokenMetadata>) {
    let Some(origin) = mapping.origin_token_address else {
        return (UNKNOWN_TOKEN.to_string(), None);
    };
    let origin = origin.to_checksum(None);

    match TokenMetadata::decode(&mapping.metadata) {
        Ok(token) => (format!("{} - {}", token.name, origin), Some(token)),
        Err(e) => {
            warn!("Failed to parse metadata for origin token {}: {}", origin, e);
            (origin, None)
        }
    }
}

/// Group mappings by origin asset, keeping first-seen order of groups and
/// of entries inside each group.
pub fn group_by_origin_asset(mappings: &[WrappedTokenMapping]) -> Vec<AssetGroup> {
    let mut groups: IndexMap<String, AssetGroup> = IndexMap::new();

    for mapping in mappings {
        let (key, token) = group_key(mapping);
        let entry = LiabilityEntry {
            wrapped_token_address: mapping.wrapped_token_address,
            origin_network: mapping.origin_network,
            destination_rollup_id: mapping.destination_rollup_id,
            balance: None,
        };

        groups
            .entry(key.clone())
            .or_insert_with(|| AssetGroup {
                key,
                token,
                origin_network: mapping.origin_network,
                origin_token_address: mapping.origin_token_address,
                asset_balance: None,
                liabilities: Vec::new(),
            })
            .liabilities
            .push(entry);
    }

    debug!(
        "Grouped {} wrapped tokens into {} assets",
        mappings.len(),
        groups.len()
    );
    groups.into_values().collect()
}

/// Compare an asset's locked balance with the sum of its liabilities.
/// Unavailable balances count as zero.
pub fn reconcile(
    group: &AssetGroup,
    asset_balance: &Balance,
    liability_balances: &[Balance],
) -> ReconciliationResult {
    if liability_balances.len() != group.liabilities.len() {
        debug!(
            "Reconciling {} with {} balances for {} liabilities",
            group.key,
            liability_balances.len(),
            group.liabilities.len()
        );
    }

    let asset_balance = asset_balance.amount_or_zero();
    let total_liability_balance = sum_balances(liability_balances);

    ReconciliationResult {
        asset_balance,
        total_liability_balance,
        deficit: SignedAmount::difference(asset_balance, total_liability_balance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";
    const WETH: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

    fn metadata(name: &str, symbol: &str) -> String {
        TokenMetadata {
            name: name.to_string(),
            symbol: symbol.to_string(),
        }
        .encode()
    }

    fn mapping(
        origin: Option<&str>,
        wrapped: u8,
        destination: u32,
        meta: String,
    ) -> WrappedTokenMapping {
        WrappedTokenMapping {
            origin_network: 0,
            origin_token_address: origin.map(|a| Address::from_str(a).unwrap()),
            wrapped_token_address: Some(Address::repeat_byte(wrapped)),
            destination_rollup_id: destination,
            metadata: meta,
        }
    }

    fn amount(v: u64) -> Balance {
        Balance::Amount(U256::from(v))
    }

    #[test]
    fn groups_by_origin_asset_in_first_seen_order() {
        let mappings = vec![
            mapping(Some(WETH), 1, 1, metadata("Wrapped Ether", "WETH")),
            mapping(Some(USDC), 2, 1, metadata("USD Coin", "USDC")),
            mapping(Some(WETH), 3, 3, metadata("Wrapped Ether", "WETH")),
            mapping(Some(USDC), 4, 8, metadata("USD Coin", "USDC")),
        ];

        let groups = group_by_origin_asset(&mappings);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, format!("Wrapped Ether - {WETH}"));
        assert_eq!(groups[1].key, format!("USD Coin - {USDC}"));
        assert_eq!(groups[0].display_name(), "Wrapped Ether");

        let destinations: Vec<u32> = groups[0]
            .liabilities
            .iter()
            .map(|l| l.destination_rollup_id)
            .collect();
        assert_eq!(destinations, vec![1, 3]);
        assert_eq!(
            groups[1].liabilities[1].wrapped_token_address,
            Some(Address::repeat_byte(4))
        );
    }

    #[test]
    fn entry_counts_sum_to_input_length() {
        let mappings = vec![
            mapping(Some(WETH), 1, 1, metadata("Wrapped Ether", "WETH")),
            mapping(None, 2, 1, "0x".to_string()),
            mapping(Some(USDC), 3, 2, "0xdead".to_string()),
            mapping(None, 4, 5, metadata("Orphan", "ORP")),
            mapping(Some(WETH), 5, 2, metadata("Wrapped Ether", "WETH")),
        ];
        let groups = group_by_origin_asset(&mappings);
        let total: usize = groups.iter().map(|g| g.liabilities.len()).sum();
        assert_eq!(total, mappings.len());
        assert!(groups.iter().all(|g| !g.liabilities.is_empty()));
    }

    #[test]
    fn undecodable_metadata_falls_back_to_origin_address() {
        let groups = group_by_origin_asset(&[mapping(Some(USDC), 1, 1, "0x12".to_string())]);
        assert_eq!(groups[0].key, USDC);
        assert_eq!(groups[0].token, None);
        assert_eq!(groups[0].display_name(), USDC);
    }

    #[test]
    fn missing_origin_address_groups_under_unknown_token() {
        let groups = group_by_origin_asset(&[
            mapping(None, 1, 1, metadata("A", "A")),
            mapping(None, 2, 2, "0x".to_string()),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].key, UNKNOWN_TOKEN);
        assert_eq!(groups[0].liabilities.len(), 2);
    }

    #[test]
    fn same_name_different_origin_stays_separate() {
        let groups = group_by_origin_asset(&[
            mapping(Some(USDC), 1, 1, metadata("Token", "TKN")),
            mapping(Some(WETH), 2, 1, metadata("Token", "TKN")),
        ]);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn reconcile_computes_surplus_and_deficit() {
        let groups = group_by_origin_asset(&[
            mapping(Some(WETH), 1, 1, metadata("Wrapped Ether", "WETH")),
            mapping(Some(WETH), 2, 2, metadata("Wrapped Ether", "WETH")),
        ]);
        let group = &groups[0];

        let result = reconcile(group, &amount(100), &[amount(30), amount(50)]);
        assert_eq!(result.total_liability_balance, U256::from(80u64));
        assert_eq!(result.deficit.to_string(), "20");
        assert!(!result.is_over_minted());

        let result = reconcile(group, &amount(60), &[amount(30), amount(50)]);
        assert_eq!(result.deficit.to_string(), "-20");
        assert!(result.is_over_minted());
    }

    #[test]
    fn reconcile_is_order_independent_and_skips_unavailable() {
        let groups = group_by_origin_asset(&[mapping(Some(WETH), 1, 1, "0x".to_string())]);
        let forward = [amount(7), Balance::Unavailable, amount(11), amount(13)];
        let mut backward = forward;
        backward.reverse();

        let a = reconcile(&groups[0], &amount(31), &forward);
        let b = reconcile(&groups[0], &amount(31), &backward);
        assert_eq!(a, b);
        assert_eq!(a.total_liability_balance, U256::from(31u64));
        assert_eq!(a.deficit, SignedAmount::ZERO);
    }

    #[test]
    fn unfetched_balances_reconcile_as_zero() {
        let groups = group_by_origin_asset(&[mapping(Some(WETH), 1, 1, "0x".to_string())]);
        let result = groups[0].reconcile();
        assert_eq!(result.asset_balance, U256::ZERO);
        assert_eq!(result.total_liability_balance, U256::ZERO);
    }

    #[test]
    fn huge_balances_stay_exact() {
        let groups = group_by_origin_asset(&[mapping(Some(WETH), 1, 1, "0x".to_string())]);
        let big = U256::from(10u64).pow(U256::from(30u64));
        let result = reconcile(
            &groups[0],
            &Balance::Amount(big),
            &[Balance::Amount(big + U256::from(1u64))],
        );
        assert!(result.is_over_minted());
        assert_eq!(result.deficit.magnitude(), U256::from(1u64));
    }
}
