use alloy_primitives::Address;
use std::collections::HashMap;

/// Block-explorer base URL per network id. Static configuration handed to
/// the presentation layer; networks without an entry get no link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerTable {
    bases: HashMap<u32, String>,
}

const KNOWN_EXPLORERS: &[(u32, &str)] = &[
    (0, "https://etherscan.io"),
    (1, "https://zkevm.polygonscan.com"),
    (2, "https://astar-zkevm.explorer.startale.com"),
    (3, "https://web3.okx.com/en-eu/explorer/xlayer"),
    (4, "https://oev.explorer.api3.org"),
    (6, "https://witnesschain-blockscout.eu-north-2.gateway.fm"),
    (8, "https://blockscout.wirexpaychain.com"),
];

impl Default for ExplorerTable {
    fn default() -> Self {
        Self {
            bases: KNOWN_EXPLORERS
                .iter()
                .map(|(id, base)| (*id, base.to_string()))
                .collect(),
        }
    }
}

impl ExplorerTable {
    pub fn with_overrides(mut self, overrides: &HashMap<u32, String>) -> Self {
        for (id, base) in overrides {
            self.bases
                .insert(*id, base.trim_end_matches('/').to_string());
        }
        self
    }

    pub fn address_url(&self, network: u32, address: &Address) -> Option<String> {
        self.bases
            .get(&network)
            .map(|base| format!("{base}/address/{}", address.to_checksum(None)))
    }

    pub fn tx_url(&self, network: u32, tx_hash: &str) -> Option<String> {
        self.bases
            .get(&network)
            .map(|base| format!("{base}/tx/{tx_hash}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_networks_have_links() {
        let table = ExplorerTable::default();
        let address = Address::repeat_byte(0x11);
        assert_eq!(
            table.address_url(0, &address).unwrap(),
            format!("https://etherscan.io/address/{}", address.to_checksum(None))
        );
        assert_eq!(
            table.tx_url(1, "0xabc").unwrap(),
            "https://zkevm.polygonscan.com/tx/0xabc"
        );
        assert_eq!(table.tx_url(5, "0xabc"), None);
    }

    #[test]
    fn overrides_replace_and_extend() {
        let overrides = HashMap::from([
            (5, "https://explorer.example/".to_string()),
            (0, "https://eth.example".to_string()),
        ]);
        let table = ExplorerTable::default().with_overrides(&overrides);
        assert_eq!(
            table.tx_url(5, "0x1").unwrap(),
            "https://explorer.example/tx/0x1"
        );
        assert_eq!(table.tx_url(0, "0x1").unwrap(), "https://eth.example/tx/0x1");
    }
}
