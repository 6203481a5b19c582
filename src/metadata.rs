use crate::error::DecodeError;
use alloy::sol_types::SolValue;
use alloy_primitives::hex;

/// Name and symbol of an origin token, carried ABI-encoded as
/// `(string, string)` in the wrapped-token metadata blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            symbol: "Unknown".to_string(),
        }
    }
}

impl TokenMetadata {
    pub fn decode(metadata_hex: &str) -> Result<Self, DecodeError> {
        let bytes = hex::decode(metadata_hex.trim())?;
        let (name, symbol) = <(String, String)>::abi_decode_params_validate(&bytes)?;
        Ok(Self { name, symbol })
    }

    /// Encode in the same layout the bridge uses.
    pub fn encode(&self) -> String {
        let bytes = (self.name.clone(), self.symbol.clone()).abi_encode_params();
        hex::encode_prefixed(bytes)
    }
}
