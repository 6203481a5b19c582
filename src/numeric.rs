use crate::error::MalformedRowError;
use alloy_primitives::U256;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Parse a non-negative integer amount as the backend renders it.
/// Thousands separators are tolerated; anything else is malformed.
pub fn parse_amount(raw: &str) -> Result<U256, MalformedRowError> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() || !cleaned.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedRowError::new("amount", raw));
    }
    U256::from_str(&cleaned).map_err(|_| MalformedRowError::new("amount", raw))
}

/// A balance as seen by the core: either a known amount or a sentinel for
/// a lookup that failed, timed out or returned garbage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Balance {
    Amount(U256),
    Unavailable,
}

impl Balance {
    pub fn amount(&self) -> Option<U256> {
        match self {
            Balance::Amount(amount) => Some(*amount),
            Balance::Unavailable => None,
        }
    }

    /// Value used in sums: sentinels contribute zero.
    pub fn amount_or_zero(&self) -> U256 {
        self.amount().unwrap_or(U256::ZERO)
    }
}

impl From<Option<U256>> for Balance {
    fn from(value: Option<U256>) -> Self {
        value.map_or(Balance::Unavailable, Balance::Amount)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Balance::Amount(amount) => write!(f, "{amount}"),
            Balance::Unavailable => f.write_str("N/A"),
        }
    }
}

/// Exact sum of balances, unavailable entries count as zero.
pub fn sum_balances<'a>(balances: impl IntoIterator<Item = &'a Balance>) -> U256 {
    balances.into_iter().fold(U256::ZERO, |total, balance| {
        total.checked_add(balance.amount_or_zero()).unwrap_or_else(|| {
            warn!("Balance sum overflowed 256 bits, saturating");
            U256::MAX
        })
    })
}

/// Signed difference of two 256-bit amounts without losing range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedAmount {
    negative: bool,
    magnitude: U256,
}

impl SignedAmount {
    pub const ZERO: Self = Self {
        negative: false,
        magnitude: U256::ZERO,
    };

    /// `lhs - rhs`.
    pub fn difference(lhs: U256, rhs: U256) -> Self {
        if lhs >= rhs {
            Self {
                negative: false,
                magnitude: lhs - rhs,
            }
        } else {
            Self {
                negative: true,
                magnitude: rhs - lhs,
            }
        }
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn magnitude(&self) -> U256 {
        self.magnitude
    }
}

impl fmt::Display for SignedAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-{}", self.magnitude)
        } else {
            write!(f, "{}", self.magnitude)
        }
    }
}
