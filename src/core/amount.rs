//! NativeAmount - wei-precision quantity of a chain's native currency
//!
//! Parsed from decimal ether text ("2.5") and rendered back the same way.
//! Backed by `U256` wei, so a balance can never go negative.

use alloy_primitives::utils::{format_ether, parse_ether};
use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::core::rpc::NATIVE_DECIMALS;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("'{0}' is not a decimal number")]
    Malformed(String),
    #[error("'{0}' has more than 18 decimal places")]
    TooPrecise(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NativeAmount(U256);

impl NativeAmount {
    pub const ZERO: Self = Self(U256::ZERO);

    pub fn from_wei(wei: U256) -> Self { Self(wei) }

    pub fn wei(&self) -> U256 { self.0 }

    pub fn is_zero(&self) -> bool { self.0.is_zero() }

    /// Parse a `0x`-prefixed JSON-RPC quantity (wei).
    pub fn from_hex_quantity(raw: &str) -> Result<Self, AmountError> {
        let digits = raw
            .trim()
            .strip_prefix("0x")
            .ok_or_else(|| AmountError::Malformed(raw.to_string()))?;
        if digits.is_empty() {
            return Ok(Self::ZERO);
        }
        U256::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| AmountError::Malformed(raw.to_string()))
    }

    /// Render as a `0x`-prefixed JSON-RPC quantity (wei).
    pub fn to_hex_quantity(&self) -> String {
        format!("0x{:x}", self.0)
    }
}

impl FromStr for NativeAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty()) || !digits_only(whole) || !digits_only(frac) {
            return Err(AmountError::Malformed(s.to_string()));
        }
        if frac.len() > NATIVE_DECIMALS as usize {
            return Err(AmountError::TooPrecise(s.to_string()));
        }
        let normalized = format!(
            "{}.{}",
            if whole.is_empty() { "0" } else { whole },
            if frac.is_empty() { "0" } else { frac }
        );
        parse_ether(&normalized)
            .map(Self)
            .map_err(|_| AmountError::Malformed(s.to_string()))
    }
}

impl fmt::Display for NativeAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = format_ether(self.0);
        let text = if text.contains('.') {
            text.trim_end_matches('0').trim_end_matches('.')
        } else {
            text.as_str()
        };
        f.write_str(text)
    }
}

impl Serialize for NativeAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NativeAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
