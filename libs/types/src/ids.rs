//! Identifier types for book entities
//!
//! Orders are keyed by the hash of their signed payload, which is unique
//! within a side of a book. Trading pairs use the `BASE|QUOTE` format.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::ValidationError;

/// Unique key of a live order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderHash(String);

impl OrderHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for OrderHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for OrderHash {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Trading pair identifier
///
/// Format: "BASE|QUOTE" (e.g., "aETH|WETH")
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Pair(String);

impl Pair {
    pub const SEPARATOR: char = '|';

    /// Create a new Pair from a string
    ///
    /// # Panics
    /// Panics if the format is invalid (must be BASE|QUOTE)
    pub fn new(symbol: impl Into<String>) -> Self {
        match Self::try_new(symbol) {
            Ok(pair) => pair,
            Err(err) => panic!("{err}"),
        }
    }

    /// Try to create a Pair, rejecting anything that is not BASE|QUOTE
    pub fn try_new(symbol: impl Into<String>) -> Result<Self, ValidationError> {
        let s = symbol.into();
        match s.split_once(Self::SEPARATOR) {
            Some((base, quote))
                if !base.is_empty() && !quote.is_empty() && !quote.contains(Self::SEPARATOR) =>
            {
                Ok(Self(s))
            }
            _ => Err(ValidationError::InvalidPair(s)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into base and quote codes
    pub fn split(&self) -> (&str, &str) {
        self.0.split_once(Self::SEPARATOR).unwrap_or((self.0.as_str(), ""))
    }
}

impl TryFrom<String> for Pair {
    type Error = ValidationError;

    fn try_from(symbol: String) -> Result<Self, Self::Error> {
        Self::try_new(symbol)
    }
}

impl From<Pair> for String {
    fn from(pair: Pair) -> Self {
        pair.0
    }
}

impl fmt::Display for Pair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
