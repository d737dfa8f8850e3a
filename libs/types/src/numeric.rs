//! Decimal types for prices and derived quotes
//!
//! Uses rust_decimal for deterministic arithmetic so that equal prices
//! group exactly and balances reach exactly zero.

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Price in quote currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    pub const ZERO: Price = Price(Decimal::ZERO);

    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns `None` unless the value is strictly positive.
    pub fn try_new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Decimal::from(value))
    }

    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s).map(Self)
    }
}

impl From<Decimal> for Price {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decimal extended with signed infinities.
///
/// Mid and spread queries over one-sided or empty books resolve to
/// infinite sentinels instead of failing. Variant order gives
/// `NegInfinity < Finite(_) < PosInfinity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QuoteValue {
    NegInfinity,
    Finite(Decimal),
    PosInfinity,
}

impl QuoteValue {
    pub fn is_finite(&self) -> bool {
        matches!(self, QuoteValue::Finite(_))
    }

    pub fn finite(&self) -> Option<Decimal> {
        match self {
            QuoteValue::Finite(value) => Some(*value),
            _ => None,
        }
    }

    /// Lossy conversion; sentinels map to IEEE infinities.
    pub fn to_f64(&self) -> f64 {
        match self {
            QuoteValue::NegInfinity => f64::NEG_INFINITY,
            QuoteValue::Finite(value) => value.to_f64().unwrap_or(f64::NAN),
            QuoteValue::PosInfinity => f64::INFINITY,
        }
    }
}

impl From<Decimal> for QuoteValue {
    fn from(value: Decimal) -> Self {
        QuoteValue::Finite(value)
    }
}

impl fmt::Display for QuoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteValue::NegInfinity => write!(f, "-inf"),
            QuoteValue::Finite(value) => write!(f, "{value}"),
            QuoteValue::PosInfinity => write!(f, "inf"),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn quote_value() -> impl Strategy<Value = QuoteValue> {
        prop_oneof![
            Just(QuoteValue::NegInfinity),
            (any::<i64>(), 0u32..10).prop_map(|(m, s)| QuoteValue::Finite(Decimal::new(m, s))),
            Just(QuoteValue::PosInfinity),
        ]
    }

    proptest! {
        #[test]
        fn prop_quote_value_total_order(a in quote_value(), b in quote_value()) {
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
            prop_assert!(QuoteValue::NegInfinity <= a);
            prop_assert!(a <= QuoteValue::PosInfinity);
            if let (Some(x), Some(y)) = (a.finite(), b.finite()) {
                prop_assert_eq!(a.cmp(&b), x.cmp(&y));
            }
        }

        #[test]
        fn prop_price_display_parses_back(m in 1i64..i64::MAX, s in 0u32..10) {
            let price = Price::new(Decimal::new(m, s));
            let parsed: Price = price.to_string().parse().unwrap();
            prop_assert_eq!(parsed, price);
        }
    }
}
