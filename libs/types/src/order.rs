//! Book side and live order records
//!
//! A `LiveOrder` is produced by the order intake collaborator after
//! signature and fee processing; the book only consumes its numeric fields.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;
use crate::ids::{OrderHash, Pair};
use crate::numeric::Price;

/// Order side (bid or ask half of the book)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy order
    Bid,
    /// Sell order
    Ask,
}

impl Side {
    pub fn is_bid(&self) -> bool {
        matches!(self, Side::Bid)
    }

    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Bid => "bid",
            Side::Ask => "ask",
        }
    }
}

impl FromStr for Side {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bid" => Ok(Side::Bid),
            "ask" => Ok(Side::Ask),
            other => Err(ValidationError::UnknownSide(other.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order currently resting on the book.
///
/// `price`, `amount` and `balance` are already fee-adjusted. Sequences are
/// assigned by the intake service: `initial_sequence` at admission and
/// `current_sequence` at the latest state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveOrder {
    #[serde(default)]
    pub account: String,
    pub pair: Pair,
    pub order_hash: OrderHash,
    pub price: Price,
    #[serde(default)]
    pub amount: Decimal,
    pub balance: Decimal,
    #[serde(default)]
    pub matching: Decimal,
    #[serde(default)]
    pub fill: Decimal,
    pub side: Side,
    /// Unix millis
    #[serde(default)]
    pub expiry: i64,
    /// Unix millis
    #[serde(default)]
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
    pub initial_sequence: u64,
    #[serde(default)]
    pub current_sequence: u64,
    #[serde(default)]
    pub fee: Decimal,
    #[serde(default)]
    pub fee_asset: String,
}

impl LiveOrder {
    /// Minimal record with the fields the book consumes; the rest default.
    pub fn new(
        pair: Pair,
        order_hash: OrderHash,
        side: Side,
        price: Price,
        balance: Decimal,
        initial_sequence: u64,
    ) -> Self {
        Self {
            account: String::new(),
            pair,
            order_hash,
            price,
            amount: balance,
            balance,
            matching: Decimal::ZERO,
            fill: Decimal::ZERO,
            side,
            expiry: 0,
            created_at: 0,
            updated_at: None,
            initial_sequence,
            current_sequence: initial_sequence,
            fee: Decimal::ZERO,
            fee_asset: String::new(),
        }
    }

    /// Reject records the book cannot order or aggregate.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.order_hash.is_empty() {
            return Err(ValidationError::EmptyOrderHash);
        }
        if !self.price.is_positive() {
            return Err(ValidationError::InvalidPrice {
                order_hash: self.order_hash.to_string(),
                price: self.price.to_string(),
            });
        }
        if self.balance < Decimal::ZERO {
            return Err(ValidationError::NegativeBalance {
                order_hash: self.order_hash.to_string(),
                balance: self.balance.to_string(),
            });
        }
        if self.amount < Decimal::ZERO {
            return Err(ValidationError::NegativeAmount {
                order_hash: self.order_hash.to_string(),
                amount: self.amount.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_order() -> LiveOrder {
        LiveOrder::new(
            Pair::new("aETH|WETH"),
            OrderHash::new("orderHash1"),
            Side::Bid,
            Price::from_u64(100),
            Decimal::from(5),
            1,
        )
    }

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Bid.opposite(), Side::Ask);
        assert_eq!(Side::Ask.opposite(), Side::Bid);
    }

    #[test]
    fn test_side_parse() {
        assert_eq!("bid".parse::<Side>(), Ok(Side::Bid));
        assert_eq!("ask".parse::<Side>(), Ok(Side::Ask));
        assert_eq!(
            "BUY".parse::<Side>(),
            Err(ValidationError::UnknownSide("BUY".to_string()))
        );
    }

    #[test]
    fn test_side_serialization() {
        assert_eq!(serde_json::to_string(&Side::Bid).unwrap(), "\"bid\"");
        assert!(serde_json::from_str::<Side>("\"sell\"").is_err());
    }

    #[test]
    fn test_live_order_validate() {
        assert!(sample_order().validate().is_ok());

        let mut zero = sample_order();
        zero.balance = Decimal::ZERO;
        assert!(zero.validate().is_ok());

        let mut negative = sample_order();
        negative.balance = Decimal::NEGATIVE_ONE;
        assert!(matches!(
            negative.validate(),
            Err(ValidationError::NegativeBalance { .. })
        ));

        let mut free = sample_order();
        free.price = Price::ZERO;
        assert!(matches!(
            free.validate(),
            Err(ValidationError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_live_order_deserialize_minimal() {
        let json = r#"{
            "pair": "aETH|WETH",
            "orderHash": "orderHash1",
            "price": "100",
            "balance": "5",
            "side": "bid",
            "initialSequence": 1
        }"#;
        let order: LiveOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.side, Side::Bid);
        assert_eq!(order.balance, Decimal::from(5));
        assert_eq!(order.initial_sequence, 1);
        assert_eq!(order.fee, Decimal::ZERO);
        assert!(order.updated_at.is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_side_tag_round_trip(is_bid in any::<bool>()) {
            let side = if is_bid { Side::Bid } else { Side::Ask };
            prop_assert_eq!(side.to_string().parse::<Side>(), Ok(side));
            prop_assert_eq!(side.opposite().opposite(), side);
        }

        #[test]
        fn prop_unknown_side_tag_rejected(tag in "[a-z]{1,8}") {
            prop_assume!(tag != "bid" && tag != "ask");
            prop_assert_eq!(
                tag.parse::<Side>(),
                Err(ValidationError::UnknownSide(tag.clone()))
            );
        }
    }
}
