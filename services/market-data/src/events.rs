//! Single-order events consumed by the book
//!
//! Emitted by the matching/settlement collaborator whenever an order is
//! added, partially filled or withdrawn. Events arrive already ordered by
//! the upstream sequence counters; this module only checks that each one is
//! well formed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::errors::ValidationError;
use types::ids::OrderHash;
use types::numeric::Price;
use types::order::Side;

use crate::order_book::OrderLevel;

/// Add, update or terminate a single order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelUpdateEvent {
    pub order_hash: OrderHash,
    pub price: Price,
    pub balance: Decimal,
    pub initial_sequence: u64,
    pub side: Side,
    #[serde(default)]
    pub is_terminate: bool,
}

impl LevelUpdateEvent {
    /// New or updated order.
    pub fn update(
        order_hash: impl Into<OrderHash>,
        side: Side,
        price: Price,
        balance: Decimal,
        initial_sequence: u64,
    ) -> Self {
        Self {
            order_hash: order_hash.into(),
            price,
            balance,
            initial_sequence,
            side,
            is_terminate: false,
        }
    }

    /// Withdrawal of an order.
    pub fn terminate(
        order_hash: impl Into<OrderHash>,
        side: Side,
        price: Price,
        initial_sequence: u64,
    ) -> Self {
        Self {
            order_hash: order_hash.into(),
            price,
            balance: Decimal::ZERO,
            initial_sequence,
            side,
            is_terminate: true,
        }
    }

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
        Ok(())
    }

    pub fn to_level(&self) -> OrderLevel {
        OrderLevel::new(
            self.order_hash.clone(),
            self.price,
            self.balance,
            self.initial_sequence,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_zero_balance() {
        let event = LevelUpdateEvent::update("a", Side::Bid, Price::from_u64(100), Decimal::ZERO, 1);
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_balance() {
        let event = LevelUpdateEvent::update(
            "a",
            Side::Bid,
            Price::from_u64(100),
            Decimal::NEGATIVE_ONE,
            1,
        );
        assert!(matches!(
            event.validate(),
            Err(ValidationError::NegativeBalance { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_price_and_hash() {
        let free = LevelUpdateEvent::terminate("a", Side::Ask, Price::ZERO, 1);
        assert!(matches!(
            free.validate(),
            Err(ValidationError::InvalidPrice { .. })
        ));

        let anonymous = LevelUpdateEvent::terminate("", Side::Ask, Price::from_u64(1), 1);
        assert_eq!(anonymous.validate(), Err(ValidationError::EmptyOrderHash));
    }

    #[test]
    fn test_deserialize_wire_shape() {
        let json = r#"{
            "orderHash": "0xabc",
            "price": "120.5",
            "balance": "3",
            "initialSequence": 42,
            "side": "ask",
            "isTerminate": true
        }"#;
        let event: LevelUpdateEvent = serde_json::from_str(json).unwrap();
        assert!(event.is_terminate);
        assert_eq!(event.side, Side::Ask);
        assert_eq!(event.to_level().initial_sequence, 42);
    }

    #[test]
    fn test_deserialize_unknown_side_fails() {
        let json = r#"{
            "orderHash": "0xabc",
            "price": "120.5",
            "balance": "3",
            "initialSequence": 42,
            "side": "buy"
        }"#;
        assert!(serde_json::from_str::<LevelUpdateEvent>(json).is_err());
    }
}
