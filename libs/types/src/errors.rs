//! Error types for the order book engine
//!
//! Inputs are rejected at the boundary with `ValidationError` before they
//! reach the book mutation primitives, which assume well-formed fields.

use thiserror::Error;

/// Input rejected before it reaches the book.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown side tag: {0}")]
    UnknownSide(String),

    #[error("Invalid pair: {0} (expected BASE|QUOTE)")]
    InvalidPair(String),

    #[error("Empty order hash")]
    EmptyOrderHash,

    #[error("Invalid price for order {order_hash}: {price}")]
    InvalidPrice { order_hash: String, price: String },

    #[error("Negative balance for order {order_hash}: {balance}")]
    NegativeBalance { order_hash: String, balance: String },

    #[error("Negative amount for order {order_hash}: {amount}")]
    NegativeAmount { order_hash: String, amount: String },
}
