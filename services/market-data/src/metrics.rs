//! Top-of-book metrics
//!
//! Mid price and spread over any view that can report its best bid and best
//! ask. One-sided and empty books map to sentinel values instead of errors:
//!
//! | bids  | asks  | mid            | spread         |
//! |-------|-------|----------------|----------------|
//! | empty | empty | `0`            | `+inf`         |
//! | empty | some  | `-inf`         | `+inf`         |
//! | some  | empty | `+inf`         | `+inf`         |
//! | some  | some  | `(bid+ask)/2`  | `ask-bid`      |

use rust_decimal::Decimal;
use types::numeric::{Price, QuoteValue};

use crate::order_book::OrderBook;
use crate::snapshot::OrderBookSnapshot;

/// A view exposing its best quotable price per side.
pub trait TopOfBook {
    fn best_bid_price(&self) -> Option<Price>;
    fn best_ask_price(&self) -> Option<Price>;
}

impl TopOfBook for OrderBookSnapshot {
    fn best_bid_price(&self) -> Option<Price> {
        self.best_bid().map(|l| l.price)
    }

    fn best_ask_price(&self) -> Option<Price> {
        self.best_ask().map(|l| l.price)
    }
}

impl TopOfBook for OrderBook {
    fn best_bid_price(&self) -> Option<Price> {
        self.best_bid().map(|l| l.price)
    }

    fn best_ask_price(&self) -> Option<Price> {
        self.best_ask().map(|l| l.price)
    }
}

pub fn mid<T: TopOfBook + ?Sized>(book: &T) -> QuoteValue {
    match (book.best_bid_price(), book.best_ask_price()) {
        (None, None) => QuoteValue::Finite(Decimal::ZERO),
        (None, Some(_)) => QuoteValue::NegInfinity,
        (Some(_), None) => QuoteValue::PosInfinity,
        (Some(bid), Some(ask)) => {
            QuoteValue::Finite((bid.as_decimal() + ask.as_decimal()) / Decimal::TWO)
        }
    }
}

/// `ask - bid`; may be negative on a crossed book.
pub fn spread<T: TopOfBook + ?Sized>(book: &T) -> QuoteValue {
    match (book.best_bid_price(), book.best_ask_price()) {
        (Some(bid), Some(ask)) => QuoteValue::Finite(ask.as_decimal() - bid.as_decimal()),
        _ => QuoteValue::PosInfinity,
    }
}
