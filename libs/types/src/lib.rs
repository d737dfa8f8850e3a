//! Types library for the order book engine
//!
//! Provides the domain types shared by the exact order book, the aggregated
//! snapshot and the delta feed.
//!
//! # Modules
//! - `ids`: Identifiers (OrderHash, Pair)
//! - `numeric`: Decimal price type and extended quote values
//! - `order`: Book side and live order records
//! - `time`: Time source abstraction used for snapshot versions
//! - `errors`: Boundary validation errors

pub mod ids;
pub mod numeric;
pub mod order;
pub mod time;
pub mod errors;

// Library version constant
pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::time::*;
    pub use crate::errors::*;
}
