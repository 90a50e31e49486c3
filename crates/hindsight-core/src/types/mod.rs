//! Domain types shared by the Hindsight crates.
//!
//! - [`Date`]: Calendar date for pricing and market data dates

mod date;

pub use date::Date;
