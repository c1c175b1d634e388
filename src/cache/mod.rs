//! Cache Module
//!
//! The validating cache facade, its driver contract, key rules and TTL handling.

mod driver;
mod facade;
mod key;
mod ttl;


// Re-export public types
pub use driver::Driver;
pub use facade::Cache;
pub use key::{is_legal_key, validate_key, KeyArg, RESERVED_CHARACTERS};
pub use ttl::{Clock, Interval, SystemClock, Ttl, TtlArg};
