//! Simple Cache - A validating facade over pluggable cache drivers
//!
//! Checks keys and TTLs, normalizes TTLs to seconds and delegates storage
//! to an injected [`Driver`].

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{Cache, Driver, Interval, Ttl};
pub use config::Config;
pub use error::{CacheError, Result};
