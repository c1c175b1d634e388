//! Driver Module
//!
//! The storage backend contract consumed by the cache facade.

use std::sync::Arc;

use serde_json::Value;

use crate::error::Result;

// == Driver ==
/// Pluggable storage backend behind a [`Cache`](crate::cache::Cache).
///
/// Drivers own all stored state, expiry enforcement and serialization. Keys
/// reaching a driver have already passed the legality check and the TTL is
/// always plain seconds, where `0` means "never expires".
///
/// Methods take `&self`; drivers needing mutation use interior mutability.
#[cfg_attr(test, mockall::automock)]
pub trait Driver {
    /// Fetches the value stored under `key`, or `default` when absent.
    fn get(&self, key: &str, default: Value) -> Result<Value>;

    /// Stores `value` under `key` for `ttl` seconds.
    fn set(&self, key: &str, value: Value, ttl: i64) -> Result<bool>;

    /// Removes `key`.
    fn delete(&self, key: &str) -> Result<bool>;

    /// Removes every entry.
    fn clear(&self) -> Result<bool>;

    /// Reports whether `key` is present.
    fn has(&self, key: &str) -> Result<bool>;
}

// == Forwarding Impls ==
impl<D: Driver + ?Sized> Driver for &D {
    fn get(&self, key: &str, default: Value) -> Result<Value> {
        (**self).get(key, default)
    }

    fn set(&self, key: &str, value: Value, ttl: i64) -> Result<bool> {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key)
    }

    fn clear(&self) -> Result<bool> {
        (**self).clear()
    }

    fn has(&self, key: &str) -> Result<bool> {
        (**self).has(key)
    }
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn get(&self, key: &str, default: Value) -> Result<Value> {
        (**self).get(key, default)
    }

    fn set(&self, key: &str, value: Value, ttl: i64) -> Result<bool> {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key)
    }

    fn clear(&self) -> Result<bool> {
        (**self).clear()
    }

    fn has(&self, key: &str) -> Result<bool> {
        (**self).has(key)
    }
}

impl<D: Driver + ?Sized> Driver for Arc<D> {
    fn get(&self, key: &str, default: Value) -> Result<Value> {
        (**self).get(key, default)
    }

    fn set(&self, key: &str, value: Value, ttl: i64) -> Result<bool> {
        (**self).set(key, value, ttl)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        (**self).delete(key)
    }

    fn clear(&self) -> Result<bool> {
        (**self).clear()
    }

    fn has(&self, key: &str) -> Result<bool> {
        (**self).has(key)
    }
}
