//! Cache Facade Module
//!
//! Validates arguments, normalizes TTLs and delegates to the injected driver.

use std::fmt;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::cache::driver::Driver;
use crate::cache::key::{json_type_name, validate_key, KeyArg};
use crate::cache::ttl::{Clock, SystemClock, TtlArg};
use crate::config::Config;
use crate::error::{CacheError, Result};

// == Cache ==
/// Simple-cache facade over a pluggable [`Driver`].
///
/// Every key is type checked and checked for reserved characters before the
/// driver sees it, and every TTL reaches the driver as plain seconds. The
/// facade holds no state of its own between calls.
pub struct Cache<D = Box<dyn Driver>> {
    /// Injected storage backend
    driver: D,
    /// Reference instant for interval TTLs
    clock: Box<dyn Clock>,
    config: Config,
}

impl<D: Driver> Cache<D> {
    // == Constructors ==
    /// Creates a facade over `driver` with the default configuration.
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, Config::default())
    }

    pub fn with_config(driver: D, config: Config) -> Self {
        Self {
            driver,
            clock: Box::new(SystemClock),
            config,
        }
    }

    /// Replaces the clock used to normalize interval TTLs.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    // == Get ==
    /// Fetches the value under `key`; the driver decides how `default` applies.
    pub fn get<K: KeyArg + ?Sized>(&self, key: &K, default: Value) -> Result<Value> {
        let key = self.checked_key(key, "Cache::get")?;
        debug!("get: delegating key {}", self.shown(key));
        self.driver.get(key, default)
    }

    // == Set ==
    /// Stores `value` under `key`.
    ///
    /// An absent TTL becomes `0`, integers pass through, and intervals become
    /// the seconds between now and now plus the interval.
    pub fn set<K, T>(&self, key: &K, value: Value, ttl: T) -> Result<bool>
    where
        K: KeyArg + ?Sized,
        T: TtlArg,
    {
        let key = key
            .as_key()
            .map_err(|given| CacheError::type_mismatch(1, "Cache::set", "string", given))?;
        let ttl = ttl.into_ttl().map_err(|given| {
            CacheError::type_mismatch(3, "Cache::set", "int or interval", given)
        })?;
        self.legal_key(key)?;

        let seconds = ttl.to_seconds(self.clock.now())?;
        debug!("set: delegating key {} with ttl {}s", self.shown(key), seconds);
        self.driver.set(key, value, seconds)
    }

    // == Delete ==
    pub fn delete<K: KeyArg + ?Sized>(&self, key: &K) -> Result<bool> {
        let key = self.checked_key(key, "Cache::delete")?;
        debug!("delete: delegating key {}", self.shown(key));
        self.driver.delete(key)
    }

    // == Clear ==
    pub fn clear(&self) -> Result<bool> {
        debug!("clear: delegating");
        self.driver.clear()
    }

    // == Has ==
    pub fn has<K: KeyArg + ?Sized>(&self, key: &K) -> Result<bool> {
        let key = self.checked_key(key, "Cache::has")?;
        debug!("has: delegating key {}", self.shown(key));
        self.driver.has(key)
    }

    // == Get Multiple ==
    /// Fetches every key listed in `keys`.
    ///
    /// `keys` is a JSON array (results keyed by index) or object (results
    /// keyed by member name, member values are the keys fetched). Any other
    /// JSON value fails with `InvalidArgument`. The first failing element
    /// aborts the call.
    pub fn get_multiple(&self, keys: &Value, default: Value) -> Result<Map<String, Value>> {
        let items = batch_items(keys, "Cache::get_multiple")?;
        let fetched = self.get_many(items.iter().map(|(_, key)| *key), default)?;

        Ok(items
            .into_iter()
            .zip(fetched)
            .map(|((source, _), value)| (source.to_string(), value))
            .collect())
    }

    /// Fetches every key yielded by `keys`, in order.
    ///
    /// Results line up with the input by position. The first failing key
    /// aborts the call.
    pub fn get_many<I>(&self, keys: I, default: Value) -> Result<Vec<Value>>
    where
        I: IntoIterator,
        I::Item: KeyArg,
    {
        keys.into_iter()
            .map(|key| self.get(&key, default.clone()))
            .collect()
    }

    // == Set Multiple ==
    /// Stores every member of the JSON object `values` with the same TTL.
    ///
    /// Returns true only if every individual store succeeded; all entries are
    /// attempted. Array entries carry integer keys and are rejected as type
    /// mismatches.
    pub fn set_multiple<T>(&self, values: &Value, ttl: T) -> Result<bool>
    where
        T: TtlArg + Clone,
    {
        let items = batch_items(values, "Cache::set_multiple")?;
        self.set_many(
            items.into_iter().map(|(key, value)| (key, value.clone())),
            ttl,
        )
    }

    /// Stores every `(key, value)` pair yielded by `entries` with the same TTL.
    ///
    /// Returns true only if every individual store succeeded; all entries are
    /// attempted.
    pub fn set_many<I, K, T>(&self, entries: I, ttl: T) -> Result<bool>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: KeyArg,
        T: TtlArg + Clone,
    {
        let mut total = 0;
        let mut failed = 0;
        for (key, value) in entries {
            total += 1;
            if !self.set(&key, value, ttl.clone())? {
                failed += 1;
            }
        }

        if failed > 0 {
            warn!("batch set: driver rejected {} of {} entries", failed, total);
        }
        Ok(failed == 0)
    }

    // == Delete Multiple ==
    /// Deletes every key listed in the JSON array or object `keys`.
    ///
    /// Returns true only if every individual delete succeeded; all keys are
    /// attempted.
    pub fn delete_multiple(&self, keys: &Value) -> Result<bool> {
        let items = batch_items(keys, "Cache::delete_multiple")?;
        self.delete_many(items.into_iter().map(|(_, key)| key))
    }

    /// Deletes every key yielded by `keys`; all keys are attempted.
    pub fn delete_many<I>(&self, keys: I) -> Result<bool>
    where
        I: IntoIterator,
        I::Item: KeyArg,
    {
        let mut total = 0;
        let mut failed = 0;
        for key in keys {
            total += 1;
            if !self.delete(&key)? {
                failed += 1;
            }
        }

        if failed > 0 {
            warn!("batch delete: driver failed {} of {} deletes", failed, total);
        }
        Ok(failed == 0)
    }

    // == Validation Helpers ==
    fn checked_key<'k, K: KeyArg + ?Sized>(
        &self,
        key: &'k K,
        method: &'static str,
    ) -> Result<&'k str> {
        let key = key
            .as_key()
            .map_err(|given| CacheError::type_mismatch(1, method, "string", given))?;
        self.legal_key(key)?;
        Ok(key)
    }

    fn legal_key(&self, key: &str) -> Result<()> {
        validate_key(key).inspect_err(|_| {
            debug!("Rejected illegal key {}", self.shown(key));
        })
    }

    /// Key as it may appear in log output.
    fn shown<'k>(&self, key: &'k str) -> &'k str {
        if self.config.redact_keys {
            "<redacted>"
        } else {
            key
        }
    }
}

impl<D: fmt::Debug> fmt::Debug for Cache<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("driver", &self.driver)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// == Batch Arguments ==
/// Position of an element in its source collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchKey<'a> {
    Index(usize),
    Name(&'a str),
}

impl fmt::Display for BatchKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchKey::Index(index) => write!(f, "{}", index),
            BatchKey::Name(name) => f.write_str(name),
        }
    }
}

impl KeyArg for BatchKey<'_> {
    fn as_key(&self) -> std::result::Result<&str, &'static str> {
        match *self {
            BatchKey::Index(_) => Err("integer"),
            BatchKey::Name(name) => Ok(name),
        }
    }
}

/// Flattens a JSON array or object into (source key, element) pairs.
fn batch_items<'a>(
    batch: &'a Value,
    method: &'static str,
) -> Result<Vec<(BatchKey<'a>, &'a Value)>> {
    match batch {
        Value::Array(items) => Ok(items
            .iter()
            .enumerate()
            .map(|(index, item)| (BatchKey::Index(index), item))
            .collect()),
        Value::Object(members) => Ok(members
            .iter()
            .map(|(name, item)| (BatchKey::Name(name.as_str()), item))
            .collect()),
        other => Err(CacheError::InvalidArgument(format!(
            "Argument 1 passed to {} must be of the type iterable, {} given",
            method,
            json_type_name(other)
        ))),
    }
}
