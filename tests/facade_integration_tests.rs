//! Integration Tests for the Cache Facade
//!
//! Drives the public API against a HashMap-backed driver that records every call.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use simple_cache::cache::{is_legal_key, Interval, Ttl};
use simple_cache::{Cache, CacheError, Config, Driver, Result};

// == Helper Types ==

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Get(String),
    Set(String, Value, i64),
    Delete(String),
    Clear,
    Has(String),
}

/// In-memory driver that logs calls and can be told to refuse writes.
#[derive(Debug, Default)]
struct RecordingDriver {
    entries: RefCell<HashMap<String, Value>>,
    calls: RefCell<Vec<Call>>,
    refuse: Vec<String>,
}

impl RecordingDriver {
    fn refusing(keys: &[&str]) -> Self {
        Self {
            refuse: keys.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl Driver for RecordingDriver {
    fn get(&self, key: &str, default: Value) -> Result<Value> {
        self.calls.borrow_mut().push(Call::Get(key.to_string()));
        Ok(self.entries.borrow().get(key).cloned().unwrap_or(default))
    }

    fn set(&self, key: &str, value: Value, ttl: i64) -> Result<bool> {
        self.calls
            .borrow_mut()
            .push(Call::Set(key.to_string(), value.clone(), ttl));
        if self.refuse.iter().any(|k| k == key) {
            return Ok(false);
        }
        self.entries.borrow_mut().insert(key.to_string(), value);
        Ok(true)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        self.calls.borrow_mut().push(Call::Delete(key.to_string()));
        Ok(self.entries.borrow_mut().remove(key).is_some())
    }

    fn clear(&self) -> Result<bool> {
        self.calls.borrow_mut().push(Call::Clear);
        self.entries.borrow_mut().clear();
        Ok(true)
    }

    fn has(&self, key: &str) -> Result<bool> {
        self.calls.borrow_mut().push(Call::Has(key.to_string()));
        Ok(self.entries.borrow().contains_key(key))
    }
}

/// Driver that fails every call, as an unreachable backend would.
struct UnavailableDriver;

impl Driver for UnavailableDriver {
    fn get(&self, _key: &str, _default: Value) -> Result<Value> {
        Err(CacheError::Failure("backend unavailable".to_string()))
    }

    fn set(&self, _key: &str, _value: Value, _ttl: i64) -> Result<bool> {
        Err(CacheError::Failure("backend unavailable".to_string()))
    }

    fn delete(&self, _key: &str) -> Result<bool> {
        Err(CacheError::Failure("backend unavailable".to_string()))
    }

    fn clear(&self) -> Result<bool> {
        Err(CacheError::Failure("backend unavailable".to_string()))
    }

    fn has(&self, _key: &str) -> Result<bool> {
        Err(CacheError::Failure("backend unavailable".to_string()))
    }
}

fn leap_february() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
}

// == Round Trip ==

#[test]
fn test_set_then_get_returns_value_unmodified() {
    let cache = Cache::new(RecordingDriver::default());
    let value = json!({"name": "Ada", "tags": ["x", "y"], "score": 1.5});

    assert!(cache.set("profile.1", value.clone(), Ttl::Forever).unwrap());
    assert_eq!(cache.get("profile.1", Value::Null).unwrap(), value);
    assert!(cache.has("profile.1").unwrap());
}

#[test]
fn test_missing_key_uses_driver_default_handling() {
    let cache = Cache::new(RecordingDriver::default());
    assert_eq!(cache.get("absent", json!("fallback")).unwrap(), json!("fallback"));
}

#[test]
fn test_delete_and_clear() {
    let cache = Cache::new(RecordingDriver::default());
    cache.set("a", json!(1), Ttl::Forever).unwrap();
    cache.set("b", json!(2), Ttl::Forever).unwrap();

    assert!(cache.delete("a").unwrap());
    assert!(!cache.delete("a").unwrap());
    assert!(cache.clear().unwrap());
    assert!(!cache.has("b").unwrap());
}

#[test]
fn test_empty_key_is_accepted() {
    let cache = Cache::new(RecordingDriver::default());
    assert!(is_legal_key(""));
    assert!(cache.set("", json!("empty"), Ttl::Forever).unwrap());
    assert_eq!(cache.get("", Value::Null).unwrap(), json!("empty"));
}

// == TTL Normalization ==

#[test]
fn test_driver_receives_normalized_ttls() {
    let cache = Cache::new(RecordingDriver::default()).with_clock(leap_february);

    cache.set("none", json!(0), Ttl::Forever).unwrap();
    cache.set("int", json!(0), 10).unwrap();
    cache.set("interval", json!(0), Interval::seconds(10)).unwrap();
    cache.set("month", json!(0), Interval::months(1)).unwrap();
    cache.set("past", json!(0), Interval::minutes(1).inverted()).unwrap();
    cache.set("text", json!(0), json!("P1D")).unwrap();

    let ttls: Vec<i64> = cache
        .driver()
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Set(_, _, ttl) => Some(ttl),
            _ => None,
        })
        .collect();
    assert_eq!(ttls, vec![0, 10, 10, 29 * 86_400, -60, 86_400]);
}

// == Validation Before Delegation ==

#[test]
fn test_invalid_arguments_never_reach_driver() {
    let cache = Cache::new(RecordingDriver::default());

    assert!(cache.get("a{b}", Value::Null).unwrap_err().is_invalid_argument());
    assert!(cache.set("user@host", json!(1), Ttl::Forever).unwrap_err().is_invalid_argument());
    assert!(cache.delete("path/to").unwrap_err().is_invalid_argument());
    assert!(cache.has(":bad").unwrap_err().is_invalid_argument());
    assert!(cache.get(&json!(5), Value::Null).unwrap_err().is_type_mismatch());
    assert!(cache.set("ok", json!(1), json!(2.5)).unwrap_err().is_type_mismatch());
    assert!(cache.get_multiple(&json!(7), Value::Null).unwrap_err().is_invalid_argument());
    assert!(cache.set_multiple(&json!("x"), Ttl::Forever).unwrap_err().is_invalid_argument());
    assert!(cache.delete_multiple(&json!(true)).unwrap_err().is_invalid_argument());

    assert!(cache.driver().calls().is_empty());
}

#[test]
fn test_driver_failures_pass_through() {
    let cache = Cache::new(UnavailableDriver);
    let err = cache.set("k", json!("v"), Ttl::Forever).unwrap_err();
    assert!(err.is_failure());
    assert!(!err.is_invalid_argument());
    assert_eq!(err.to_string(), "Cache failure: backend unavailable");
}

// == Batch Operations ==

#[test]
fn test_get_multiple_preserves_source_keys() {
    let cache = Cache::new(RecordingDriver::default());
    cache.set("a", json!("A"), Ttl::Forever).unwrap();
    cache.set("b", json!("B"), Ttl::Forever).unwrap();

    let by_index = cache.get_multiple(&json!(["a", "b", "c"]), Value::Null).unwrap();
    assert_eq!(Value::Object(by_index), json!({"0": "A", "1": "B", "2": null}));

    let by_name = cache
        .get_multiple(&json!({"second": "b", "first": "a"}), Value::Null)
        .unwrap();
    let names: Vec<&str> = by_name.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["second", "first"]);
    assert_eq!(by_name["first"], json!("A"));
}

#[test]
fn test_get_multiple_calls_driver_in_input_order() {
    let cache = Cache::new(RecordingDriver::default());
    cache.get_multiple(&json!(["z", "y", "x"]), Value::Null).unwrap();

    assert_eq!(
        cache.driver().calls(),
        vec![
            Call::Get("z".to_string()),
            Call::Get("y".to_string()),
            Call::Get("x".to_string()),
        ]
    );
}

#[test]
fn test_set_multiple_attempts_every_entry() {
    let cache = Cache::new(RecordingDriver::refusing(&["a"]));

    let stored = cache.set_multiple(&json!({"a": 1, "b": 2}), 30).unwrap();
    assert!(!stored);
    assert_eq!(
        cache.driver().calls(),
        vec![
            Call::Set("a".to_string(), json!(1), 30),
            Call::Set("b".to_string(), json!(2), 30),
        ]
    );
    assert!(cache.has("b").unwrap());
}

#[test]
fn test_set_multiple_stops_at_first_invalid_key() {
    let cache = Cache::new(RecordingDriver::default());

    let err = cache
        .set_multiple(&json!({"ok": 1, "bad:key": 2, "later": 3}), Ttl::Forever)
        .unwrap_err();
    assert!(err.is_invalid_argument());
    assert_eq!(
        cache.driver().calls(),
        vec![Call::Set("ok".to_string(), json!(1), 0)]
    );
}

#[test]
fn test_delete_multiple_reports_partial_failure() {
    let cache = Cache::new(RecordingDriver::default());
    cache.set("present", json!(1), Ttl::Forever).unwrap();

    assert!(!cache.delete_multiple(&json!(["missing", "present"])).unwrap());
    assert!(!cache.has("present").unwrap());
}

// == Construction ==

#[test]
fn test_shared_driver_behind_trait_object() {
    let shared: Arc<dyn Driver> = Arc::new(UnavailableDriver);
    let cache = Cache::new(Arc::clone(&shared));
    assert!(cache.has("k").unwrap_err().is_failure());
}

#[test]
fn test_redacted_config_keeps_behavior() {
    let cache = Cache::with_config(
        RecordingDriver::default(),
        Config::default().with_redact_keys(true),
    );
    assert!(cache.set("secret", json!("v"), Ttl::Forever).unwrap());
    assert_eq!(
        cache.into_driver().calls(),
        vec![Call::Set("secret".to_string(), json!("v"), 0)]
    );
}
