//! Decoding of loosely typed argument maps.
//!
//! The framework's standard codec hands every method call a map of
//! JSON-like values. `Args` validates fields one at a time; `null` is treated
//! the same as an absent key, and a present value of the wrong type is an
//! [`BridgeError::InvalidArgs`] error.

use serde_json::{Map, Value};

use crate::error::BridgeError;
use crate::types::Uid;

/// A validated view over a call's argument map.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> Args<'a> {
    /// Wraps `value`, which must be a map.
    pub fn new(value: &'a Value) -> Result<Self, BridgeError> {
        value
            .as_object()
            .map(|map| Self { map })
            .ok_or_else(|| BridgeError::invalid("arguments missing"))
    }

    /// Wraps an already extracted map.
    pub fn from_map(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|value| !value.is_null())
    }

    /// Optional string.
    pub fn opt_str(&self, key: &str) -> Result<Option<&'a str>, BridgeError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(BridgeError::invalid(format!("{key} must be a string"))),
        }
    }

    /// Required string that is neither empty nor whitespace.
    pub fn non_blank_str(&self, key: &str) -> Result<&'a str, BridgeError> {
        match self.opt_str(key)? {
            Some(s) if !s.trim().is_empty() => Ok(s),
            _ => Err(BridgeError::invalid(format!("{key} is empty"))),
        }
    }

    /// Required non-empty string; whitespace is accepted.
    pub fn non_empty_str(&self, key: &str) -> Result<&'a str, BridgeError> {
        match self.opt_str(key)? {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(BridgeError::invalid(format!("{key} is empty"))),
        }
    }

    /// Optional boolean.
    pub fn opt_bool(&self, key: &str) -> Result<Option<bool>, BridgeError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(BridgeError::invalid(format!("{key} must be a bool"))),
        }
    }

    /// Required boolean.
    pub fn bool(&self, key: &str) -> Result<bool, BridgeError> {
        self.opt_bool(key)?
            .ok_or_else(|| BridgeError::invalid(format!("{key} is missing")))
    }

    /// Optional integer that fits in `i32`.
    pub fn opt_i32(&self, key: &str) -> Result<Option<i32>, BridgeError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        value
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| BridgeError::invalid(format!("{key} must be a 32-bit integer")))
    }

    /// Required integer that fits in `i32`.
    pub fn i32(&self, key: &str) -> Result<i32, BridgeError> {
        self.opt_i32(key)?
            .ok_or_else(|| BridgeError::invalid(format!("{key} is missing")))
    }

    /// Optional non-negative integer that fits in `u32`.
    pub fn opt_u32(&self, key: &str) -> Result<Option<u32>, BridgeError> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                BridgeError::invalid(format!("{key} must be an unsigned 32-bit integer"))
            })
    }

    /// Optional participant identifier.
    pub fn opt_uid(&self, key: &str) -> Result<Option<Uid>, BridgeError> {
        self.opt_u32(key)
    }

    /// Required participant identifier.
    pub fn uid(&self, key: &str) -> Result<Uid, BridgeError> {
        self.opt_uid(key)?
            .ok_or_else(|| BridgeError::invalid(format!("{key} is missing")))
    }

    /// Optional nested map.
    pub fn opt_map(&self, key: &str) -> Result<Option<Args<'a>>, BridgeError> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Object(map)) => Ok(Some(Args::from_map(map))),
            Some(_) => Err(BridgeError::invalid(format!("{key} must be a map"))),
        }
    }

    /// Required nested map.
    pub fn map(&self, key: &str) -> Result<Args<'a>, BridgeError> {
        self.opt_map(key)?
            .ok_or_else(|| BridgeError::invalid(format!("{key} is empty")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_requires_map() {
        assert!(Args::new(&json!(null)).is_err());
        assert!(Args::new(&json!([1, 2])).is_err());
        assert!(Args::new(&json!({})).is_ok());
    }

    #[test]
    fn test_null_is_absent() {
        let value = json!({ "token": null, "uid": null });
        let args = Args::new(&value).unwrap();
        assert_eq!(args.opt_str("token").unwrap(), None);
        assert_eq!(args.opt_uid("uid").unwrap(), None);
    }

    #[test]
    fn test_blank_strings_rejected() {
        let value = json!({ "channelId": "   ", "token": " " });
        let args = Args::new(&value).unwrap();
        assert!(args.non_blank_str("channelId").is_err());
        assert_eq!(args.non_empty_str("token").unwrap(), " ");
    }

    #[test]
    fn test_integer_ranges() {
        let value = json!({ "uid": -1, "big": 4_294_967_296u64, "profile": 1.5, "ok": 7 });
        let args = Args::new(&value).unwrap();
        assert!(args.uid("uid").is_err());
        assert!(args.uid("big").is_err());
        assert!(args.i32("profile").is_err());
        assert_eq!(args.i32("ok").unwrap(), 7);
        assert_eq!(args.uid("ok").unwrap(), 7);
    }

    #[test]
    fn test_wrong_type_is_invalid() {
        let value = json!({ "muted": "yes" });
        let args = Args::new(&value).unwrap();
        let err = args.bool("muted").unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGS");
    }
}
