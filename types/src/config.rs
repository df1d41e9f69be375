//! Chain constants as reported by a beacon node.
//!
//! Nodes serve their configuration as a flat map of strings. Values are classified on ingestion so
//! that a constant of the wrong kind can be reported instead of silently misread.

use core::{
    fmt::{Formatter, Result as FmtResult},
    time::Duration,
};
use std::collections::BTreeMap;

use serde::{
    de::{IgnoredAny, MapAccess, Visitor},
    Deserialize, Deserializer,
};
use thiserror::Error;

const DURATION_KEYS_IN_SECONDS: &[&str] = &["SECONDS_PER_SLOT"];
const DURATION_KEYS_IN_MILLISECONDS: &[&str] = &["SLOT_DURATION_MS"];

#[derive(Debug, Error)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub enum ConfigError {
    #[error("required spec constant {key} is missing")]
    MissingKey { key: &'static str },
    #[error("spec constant {key} has unexpected type (expected {expected}, found {found})")]
    WrongType {
        key: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("spec constant {key} must not be zero")]
    ZeroValue { key: &'static str },
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum SpecValue {
    Uint(u64),
    Duration(Duration),
    Hex(Vec<u8>),
    Text(String),
}

impl SpecValue {
    #[must_use]
    pub fn classify(key: &str, raw: &str) -> Self {
        if let Ok(number) = raw.parse::<u64>() {
            if DURATION_KEYS_IN_SECONDS.contains(&key) {
                return Self::Duration(Duration::from_secs(number));
            }

            if DURATION_KEYS_IN_MILLISECONDS.contains(&key) {
                return Self::Duration(Duration::from_millis(number));
            }

            return Self::Uint(number);
        }

        if let Some(bytes) = raw
            .strip_prefix("0x")
            .and_then(|digits| hex::decode(digits).ok())
        {
            return Self::Hex(bytes);
        }

        Self::Text(raw.to_owned())
    }

    const fn kind(&self) -> &'static str {
        match self {
            Self::Uint(_) => "unsigned integer",
            Self::Duration(_) => "duration",
            Self::Hex(_) => "hex bytes",
            Self::Text(_) => "text",
        }
    }
}

#[derive(Clone, PartialEq, Eq, Default, Debug)]
pub struct SpecMap {
    values: BTreeMap<String, SpecValue>,
}

impl SpecMap {
    pub fn insert(&mut self, key: impl Into<String>, value: SpecValue) {
        self.values.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<SpecValue> {
        self.values.remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&SpecValue> {
        self.values.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn uint(&self, key: &'static str) -> Result<Option<u64>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(SpecValue::Uint(value)) => Ok(Some(*value)),
            Some(other) => Err(wrong_type(key, "unsigned integer", other)),
        }
    }

    pub fn uint_or(&self, key: &'static str, default: u64) -> Result<u64, ConfigError> {
        self.uint(key).map(|value| value.unwrap_or(default))
    }

    pub fn required_uint(&self, key: &'static str) -> Result<u64, ConfigError> {
        self.uint(key)?.ok_or(ConfigError::MissingKey { key })
    }

    pub fn duration(&self, key: &'static str) -> Result<Option<Duration>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(SpecValue::Duration(value)) => Ok(Some(*value)),
            Some(other) => Err(wrong_type(key, "duration", other)),
        }
    }

    pub fn hex(&self, key: &'static str) -> Result<Option<&[u8]>, ConfigError> {
        match self.get(key) {
            None => Ok(None),
            Some(SpecValue::Hex(bytes)) => Ok(Some(bytes)),
            Some(other) => Err(wrong_type(key, "hex bytes", other)),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, SpecValue)> for SpecMap {
    fn from_iter<I: IntoIterator<Item = (K, SpecValue)>>(pairs: I) -> Self {
        let values = pairs
            .into_iter()
            .map(|(key, value)| (key.into(), value))
            .collect();

        Self { values }
    }
}

// Nodes mostly send strings, but some send native numbers and newer configurations contain nested
// structures such as blob schedules. Nested values are irrelevant here and are skipped.
impl<'de> Deserialize<'de> for SpecMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawValue {
            Text(String),
            Number(u64),
            Other(IgnoredAny),
        }

        struct SpecMapVisitor;

        impl<'de> Visitor<'de> for SpecMapVisitor {
            type Value = SpecMap;

            fn expecting(&self, formatter: &mut Formatter) -> FmtResult {
                formatter.write_str("a map of spec constants")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut spec = SpecMap::default();

                while let Some((key, raw)) = map.next_entry::<String, RawValue>()? {
                    let value = match raw {
                        RawValue::Text(text) => SpecValue::classify(&key, &text),
                        RawValue::Number(number) => SpecValue::classify(&key, &number.to_string()),
                        RawValue::Other(_) => continue,
                    };

                    spec.insert(key, value);
                }

                Ok(spec)
            }
        }

        deserializer.deserialize_map(SpecMapVisitor)
    }
}

const fn wrong_type(key: &'static str, expected: &'static str, found: &SpecValue) -> ConfigError {
    ConfigError::WrongType {
        key,
        expected,
        found: found.kind(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use test_case::test_case;

    use super::*;

    #[test_case("SLOTS_PER_EPOCH", "32" => SpecValue::Uint(32))]
    #[test_case("SECONDS_PER_SLOT", "12" => SpecValue::Duration(Duration::from_secs(12)))]
    #[test_case("SLOT_DURATION_MS", "6000" => SpecValue::Duration(Duration::from_secs(6)))]
    #[test_case("ALTAIR_FORK_VERSION", "0x01000000" => SpecValue::Hex(vec![1, 0, 0, 0]))]
    #[test_case("CONFIG_NAME", "mainnet" => SpecValue::Text("mainnet".to_owned()))]
    fn classify_recognizes_value_kinds(key: &str, raw: &str) -> SpecValue {
        SpecValue::classify(key, raw)
    }

    #[test]
    fn deserialize_skips_nested_values() -> serde_json::Result<()> {
        let spec = serde_json::from_value::<SpecMap>(json!({
            "SLOTS_PER_EPOCH": "32",
            "WEIGHT_DENOMINATOR": 64,
            "BLOB_SCHEDULE": [{ "EPOCH": "1", "MAX_BLOBS_PER_BLOCK": "9" }],
        }))?;

        assert_eq!(spec.len(), 2);
        assert_eq!(spec.get("SLOTS_PER_EPOCH"), Some(&SpecValue::Uint(32)));
        assert_eq!(spec.get("WEIGHT_DENOMINATOR"), Some(&SpecValue::Uint(64)));

        Ok(())
    }

    #[test]
    fn uint_reports_wrong_type() {
        let spec = SpecMap::from_iter([("SLOTS_PER_EPOCH", SpecValue::Text("many".to_owned()))]);

        assert_eq!(
            spec.uint("SLOTS_PER_EPOCH"),
            Err(ConfigError::WrongType {
                key: "SLOTS_PER_EPOCH",
                expected: "unsigned integer",
                found: "text",
            }),
        );
    }

    #[test]
    fn required_uint_reports_missing_key() {
        assert_eq!(
            SpecMap::default().required_uint("SLOTS_PER_EPOCH"),
            Err(ConfigError::MissingKey {
                key: "SLOTS_PER_EPOCH",
            }),
        );
    }

    #[test]
    fn uint_or_falls_back_only_when_absent() -> Result<(), ConfigError> {
        let spec = SpecMap::from_iter([("TIMELY_HEAD_WEIGHT", SpecValue::Uint(20))]);

        assert_eq!(spec.uint_or("TIMELY_HEAD_WEIGHT", 14)?, 20);
        assert_eq!(spec.uint_or("TIMELY_SOURCE_WEIGHT", 14)?, 14);

        Ok(())
    }
}
