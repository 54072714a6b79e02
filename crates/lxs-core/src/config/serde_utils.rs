//! Shared serialization/deserialization utilities for configuration
//!
//! This module provides common serde helpers used across configuration types.

use std::time::Duration;

use serde::{de, Deserialize, Deserializer, Serializer};

/// Seconds as written in a config file: `30` or `0.5`
#[derive(Deserialize)]
#[serde(untagged)]
enum Seconds {
    Whole(u64),
    Fractional(f64),
}

impl Seconds {
    fn into_duration<E: de::Error>(self) -> Result<Duration, E> {
        match self {
            Seconds::Whole(secs) => Ok(Duration::from_secs(secs)),
            Seconds::Fractional(secs) => Duration::try_from_secs_f64(secs)
                .map_err(|_| E::custom(format!("invalid duration: {} seconds", secs))),
        }
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    if duration.subsec_nanos() == 0 {
        serializer.serialize_u64(duration.as_secs())
    } else {
        serializer.serialize_f64(duration.as_secs_f64())
    }
}

/// Helper module for Duration serialization as seconds
///
/// Whole durations are written as an integer, which is more human-readable
/// in TOML configuration files; sub-second durations as a float.
pub mod duration_secs {
    use super::*;

    /// Serialize a Duration as seconds
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serialize_secs(duration, serializer)
    }

    /// Deserialize a Duration from integer or fractional seconds
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Seconds::deserialize(deserializer)?.into_duration()
    }
}

/// Same as [`duration_secs`] for optional durations
///
/// TOML has no null, so `None` is written by omitting the field; pair this
/// with `#[serde(default, skip_serializing_if = "Option::is_none")]`.
pub mod option_duration_secs {
    use super::*;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serialize_secs(d, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<Seconds>::deserialize(deserializer)?
            .map(Seconds::into_duration)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TestConfig {
        #[serde(with = "duration_secs")]
        timeout: Duration,
        #[serde(
            default,
            with = "option_duration_secs",
            skip_serializing_if = "Option::is_none"
        )]
        deadline: Option<Duration>,
    }

    #[test]
    fn test_duration_secs_serialize() {
        let config = TestConfig {
            timeout: Duration::from_secs(30),
            deadline: None,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"timeout":30}"#);
    }

    #[test]
    fn test_duration_secs_deserialize() {
        let json = r#"{"timeout":60,"deadline":5}"#;
        let config: TestConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.deadline, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_subsecond_duration_serialized_as_float() {
        let config = TestConfig {
            timeout: Duration::from_millis(500),
            deadline: Some(Duration::from_millis(2500)),
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"timeout":0.5,"deadline":2.5}"#);

        let back: TestConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_negative_duration_rejected() {
        assert!(toml::from_str::<TestConfig>("timeout = -1.5").is_err());
    }

    #[test]
    fn test_optional_duration_missing() {
        let config: TestConfig = toml::from_str("timeout = 1").unwrap();
        assert_eq!(config.deadline, None);
    }
}
