//! Attachment configuration
//!
//! The value bound at attachment time is either a boolean shorthand or a
//! partial options object. Both resolve to a fully populated
//! [`FocusOptions`]. Resolution never fails: unexpected shapes and field
//! types fall back to the defaults.
//!
//! ```rust
//! use autofocus::{FocusConfig, FocusOptions};
//!
//! let config: FocusConfig = serde_json::from_str(r#"{ "target": ".custom" }"#).unwrap();
//! assert_eq!(
//!     config.resolve(),
//!     FocusOptions { target: ".custom".to_string(), enabled: true }
//! );
//! ```

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Selector for generic text-entry controls
pub const DEFAULT_TARGET: &str = "input, textarea";

/// Resolved options for one attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusOptions {
    /// Selector for the element that receives focus
    pub target: String,
    /// Whether the behavior is active at all
    pub enabled: bool,
}

impl Default for FocusOptions {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            enabled: true,
        }
    }
}

impl FocusOptions {
    /// Enabled with a non-empty target selector
    pub fn is_active(&self) -> bool {
        self.enabled && !self.target.is_empty()
    }
}

/// Options object with every field optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialFocusOptions {
    pub target: Option<String>,
    pub enabled: Option<bool>,
}

impl PartialFocusOptions {
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Read recognized fields from a JSON value
    ///
    /// Fields of the wrong type are treated as absent; non-objects yield an
    /// empty record.
    pub fn from_value(value: &Value) -> Self {
        let Value::Object(map) = value else {
            return Self::default();
        };
        Self {
            target: map.get("target").and_then(Value::as_str).map(str::to_string),
            enabled: map.get("enabled").and_then(Value::as_bool),
        }
    }
}

/// Configuration value supplied when attaching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusConfig {
    /// `true` / `false` shorthand, keeps the default target
    Toggle(bool),
    Options(PartialFocusOptions),
}

impl Default for FocusConfig {
    fn default() -> Self {
        FocusConfig::Toggle(true)
    }
}

impl FocusConfig {
    /// Fill in defaults to produce the canonical options
    pub fn resolve(&self) -> FocusOptions {
        let defaults = FocusOptions::default();
        match self {
            FocusConfig::Toggle(enabled) => FocusOptions {
                enabled: *enabled,
                ..defaults
            },
            FocusConfig::Options(partial) => FocusOptions {
                target: partial.target.clone().unwrap_or(defaults.target),
                enabled: partial.enabled.unwrap_or(defaults.enabled),
            },
        }
    }

    /// Interpret any JSON value: booleans are the shorthand, everything else
    /// is read as a (possibly empty) options object
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(enabled) => FocusConfig::Toggle(*enabled),
            other => FocusConfig::Options(PartialFocusOptions::from_value(other)),
        }
    }
}

impl<'de> Deserialize<'de> for FocusConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(FocusConfig::from_value(&value))
    }
}

impl From<bool> for FocusConfig {
    fn from(enabled: bool) -> Self {
        FocusConfig::Toggle(enabled)
    }
}

impl From<PartialFocusOptions> for FocusConfig {
    fn from(partial: PartialFocusOptions) -> Self {
        FocusConfig::Options(partial)
    }
}

impl From<FocusOptions> for FocusConfig {
    fn from(options: FocusOptions) -> Self {
        FocusConfig::Options(PartialFocusOptions {
            target: Some(options.target),
            enabled: Some(options.enabled),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(target: &str, enabled: bool) -> FocusOptions {
        FocusOptions {
            target: target.to_string(),
            enabled,
        }
    }

    #[test]
    fn test_boolean_shorthand() {
        assert_eq!(FocusConfig::from(true).resolve(), options("input, textarea", true));
        assert_eq!(FocusConfig::from(false).resolve(), options("input, textarea", false));
    }

    #[test]
    fn test_partial_merge() {
        let config = FocusConfig::from(PartialFocusOptions::default().target(".custom"));
        assert_eq!(config.resolve(), options(".custom", true));

        let config = FocusConfig::from(PartialFocusOptions::default().enabled(false));
        assert_eq!(config.resolve(), options(DEFAULT_TARGET, false));

        assert_eq!(
            FocusConfig::Options(PartialFocusOptions::default()).resolve(),
            FocusOptions::default()
        );
    }

    #[test]
    fn test_empty_target_is_kept_but_inactive() {
        let resolved = FocusConfig::from(PartialFocusOptions::default().target("")).resolve();
        assert_eq!(resolved.target, "");
        assert!(!resolved.is_active());
        assert!(FocusOptions::default().is_active());
        assert!(!options(DEFAULT_TARGET, false).is_active());
    }

    #[test]
    fn test_full_options_roundtrip_through_config() {
        let full = options("#name", false);
        assert_eq!(FocusConfig::from(full.clone()).resolve(), full);
    }

    #[test]
    fn test_deserialize_shapes() {
        let parse = |value: Value| serde_json::from_value::<FocusConfig>(value).unwrap().resolve();

        assert_eq!(parse(json!(false)), options(DEFAULT_TARGET, false));
        assert_eq!(parse(json!({ "target": ".x" })), options(".x", true));
        assert_eq!(parse(json!({ "enabled": false, "extra": 1 })), options(DEFAULT_TARGET, false));
        assert_eq!(parse(json!(null)), FocusOptions::default());
        assert_eq!(parse(json!("textarea")), FocusOptions::default());
        assert_eq!(parse(json!([1, 2])), FocusOptions::default());
    }

    #[test]
    fn test_wrong_field_types_default() {
        let config = FocusConfig::from_value(&json!({ "target": 42, "enabled": "no" }));
        assert_eq!(config, FocusConfig::Options(PartialFocusOptions::default()));
        assert_eq!(config.resolve(), FocusOptions::default());
    }

    #[test]
    fn test_default_config_enables() {
        assert_eq!(FocusConfig::default().resolve(), FocusOptions::default());
    }
}
