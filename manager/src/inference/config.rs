//! Per-instance model configuration.
//!
//! [`ModelConfig`] is an opaque bag of parameters (credentials, model name,
//! limits). The manager binds one to each instance at creation time and never
//! looks inside; only the model's factory interprets it.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Key fragments whose values are hidden from `Debug` output.
const REDACTED_KEY_FRAGMENTS: &[&str] = &["key", "secret", "token", "password"];

/// Errors raised when a factory rejects a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required parameter is absent
    #[error("missing required parameter '{0}'")]
    MissingKey(String),
    /// A parameter is present but unusable
    #[error("invalid value for '{key}': {reason}")]
    InvalidValue {
        /// The offending parameter name.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
    /// The configuration was rejected as a whole
    #[error("configuration rejected: {0}")]
    Rejected(String),
}

/// Opaque key-value configuration bundle for one model instance.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelConfig {
    params: BTreeMap<String, Value>,
}

impl ModelConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the configuration with `key` set to `value`.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Raw parameter lookup.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// String parameter lookup.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Unsigned integer parameter lookup.
    #[must_use]
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    /// Floating point parameter lookup. Integers are widened.
    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    /// Boolean parameter lookup.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    /// Returns a string parameter or a [`ConfigError`] naming what is wrong.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if the key is absent and
    /// [`ConfigError::InvalidValue`] if it is not a string.
    pub fn require_str(&self, key: &str) -> Result<&str, ConfigError> {
        match self.get(key) {
            None => Err(ConfigError::MissingKey(key.to_string())),
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                reason: format!("expected a string, found {other}"),
            }),
        }
    }

    /// Returns a string parameter wrapped as a secret, for credentials.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ModelConfig::require_str`].
    pub fn secret(&self, key: &str) -> Result<SecretString, ConfigError> {
        self.require_str(key).map(|s| SecretString::from(s.to_owned()))
    }

    /// Returns `true` if the parameter is set.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Iterates over parameter names in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ModelConfig
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<BTreeMap<String, Value>> for ModelConfig {
    fn from(params: BTreeMap<String, Value>) -> Self {
        Self { params }
    }
}

fn is_sensitive(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    REDACTED_KEY_FRAGMENTS
        .iter()
        .any(|fragment| key.contains(fragment))
}

impl fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.params {
            if is_sensitive(key) {
                map.entry(key, &"<redacted>");
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}
