//! Values that must never be rendered in plain text.

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use std::fmt;

/// Placeholder printed wherever a secret would have been.
pub const REDACTED: &str = "[secret]";

/// Secret wraps a value so that `Debug`, `Display` and `Serialize` never show it.
///
/// The only way to reach the value is [`Secret::expose`] or
/// [`Secret::into_inner`], which keeps every plain-text use greppable.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Secret<T>(T);

/// SecretString is the common case of a secret text value such as an account key.
pub type SecretString = Secret<String>;

impl<T> Secret<T> {
    /// Tag a value as secret.
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Borrow the underlying value.
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Unwrap the underlying value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> Serialize for Secret<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Secret<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_never_rendered() {
        let key = SecretString::new("abc123".to_string());

        assert_eq!(format!("{key}"), REDACTED);
        assert_eq!(format!("{key:?}"), REDACTED);
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"[secret]\"");
        assert_eq!(key.expose(), "abc123");
    }

    #[test]
    fn test_deserialize_keeps_value() {
        let key: SecretString = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(key.expose(), "abc123");
    }
}
