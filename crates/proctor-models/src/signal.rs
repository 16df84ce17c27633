//! Signal keys naming each monitored condition.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Well-known signal key names used by the default proctoring setup.
pub mod keys {
    pub const PHONE: &str = "phone";
    pub const BOOK: &str = "book";
    pub const AUDIO_DEVICE: &str = "audio_device";
    pub const MULTIPLE_PEOPLE: &str = "multiple_people";
    pub const NO_PERSON: &str = "no_person";
    pub const LOOKING_AWAY: &str = "looking_away";
    pub const LOOKING_DOWN: &str = "looking_down";
    pub const LOOKING_UP: &str = "looking_up";
    pub const LOOKING_LEFT: &str = "looking_left";
    pub const LOOKING_RIGHT: &str = "looking_right";
    pub const PARTIAL_FACE: &str = "partial_face";
    pub const FACE_HIDDEN: &str = "face_hidden";
    pub const FAKE_PRESENCE: &str = "fake_presence";
}

/// Identifier naming one monitored condition.
///
/// The universe of keys is fixed when the pipeline is configured.
/// Deserialization goes through [`FromStr`], so blank keys and keys with
/// inner whitespace are rejected when configuration is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct SignalKey(String);

impl SignalKey {
    /// Create from an existing string.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable label ("looking_away" -> "Looking Away").
    pub fn label(&self) -> String {
        self.0
            .split('_')
            .filter(|part| !part.is_empty())
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for SignalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SignalKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SignalKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for SignalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for SignalKey {
    type Err = SignalKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(SignalKeyParseError(s.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl<'de> Deserialize<'de> for SignalKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Error)]
#[error("Invalid signal key: {0:?}")]
pub struct SignalKeyParseError(String);
