//! Session codes: the 6-character identifiers players type to join.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ProtocolError;

/// Characters a session code may contain. Ambiguous-looking symbols
/// (I, O, 0, 1) are excluded so codes survive being read aloud or
/// copied by hand.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of every session code.
pub const CODE_LENGTH: usize = 6;

/// A validated session code. Always stored upper-case; input is
/// case-insensitive and trimmed before validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionCode(String);

impl SessionCode {
    /// Generates a random code. Uniqueness among live sessions is NOT
    /// guaranteed here — the session manager handles collisions by
    /// regenerating when the store reports the path as taken.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code: String = (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Parses user input into a code: trims, upper-cases, then checks
    /// length and alphabet.
    pub fn parse(input: &str) -> Result<Self, ProtocolError> {
        let normalized = input.trim().to_uppercase();
        if normalized.len() != CODE_LENGTH
            || !normalized.bytes().all(|b| CODE_ALPHABET.contains(&b))
        {
            return Err(ProtocolError::InvalidCodeFormat(input.to_string()));
        }
        Ok(Self(normalized))
    }

    /// The code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SessionCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// =========================================================================
// Tests
// =========================================================================
