use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use thiserror::Error;

/// Number of hex digits in a server-issued session id.
pub const SESSION_ID_LEN: usize = 32;

/// Opaque identifier for a server-side upload session.
///
/// The server issues one per analyzed photo set and accepts it back only in
/// this exact shape: `SESSION_ID_LEN` lowercase hex digits. Anything else is
/// rejected at parse time so an invalid token never reaches the host form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("session id must be {SESSION_ID_LEN} lowercase hex digits")]
pub struct InvalidSessionId;

impl SessionId {
    pub fn parse(raw: &str) -> Result<Self, InvalidSessionId> {
        let valid = raw.len() == SESSION_ID_LEN
            && raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(InvalidSessionId)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = InvalidSessionId;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
