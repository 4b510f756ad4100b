use crate::model::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const MAX_SEGMENT_LEN: usize = 128;

/// Opaque name shared by both participants of a call.
///
/// The key doubles as a directory name in the chunk store, so it is
/// restricted to a single safe path segment.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionKey(String);

impl SessionKey {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        if is_safe_segment(raw) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(CoreError::InvalidSessionKey(raw.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for SessionKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for SessionKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SessionKey> for String {
    fn from(key: SessionKey) -> Self {
        key.0
    }
}

impl AsRef<str> for SessionKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// True when `raw` can be used verbatim as one directory name.
pub fn is_safe_segment(raw: &str) -> bool {
    !raw.is_empty()
        && raw.len() <= MAX_SEGMENT_LEN
        && raw != "."
        && raw != ".."
        && !raw.chars().any(|c| c == '/' || c == '\\' || c == '\0' || c.is_control())
}
