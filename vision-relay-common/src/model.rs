//! Model selection keys.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Caller-supplied selector for one of the two hosted model sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKey {
    #[serde(rename = "4b")]
    FourB,
    #[serde(rename = "27b")]
    TwentySevenB,
}

impl ModelKey {
    /// All model keys, in declaration order.
    pub const ALL: [ModelKey; 2] = [ModelKey::FourB, ModelKey::TwentySevenB];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKey::FourB => "4b",
            ModelKey::TwentySevenB => "27b",
        }
    }

    /// Environment variable holding the endpoint URL for this model.
    pub fn endpoint_env_var(&self) -> &'static str {
        match self {
            ModelKey::FourB => "ENDPOINT_URL_4B",
            ModelKey::TwentySevenB => "ENDPOINT_URL_27B",
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not a known model key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownModelKey(pub String);

impl fmt::Display for UnknownModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown model key: {}", self.0)
    }
}

impl std::error::Error for UnknownModelKey {}

impl FromStr for ModelKey {
    type Err = UnknownModelKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "4b" => Ok(ModelKey::FourB),
            "27b" => Ok(ModelKey::TwentySevenB),
            other => Err(UnknownModelKey(other.to_string())),
        }
    }
}
