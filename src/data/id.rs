use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque server identifier. The API hands out numbers today, but nothing
/// here depends on that: ids are compared and rendered verbatim.
#[derive(Serialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn new(raw: impl Into<String>) -> Self {
        Id(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Id {
    fn from(raw: &str) -> Self {
        Id::new(raw)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Unsigned(u64),
            Signed(i64),
            // `3.0` prints as "3"
            Float(f64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Unsigned(n) => Id(n.to_string()),
            Raw::Signed(n) => Id(n.to_string()),
            Raw::Float(n) => Id(n.to_string()),
            Raw::Text(s) => Id(s),
        })
    }
}
