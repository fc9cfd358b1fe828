use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TypeError;

/// Caller-supplied identifier for a stored file.
///
/// pullfs never derives or generates identifiers on the write path: the
/// caller picks one and the store compares it for equality. Any of the
/// variants below may be used, and two ids are equal only when both the
/// variant and the payload match (`Text("1")` and `Int(1)` are distinct).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectId {
    /// Raw binary identifier (e.g. a 12-byte document id or a hash).
    Binary(Vec<u8>),
    /// UTF-8 string identifier.
    Text(String),
    /// UUID identifier.
    Uuid(Uuid),
    /// Integer identifier.
    Int(i64),
    /// Structured identifier built from other identifiers.
    Compound(Vec<ObjectId>),
}

impl ObjectId {
    /// A fresh time-ordered UUID v7 identifier, for callers that have no
    /// natural key of their own.
    pub fn random() -> Self {
        Self::Uuid(Uuid::now_v7())
    }

    /// Binary identifier from raw bytes.
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Binary(bytes.into())
    }

    /// Text identifier.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Parse a binary identifier from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self::Binary(bytes))
    }

    /// Parse a UUID identifier from its hyphenated string form.
    pub fn parse_uuid(s: &str) -> Result<Self, TypeError> {
        let uuid = Uuid::parse_str(s).map_err(|e| TypeError::InvalidUuid(e.to_string()))?;
        Ok(Self::Uuid(uuid))
    }

    /// Short human-readable form for logs (binary ids truncated to 4 bytes).
    pub fn short(&self) -> String {
        match self {
            Self::Binary(b) if b.len() > 4 => format!("bin:{}..", hex::encode(&b[..4])),
            other => other.to_string(),
        }
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({self})")
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(b) => write!(f, "bin:{}", hex::encode(b)),
            Self::Text(s) => write!(f, "str:{s}"),
            Self::Uuid(u) => write!(f, "uuid:{u}"),
            Self::Int(n) => write!(f, "int:{n}"),
            Self::Compound(parts) => {
                write!(f, "[")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{part}")?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<Uuid> for ObjectId {
    fn from(uuid: Uuid) -> Self {
        Self::Uuid(uuid)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for ObjectId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<Vec<u8>> for ObjectId {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(bytes)
    }
}
