//! Checksums used to detect drift between built and persisted schemas

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::Result;

/// SHA256 checksum of canonical JSON
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Hash any serializable value through its compact JSON form
    ///
    /// Going through `serde_json::Value` sorts object keys, so documents that
    /// differ only in key order hash the same.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        let canonical = serde_json::to_value(value)?;
        Ok(Self::from_bytes(serde_json::to_string(&canonical)?.as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines
    pub fn short(&self) -> &str {
        &self.0[..12.min(self.0.len())]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
