use crate::foundation::SyncError;
use std::fmt;

pub type Hash32 = [u8; 32];

/// Transaction hash as reported by the ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub Hash32);

impl TxHash {
    pub fn as_bytes(&self) -> &Hash32 {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxHash({})", hex::encode(self.0))
    }
}

impl From<Hash32> for TxHash {
    fn from(value: Hash32) -> Self {
        Self(value)
    }
}

/// Opaque identifier of a new-block subscription held at the ledger client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionId(String);

impl SubscriptionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn parse_hex_32(value: &str) -> Result<Hash32, SyncError> {
    let raw = hex::decode(value.trim())?;
    raw.try_into()
        .map_err(|raw: Vec<u8>| SyncError::Encoding(format!("expected 32 bytes, got {}", raw.len())))
}
