use crate::foundation::SyncError;
use std::fmt;

/// Version byte prepended to the script hash in the checksummed text form.
const ADDRESS_VERSION: u8 = 0x35;

/// 20-byte contract script hash. Two textual forms occur on-chain:
/// little-endian hex (40 chars) and the Base58Check address string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScriptHash([u8; 20]);

impl ScriptHash {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Decodes the fixed-width little-endian hex form.
    pub fn from_le_hex(value: &str) -> Result<Self, SyncError> {
        let raw = hex::decode(value)?;
        let mut bytes: [u8; 20] = raw
            .try_into()
            .map_err(|raw: Vec<u8>| SyncError::Encoding(format!("expected 20 bytes of script hash, got {}", raw.len())))?;
        bytes.reverse();
        Ok(Self(bytes))
    }

    pub fn to_le_hex(&self) -> String {
        let mut bytes = self.0;
        bytes.reverse();
        hex::encode(bytes)
    }

    /// Decodes the checksummed address string form.
    pub fn from_address(value: &str) -> Result<Self, SyncError> {
        let raw = bs58::decode(value)
            .with_check(Some(ADDRESS_VERSION))
            .into_vec()
            .map_err(|err| SyncError::Encoding(format!("base58check decode error: {}", err)))?;
        // First byte is the version, already validated by the decoder.
        let bytes: [u8; 20] = raw[1..]
            .try_into()
            .map_err(|_| SyncError::Encoding(format!("expected 20 bytes of address payload, got {}", raw.len() - 1)))?;
        Ok(Self(bytes))
    }

    pub fn to_address(&self) -> String {
        bs58::encode(&self.0).with_check_version(ADDRESS_VERSION).into_string()
    }
}

impl fmt::Display for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptHash({})", self)
    }
}
