use crate::domain::address::ScriptHash;
use crate::foundation::SyncError;

/// Registry record resolved for a domain name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DomainRecord {
    pub name: String,
    pub value: String,
}

impl DomainRecord {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }

    pub fn contract_address(&self) -> Result<ScriptHash, SyncError> {
        parse_contract_record(&self.value)
    }
}

/// Parses a contract record value. Historically two formats occur: the
/// little-endian hex script hash is tried first, the checksummed address
/// string second.
pub fn parse_contract_record(value: &str) -> Result<ScriptHash, SyncError> {
    if let Ok(hash) = ScriptHash::from_le_hex(value) {
        return Ok(hash);
    }
    ScriptHash::from_address(value).map_err(|_| SyncError::InvalidDomainRecord {
        record: value.to_string(),
        details: "neither a checksummed address nor a little-endian hex script hash".to_string(),
    })
}
