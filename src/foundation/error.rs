use crate::domain::version::ContractVersion;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Rpc,
    MissingDomain,
    MissingDomainRecord,
    InvalidDomainRecord,
    UnknownContract,
    UnexpectedResponse,
    WrongContractName,
    ContractMissing,
    VersionChecksumMismatch,
    AlreadyUpdated,
    InsufficientFunds,
    DepositExpiring,
    CryptoError,
    EncodingError,
    SerializationError,
    ConfigError,
    Cancelled,
    Message,
}

#[derive(Debug, Clone, Error)]
pub enum SyncError {
    #[error("ledger RPC failed during {operation}: {details}")]
    Rpc { operation: String, details: String },

    #[error("missing domain '{0}'")]
    MissingDomain(String),

    #[error("missing record of the domain '{0}'")]
    MissingDomainRecord(String),

    #[error("invalid contract domain record '{record}': {details}")]
    InvalidDomainRecord { record: String, details: String },

    #[error("contract recorded in the registry is missing on the chain: address={address}")]
    UnknownContract { address: String },

    #[error("malformed/unsupported response of the '{method}' call: {details}")]
    UnexpectedResponse { method: String, details: String },

    #[error("wrong name of the contract with id={id}: expected '{expected}', got '{actual}'")]
    WrongContractName { id: i32, expected: String, actual: String },

    #[error("missing required registry contract on the chain")]
    ContractMissing,

    #[error("local and on-chain contracts have different checksums but the same version '{version}'")]
    VersionChecksumMismatch { version: ContractVersion },

    #[error("contract has already been updated")]
    AlreadyUpdated,

    #[error("insufficient funds: {details}")]
    InsufficientFunds { details: String },

    #[error("notary deposit expires soon: {details}")]
    DepositExpiring { details: String },

    #[error("crypto error during {operation}: {details}")]
    Crypto { operation: String, details: String },

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("{format} serialization error: {details}")]
    Serialization { format: String, details: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("cancelled while waiting for {operation}")]
    Cancelled { operation: String },

    #[error("{0}")]
    Message(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    pub fn code(&self) -> ErrorCode {
        match self {
            SyncError::Rpc { .. } => ErrorCode::Rpc,
            SyncError::MissingDomain(_) => ErrorCode::MissingDomain,
            SyncError::MissingDomainRecord(_) => ErrorCode::MissingDomainRecord,
            SyncError::InvalidDomainRecord { .. } => ErrorCode::InvalidDomainRecord,
            SyncError::UnknownContract { .. } => ErrorCode::UnknownContract,
            SyncError::UnexpectedResponse { .. } => ErrorCode::UnexpectedResponse,
            SyncError::WrongContractName { .. } => ErrorCode::WrongContractName,
            SyncError::ContractMissing => ErrorCode::ContractMissing,
            SyncError::VersionChecksumMismatch { .. } => ErrorCode::VersionChecksumMismatch,
            SyncError::AlreadyUpdated => ErrorCode::AlreadyUpdated,
            SyncError::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,
            SyncError::DepositExpiring { .. } => ErrorCode::DepositExpiring,
            SyncError::Crypto { .. } => ErrorCode::CryptoError,
            SyncError::Encoding(_) => ErrorCode::EncodingError,
            SyncError::Serialization { .. } => ErrorCode::SerializationError,
            SyncError::Config(_) => ErrorCode::ConfigError,
            SyncError::Cancelled { .. } => ErrorCode::Cancelled,
            SyncError::Message(_) => ErrorCode::Message,
        }
    }

    pub fn rpc(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        SyncError::Rpc { operation: operation.into(), details: err.to_string() }
    }

    pub fn cancelled(operation: impl Into<String>) -> Self {
        SyncError::Cancelled { operation: operation.into() }
    }

    /// True for the node's "contract has already been updated" response,
    /// whether surfaced structurally or inside an opaque RPC error.
    pub fn is_already_updated(&self) -> bool {
        matches!(self, SyncError::AlreadyUpdated) || self.rpc_details_contain("already updated")
    }

    /// True when the node rejected a submission for lack of fee balance.
    pub fn is_insufficient_funds(&self) -> bool {
        matches!(self, SyncError::InsufficientFunds { .. }) || self.rpc_details_contain("insufficient funds")
    }

    /// True when the shared notary deposit is about to expire.
    pub fn is_deposit_expiring(&self) -> bool {
        matches!(self, SyncError::DepositExpiring { .. }) || self.rpc_details_contain("deposit expires")
    }

    /// True for the registry's "token not found" resolve failure, which means
    /// the queried domain does not exist.
    pub fn is_domain_not_found(&self) -> bool {
        self.rpc_details_contain("token not found")
    }

    fn rpc_details_contain(&self, marker: &str) -> bool {
        match self {
            SyncError::Rpc { details, .. } => details.contains(marker),
            _ => false,
        }
    }
}

impl From<hex::FromHexError> for SyncError {
    fn from(err: hex::FromHexError) -> Self {
        SyncError::Encoding(format!("hex decode error: {}", err))
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        SyncError::Config(format!("TOML parsing error: {}", err))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization { format: "json".to_string(), details: err.to_string() }
    }
}

impl From<bincode::Error> for SyncError {
    fn from(err: bincode::Error) -> Self {
        SyncError::Serialization { format: "bincode".to_string(), details: err.to_string() }
    }
}

impl From<secp256k1::Error> for SyncError {
    fn from(err: secp256k1::Error) -> Self {
        SyncError::Crypto { operation: "secp256k1".to_string(), details: err.to_string() }
    }
}

// NOTE: Avoid adding generic "stringly" error conversions here.
// Use structured `SyncError` variants at the call site to preserve context.
