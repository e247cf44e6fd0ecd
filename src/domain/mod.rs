//! Domain layer: chain-facing value types and the manifest co-signing logic.

pub mod address;
pub mod contract;
pub mod keys;
pub mod manifest;
pub mod record;
pub mod version;

pub use address::ScriptHash;
pub use contract::ContractState;
pub use keys::{GroupKeypair, GroupPublicKey, GroupSignature};
pub use manifest::{compute_contract_address, set_group_in_manifest, ContractNef, Manifest, ManifestGroup};
pub use record::DomainRecord;
pub use version::ContractVersion;
