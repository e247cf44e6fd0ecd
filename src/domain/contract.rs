use crate::domain::address::ScriptHash;
use crate::domain::manifest::ManifestGroup;

/// On-chain contract snapshot. Immutable once read; orchestrators re-fetch a
/// fresh one every iteration instead of holding it across polls.
#[derive(Clone, Debug, PartialEq)]
pub struct ContractState {
    pub script_hash: ScriptHash,
    pub nef_checksum: u32,
    pub manifest_name: String,
    pub manifest_groups: Vec<ManifestGroup>,
}
