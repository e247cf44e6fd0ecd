use crate::domain::address::ScriptHash;
use crate::domain::keys::{GroupKeypair, GroupPublicKey, GroupSignature};
use serde::{Deserialize, Serialize};

const CONTRACT_ADDRESS_DOMAIN_V1: &[u8] = b"registry:contract-address:v1:";

/// Compiled contract executable identified by its content checksum.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractNef {
    pub bytecode: Vec<u8>,
    pub checksum: u32,
}

impl ContractNef {
    pub fn from_bytecode(bytecode: Vec<u8>) -> Self {
        let digest = blake3::hash(&bytecode);
        let mut word = [0u8; 4];
        word.copy_from_slice(&digest.as_bytes()[..4]);
        Self { bytecode, checksum: u32::from_le_bytes(word) }
    }
}

/// Committee group entry of a manifest: the group public key plus its
/// signature over the deployed contract's computed address bytes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ManifestGroup {
    pub public_key: GroupPublicKey,
    pub signature: GroupSignature,
}

/// Declarative contract descriptor. The engine only ever touches `groups`;
/// everything else it carries through unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<ManifestGroup>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Manifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), groups: Vec::new(), extra: serde_json::Map::new() }
    }
}

/// Deterministic address the contract will occupy once deployed by
/// `deployer` with the given executable checksum and manifest name.
pub fn compute_contract_address(deployer: &ScriptHash, checksum: u32, name: &str) -> ScriptHash {
    let mut buf = Vec::with_capacity(CONTRACT_ADDRESS_DOMAIN_V1.len() + 20 + 4 + name.len());
    buf.extend_from_slice(CONTRACT_ADDRESS_DOMAIN_V1);
    buf.extend_from_slice(deployer.as_bytes());
    buf.extend_from_slice(&checksum.to_le_bytes());
    buf.extend_from_slice(name.as_bytes());
    let digest = blake3::hash(&buf);
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest.as_bytes()[..20]);
    ScriptHash::new(address)
}

/// Attaches or refreshes the committee group entry inside `manifest`: signs
/// the contract address computed from (deployer, checksum, name) with the
/// group key and inserts the `{public_key, signature}` pair, replacing an
/// existing entry for the same key in place. Idempotent.
pub fn set_group_in_manifest(manifest: &mut Manifest, nef: &ContractNef, group_key: &GroupKeypair, deployer: &ScriptHash) {
    let contract_address = compute_contract_address(deployer, nef.checksum, &manifest.name);
    let signature = group_key.sign_address(&contract_address);
    let public_key = group_key.public_key();

    if let Some(entry) = manifest.groups.iter_mut().find(|entry| entry.public_key == public_key) {
        entry.signature = signature;
        return;
    }

    manifest.groups.push(ManifestGroup { public_key, signature });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::keys::verify_address_signature;

    fn nef() -> ContractNef {
        ContractNef::from_bytecode(vec![1, 2, 3, 4])
    }

    #[test]
    fn contract_address_is_deterministic() {
        let deployer = ScriptHash::new([1u8; 20]);
        let a = compute_contract_address(&deployer, 7, "Registry");
        let b = compute_contract_address(&deployer, 7, "Registry");
        assert_eq!(a, b);
        assert_ne!(a, compute_contract_address(&deployer, 8, "Registry"));
        assert_ne!(a, compute_contract_address(&deployer, 7, "Other"));
    }

    #[test]
    fn co_signing_inserts_one_valid_group_entry() {
        let deployer = ScriptHash::new([2u8; 20]);
        let key = GroupKeypair::generate();
        let nef = nef();
        let mut manifest = Manifest::new("Registry");

        set_group_in_manifest(&mut manifest, &nef, &key, &deployer);
        assert_eq!(manifest.groups.len(), 1);

        let address = compute_contract_address(&deployer, nef.checksum, &manifest.name);
        let entry = &manifest.groups[0];
        assert_eq!(entry.public_key, key.public_key());
        assert!(verify_address_signature(&entry.public_key, &address, &entry.signature));
    }

    #[test]
    fn re_signing_replaces_in_place() {
        let deployer = ScriptHash::new([3u8; 20]);
        let key = GroupKeypair::generate();
        let nef = nef();
        let mut manifest = Manifest::new("Registry");

        set_group_in_manifest(&mut manifest, &nef, &key, &deployer);
        let first = manifest.clone();
        set_group_in_manifest(&mut manifest, &nef, &key, &deployer);
        assert_eq!(manifest, first);

        let other = GroupKeypair::generate();
        set_group_in_manifest(&mut manifest, &nef, &other, &deployer);
        assert_eq!(manifest.groups.len(), 2);
    }

    #[test]
    fn unknown_manifest_fields_pass_through_json() {
        let json = r#"{"name":"Registry","groups":[],"abi":{"methods":[]},"features":{}}"#;
        let manifest: Manifest = serde_json::from_str(json).unwrap();
        assert_eq!(manifest.name, "Registry");
        let back = serde_json::to_value(&manifest).unwrap();
        assert_eq!(back.get("abi").unwrap(), &serde_json::json!({"methods":[]}));
    }

    #[test]
    fn nef_checksum_tracks_content() {
        assert_eq!(nef().checksum, nef().checksum);
        assert_ne!(nef().checksum, ContractNef::from_bytecode(vec![4, 3, 2, 1]).checksum);
    }
}
