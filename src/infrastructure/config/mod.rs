//! Static configuration consumed by the engine. Parsing of CLI flags and the
//! wiring of key material stay with the embedding application; this module
//! only loads, defaults and validates the declarative part.

use crate::domain::keys::GroupPublicKey;
use crate::foundation::SyncError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:10332";
const DEFAULT_SEED_DOMAINS: &[&str] = &["bootstrap", "services"];

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub committee: CommitteeConfig,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub rpc_url: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Contact string embedded into seed domain records at first deployment.
    #[serde(default)]
    pub system_contact: String,
    /// Root domains registered together with the contract deployment.
    #[serde(default)]
    pub seed_domains: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CommitteeConfig {
    /// Hex-encoded compressed public keys of the committee members.
    #[serde(default)]
    pub member_pubkeys: Vec<String>,
}

pub fn load_from_toml(path: &Path) -> Result<SyncConfig, SyncError> {
    let contents = fs::read_to_string(path)
        .map_err(|err| SyncError::Config(format!("failed to read config {}: {}", path.display(), err)))?;
    let mut config: SyncConfig = toml::from_str(&contents)?;
    apply_defaults(&mut config);
    Ok(config)
}

pub fn load_default() -> SyncConfig {
    let mut config = SyncConfig::default();
    apply_defaults(&mut config);
    config
}

fn apply_defaults(config: &mut SyncConfig) {
    if config.ledger.rpc_url.trim().is_empty() {
        config.ledger.rpc_url = DEFAULT_RPC_URL.to_string();
    }
    if config.registry.seed_domains.is_empty() {
        config.registry.seed_domains = DEFAULT_SEED_DOMAINS.iter().map(|d| d.to_string()).collect();
    }
}

impl SyncConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.ledger.rpc_url.trim().is_empty() {
            errors.push("ledger.rpc_url must not be empty".to_string());
        }

        if self.registry.system_contact.trim().is_empty() {
            errors.push("registry.system_contact must not be empty".to_string());
        } else if !self.registry.system_contact.contains('@') {
            errors.push(format!("invalid registry.system_contact: {}", self.registry.system_contact));
        }

        for domain in &self.registry.seed_domains {
            if domain.trim().is_empty() || domain.contains(char::is_whitespace) {
                errors.push(format!("invalid registry.seed_domains entry: '{}'", domain));
            }
        }

        for key in &self.committee.member_pubkeys {
            if GroupPublicKey::from_hex(key).is_err() {
                errors.push(format!("invalid committee.member_pubkeys entry: {}", key));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn committee_keys(&self) -> Result<Vec<GroupPublicKey>, SyncError> {
        self.committee.member_pubkeys.iter().map(|key| GroupPublicKey::from_hex(key)).collect()
    }
}
