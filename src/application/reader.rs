use crate::domain::contract::ContractState;
use crate::domain::record::parse_contract_record;
use crate::domain::version::ContractVersion;
use crate::domain::ScriptHash;
use crate::foundation::{Result, SyncError};
use crate::infrastructure::rpc::{Ledger, Value};
use std::sync::Arc;

/// The registry contract always occupies this identifier on the chain.
pub const REGISTRY_CONTRACT_ID: i32 = 1;

/// TXT record type of the registry's resolve method.
pub const RECORD_TYPE_TXT: i64 = 16;

const METHOD_RESOLVE: &str = "resolve";
const METHOD_VERSION: &str = "version";

/// Read-only view of the registry and the contracts it records.
pub struct RegistryReader {
    ledger: Arc<dyn Ledger>,
}

impl RegistryReader {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// State of the registry contract at its well-known identifier.
    /// `Ok(None)` means the contract is not deployed yet.
    pub async fn registry_state(&self) -> Result<Option<ContractState>> {
        self.ledger
            .contract_state_by_id(REGISTRY_CONTRACT_ID)
            .await
            .map_err(|err| SyncError::rpc(format!("read contract state by id={}", REGISTRY_CONTRACT_ID), err))
    }

    /// Looks up the first record of the given registry domain.
    pub async fn lookup_domain_record(&self, registry: &ScriptHash, domain: &str) -> Result<String> {
        let args = vec![Value::String(domain.to_string()), Value::Int(RECORD_TYPE_TXT)];
        let item = match self.ledger.invoke_read(registry, METHOD_RESOLVE, args).await {
            Ok(item) => item,
            Err(err) if err.is_domain_not_found() => return Err(SyncError::MissingDomain(domain.to_string())),
            Err(err) => return Err(SyncError::rpc(format!("call '{}' method of the registry contract", METHOD_RESOLVE), err)),
        };

        match item {
            Value::Null => Err(SyncError::MissingDomainRecord(domain.to_string())),
            Value::Array(values) => match values.into_iter().next() {
                None => Err(SyncError::MissingDomainRecord(domain.to_string())),
                Some(first) => {
                    let kind = first.kind();
                    first.into_text().ok_or_else(|| SyncError::UnexpectedResponse {
                        method: METHOD_RESOLVE.to_string(),
                        details: format!("expected byte string as the 1st array item, got {}", kind),
                    })
                }
            },
            other => Err(SyncError::UnexpectedResponse {
                method: METHOD_RESOLVE.to_string(),
                details: format!("expected array, got {}", other.kind()),
            }),
        }
    }

    /// State of the contract recorded in the registry under `domain`.
    pub async fn contract_by_domain(&self, registry: &ScriptHash, domain: &str) -> Result<ContractState> {
        let record = self.lookup_domain_record(registry, domain).await?;
        let address = parse_contract_record(&record)?;

        let state = self
            .ledger
            .contract_state_by_hash(&address)
            .await
            .map_err(|err| SyncError::rpc(format!("get contract by address={}", address), err))?;

        state.ok_or(SyncError::UnknownContract { address: address.to_string() })
    }

    /// Version reported by the contract's `version` method, in packed
    /// integer form.
    pub async fn contract_version(&self, contract: &ScriptHash) -> Result<ContractVersion> {
        match self.ledger.invoke_read(contract, METHOD_VERSION, Vec::new()).await? {
            Value::Int(value) if value >= 0 => Ok(ContractVersion::from_packed(value as u64)),
            other => Err(SyncError::UnexpectedResponse {
                method: METHOD_VERSION.to_string(),
                details: format!("expected non-negative integer, got {}", other.kind()),
            }),
        }
    }
}
