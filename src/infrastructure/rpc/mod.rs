use crate::domain::contract::ContractState;
use crate::domain::keys::GroupPublicKey;
use crate::domain::manifest::{ContractNef, Manifest};
use crate::domain::ScriptHash;
use crate::foundation::{SubscriptionId, SyncError, TxHash};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Chain protocol parameters the engine needs for pacing.
#[derive(Clone, Copy, Debug)]
pub struct ProtocolConfig {
    pub ms_per_block: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct BlockHeader {
    pub height: u32,
}

/// Live new-block subscription: push notifications plus the identifier to
/// cancel them with.
pub struct BlockSubscription {
    pub id: SubscriptionId,
    pub blocks: mpsc::Receiver<BlockHeader>,
}

/// Receipt of an accepted transaction submission.
#[derive(Clone, Copy, Debug)]
pub struct SentTx {
    pub hash: TxHash,
    pub valid_until_block: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct TxOutcome {
    pub hash: TxHash,
}

/// Stack-item model of read-only invocation results and call arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Null,
    Int(i64),
    Bytes(Vec<u8>),
    String(String),
    Array(Vec<Value>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "integer",
            Value::Bytes(_) => "byte string",
            Value::String(_) => "string",
            Value::Array(_) => "array",
        }
    }

    /// Interprets the item as text, accepting both byte-string and string
    /// stack representations.
    pub fn into_text(self) -> Option<String> {
        match self {
            Value::String(text) => Some(text),
            Value::Bytes(bytes) => String::from_utf8(bytes).ok(),
            _ => None,
        }
    }
}

/// Capability surface of the ledger client the engine depends on. The client
/// owns connection handling, signing accounts and timeout policy; it must be
/// safe for concurrent use.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn protocol_config(&self) -> Result<ProtocolConfig, SyncError>;

    async fn block_count(&self) -> Result<u32, SyncError>;

    async fn subscribe_blocks(&self) -> Result<BlockSubscription, SyncError>;

    async fn unsubscribe(&self, id: &SubscriptionId) -> Result<(), SyncError>;

    /// Contract state by fixed numeric identifier. `Ok(None)` means the
    /// contract is not deployed; errors are transient RPC failures.
    async fn contract_state_by_id(&self, id: i32) -> Result<Option<ContractState>, SyncError>;

    async fn contract_state_by_hash(&self, hash: &ScriptHash) -> Result<Option<ContractState>, SyncError>;

    /// Read-only contract method invocation.
    async fn invoke_read(&self, contract: &ScriptHash, method: &str, args: Vec<Value>) -> Result<Value, SyncError>;

    /// Submits a contract deployment signed by the client's local account.
    async fn submit_deploy(&self, nef: &ContractNef, manifest: &Manifest, data: Value) -> Result<SentTx, SyncError>;

    /// Dry-runs the committee-notarized call without submitting it, so that
    /// node-side rejections ("already updated") surface immediately.
    async fn probe_notarized_call(
        &self,
        committee: &[GroupPublicKey],
        contract: &ScriptHash,
        method: &str,
        args: Vec<Value>,
    ) -> Result<(), SyncError>;

    /// Submits the call through the multi-party notarization path.
    async fn submit_notarized_call(
        &self,
        committee: &[GroupPublicKey],
        contract: &ScriptHash,
        method: &str,
        args: Vec<Value>,
    ) -> Result<SentTx, SyncError>;

    /// Resolves when any of `hashes` reaches a terminal on-chain outcome, or
    /// fails once `valid_until_block` has passed without one.
    async fn wait_any(&self, valid_until_block: u32, hashes: &[TxHash]) -> Result<TxOutcome, SyncError>;
}
