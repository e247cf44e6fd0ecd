use async_trait::async_trait;
use registry_sync::application::deploy::CommitteeGroupKeySource;
use registry_sync::application::update::{DepositDeficiencyHandler, UpdateArgsBuilder};
use registry_sync::application::REGISTRY_CONTRACT_ID;
use registry_sync::domain::keys::GroupKeypair;
use registry_sync::domain::version::ContractVersion;
use registry_sync::domain::{ContractNef, ContractState, GroupPublicKey, Manifest, ScriptHash};
use registry_sync::foundation::{SubscriptionId, SyncError, TxHash};
use registry_sync::infrastructure::rpc::{
    BlockHeader, BlockSubscription, Ledger, ProtocolConfig, SentTx, TxOutcome, Value,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

/// Deterministic in-memory ledger driving the engine without a network.
/// Tests script submission outcomes, install contract state directly, and
/// pace the chain with `advance_block`/`emit_block`.
pub struct FakeLedger {
    state: Mutex<LedgerState>,
}

struct LedgerState {
    ms_per_block: u64,
    height: u32,
    next_subscription: u64,
    next_tx: u64,
    subscribers: HashMap<String, mpsc::Sender<BlockHeader>>,
    contracts_by_id: HashMap<i32, ContractState>,
    contracts_by_hash: HashMap<ScriptHash, ContractState>,
    records: HashMap<String, Vec<String>>,
    versions: HashMap<ScriptHash, u64>,
    deploy_results: VecDeque<Result<SentTx, SyncError>>,
    probe_results: VecDeque<Result<(), SyncError>>,
    notarize_results: VecDeque<Result<SentTx, SyncError>>,
    deploy_attempts: usize,
    notarize_attempts: usize,
    deployed: Vec<DeploySubmission>,
    confirmed: HashSet<TxHash>,
}

#[derive(Clone)]
pub struct DeploySubmission {
    pub nef: ContractNef,
    pub manifest: Manifest,
    pub data: Value,
    pub sent: SentTx,
}

impl FakeLedger {
    pub fn new(ms_per_block: u64) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                ms_per_block,
                height: 0,
                next_subscription: 0,
                next_tx: 0,
                subscribers: HashMap::new(),
                contracts_by_id: HashMap::new(),
                contracts_by_hash: HashMap::new(),
                records: HashMap::new(),
                versions: HashMap::new(),
                deploy_results: VecDeque::new(),
                probe_results: VecDeque::new(),
                notarize_results: VecDeque::new(),
                deploy_attempts: 0,
                notarize_attempts: 0,
                deployed: Vec::new(),
                confirmed: HashSet::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        self.state.lock().expect("fake ledger state lock poisoned")
    }

    pub fn height(&self) -> u32 {
        self.lock().height
    }

    /// Mines the next block: bumps the height and notifies subscribers.
    pub fn advance_block(&self) {
        let mut state = self.lock();
        state.height += 1;
        let header = BlockHeader { height: state.height };
        for sender in state.subscribers.values() {
            let _ = sender.try_send(header);
        }
    }

    /// Pushes a raw header to subscribers without touching the internal
    /// height; lets tests feed out-of-order notifications.
    pub fn emit_block(&self, height: u32) {
        let state = self.lock();
        let header = BlockHeader { height };
        for sender in state.subscribers.values() {
            let _ = sender.try_send(header);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Installs the contract both at the well-known registry identifier and
    /// under its script hash.
    pub fn install_registry(&self, contract: ContractState) {
        let mut state = self.lock();
        state.contracts_by_hash.insert(contract.script_hash, contract.clone());
        state.contracts_by_id.insert(REGISTRY_CONTRACT_ID, contract);
    }

    pub fn install_contract_by_hash(&self, contract: ContractState) {
        self.lock().contracts_by_hash.insert(contract.script_hash, contract);
    }

    pub fn set_record(&self, domain: &str, values: Vec<String>) {
        self.lock().records.insert(domain.to_string(), values);
    }

    pub fn set_version(&self, contract: ScriptHash, version: ContractVersion) {
        self.lock().versions.insert(contract, version.to_packed());
    }

    pub fn push_deploy_result(&self, result: Result<SentTx, SyncError>) {
        self.lock().deploy_results.push_back(result);
    }

    pub fn push_probe_result(&self, result: Result<(), SyncError>) {
        self.lock().probe_results.push_back(result);
    }

    pub fn push_notarize_result(&self, result: Result<SentTx, SyncError>) {
        self.lock().notarize_results.push_back(result);
    }

    pub fn confirm(&self, hash: TxHash) {
        self.lock().confirmed.insert(hash);
    }

    pub fn deploy_attempts(&self) -> usize {
        self.lock().deploy_attempts
    }

    pub fn notarize_attempts(&self) -> usize {
        self.lock().notarize_attempts
    }

    pub fn deployed(&self) -> Vec<DeploySubmission> {
        self.lock().deployed.clone()
    }

    fn next_sent_tx(state: &mut LedgerState) -> SentTx {
        state.next_tx += 1;
        let digest = blake3::hash(&state.next_tx.to_le_bytes());
        SentTx { hash: TxHash(*digest.as_bytes()), valid_until_block: state.height + 5 }
    }
}

#[async_trait]
impl Ledger for FakeLedger {
    async fn protocol_config(&self) -> Result<ProtocolConfig, SyncError> {
        Ok(ProtocolConfig { ms_per_block: self.lock().ms_per_block })
    }

    async fn block_count(&self) -> Result<u32, SyncError> {
        Ok(self.lock().height)
    }

    async fn subscribe_blocks(&self) -> Result<BlockSubscription, SyncError> {
        let (tx, rx) = mpsc::channel(16);
        let mut state = self.lock();
        state.next_subscription += 1;
        let id = format!("sub-{}", state.next_subscription);
        state.subscribers.insert(id.clone(), tx);
        Ok(BlockSubscription { id: SubscriptionId::new(id), blocks: rx })
    }

    async fn unsubscribe(&self, id: &SubscriptionId) -> Result<(), SyncError> {
        let removed = self.lock().subscribers.remove(id.as_str());
        if removed.is_none() {
            return Err(SyncError::rpc("unsubscribe", format!("unknown subscription {}", id)));
        }
        Ok(())
    }

    async fn contract_state_by_id(&self, id: i32) -> Result<Option<ContractState>, SyncError> {
        Ok(self.lock().contracts_by_id.get(&id).cloned())
    }

    async fn contract_state_by_hash(&self, hash: &ScriptHash) -> Result<Option<ContractState>, SyncError> {
        Ok(self.lock().contracts_by_hash.get(hash).cloned())
    }

    async fn invoke_read(&self, contract: &ScriptHash, method: &str, args: Vec<Value>) -> Result<Value, SyncError> {
        match method {
            "resolve" => {
                let domain = match args.first() {
                    Some(Value::String(domain)) => domain.clone(),
                    _ => return Err(SyncError::rpc("resolve", "missing domain argument")),
                };
                match self.lock().records.get(&domain) {
                    None => Err(SyncError::rpc("resolve", "token not found")),
                    Some(values) => Ok(Value::Array(values.iter().map(|v| Value::Bytes(v.clone().into_bytes())).collect())),
                }
            }
            "version" => match self.lock().versions.get(contract) {
                Some(packed) => Ok(Value::Int(*packed as i64)),
                None => Err(SyncError::rpc("version", "contract state unavailable")),
            },
            other => Err(SyncError::rpc("invoke", format!("unknown method {}", other))),
        }
    }

    async fn submit_deploy(&self, nef: &ContractNef, manifest: &Manifest, data: Value) -> Result<SentTx, SyncError> {
        let mut state = self.lock();
        state.deploy_attempts += 1;
        if let Some(result) = state.deploy_results.pop_front() {
            return result;
        }
        let sent = Self::next_sent_tx(&mut state);
        state.deployed.push(DeploySubmission { nef: nef.clone(), manifest: manifest.clone(), data, sent });
        Ok(sent)
    }

    async fn probe_notarized_call(
        &self,
        _committee: &[GroupPublicKey],
        _contract: &ScriptHash,
        _method: &str,
        _args: Vec<Value>,
    ) -> Result<(), SyncError> {
        self.lock().probe_results.pop_front().unwrap_or(Ok(()))
    }

    async fn submit_notarized_call(
        &self,
        _committee: &[GroupPublicKey],
        _contract: &ScriptHash,
        _method: &str,
        _args: Vec<Value>,
    ) -> Result<SentTx, SyncError> {
        let mut state = self.lock();
        state.notarize_attempts += 1;
        if let Some(result) = state.notarize_results.pop_front() {
            return result;
        }
        Ok(Self::next_sent_tx(&mut state))
    }

    async fn wait_any(&self, valid_until_block: u32, hashes: &[TxHash]) -> Result<TxOutcome, SyncError> {
        loop {
            {
                let state = self.lock();
                if let Some(hash) = hashes.iter().find(|hash| state.confirmed.contains(hash)) {
                    return Ok(TxOutcome { hash: *hash });
                }
                if state.height > valid_until_block {
                    return Err(SyncError::Message("transaction group expired without outcome".to_string()));
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

/// Key source handing out a fresh committee group key.
pub struct GeneratedKeySource;

#[async_trait]
impl CommitteeGroupKeySource for GeneratedKeySource {
    async fn init_group_key(&self) -> Result<GroupKeypair, SyncError> {
        Ok(GroupKeypair::generate())
    }
}

/// Update-args builder passing no extra data.
pub struct NoExtraArgs;

impl UpdateArgsBuilder for NoExtraArgs {
    fn build(&self, _version_on_chain: &ContractVersion) -> Result<Vec<Value>, SyncError> {
        Ok(Vec::new())
    }
}

/// Records deficiency callbacks for assertions.
#[derive(Default)]
pub struct CountingDepositHandler {
    calls: AtomicUsize,
    lack_of_funds: Mutex<Vec<bool>>,
}

impl CountingDepositHandler {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn observed(&self) -> Vec<bool> {
        self.lack_of_funds.lock().expect("deposit handler lock poisoned").clone()
    }
}

#[async_trait]
impl DepositDeficiencyHandler for CountingDepositHandler {
    async fn on_deficiency(&self, lack_of_funds: bool) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.lack_of_funds.lock().expect("deposit handler lock poisoned").push(lack_of_funds);
    }
}
