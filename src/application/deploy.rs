use crate::application::monitor::ChainMonitor;
use crate::application::reader::{RegistryReader, REGISTRY_CONTRACT_ID};
use crate::domain::contract::ContractState;
use crate::domain::keys::GroupKeypair;
use crate::domain::manifest::{set_group_in_manifest, ContractNef, Manifest};
use crate::domain::ScriptHash;
use crate::foundation::{CancelToken, Result, SyncError};
use crate::infrastructure::rpc::{Ledger, Value};
use async_trait::async_trait;
use log::{error, info};
use std::sync::Arc;

/// Source of the committee-group private key, consulted lazily the first
/// time a deployment has to be signed. The engine never persists the key.
#[async_trait]
pub trait CommitteeGroupKeySource: Send + Sync {
    async fn init_group_key(&self) -> Result<GroupKeypair>;
}

/// Inputs of the deploy orchestration.
pub struct DeployConfig {
    /// Account the ledger client signs deployments with.
    pub deployer: ScriptHash,
    pub local_nef: ContractNef,
    pub local_manifest: Manifest,
    /// Contact string recorded for each seed domain at first deployment.
    pub system_contact: String,
    /// Root domains registered together with the contract.
    pub seed_domains: Vec<String>,
    /// When absent the orchestrator never deploys itself and waits for
    /// another operator to do it.
    pub group_key_source: Option<Arc<dyn CommitteeGroupKeySource>>,
}

/// Drives the retry loop that ensures the registry contract exists on-chain,
/// deploying it when authorized to. All state is re-derived from the chain
/// each iteration, so a run may be cancelled and restarted from scratch at
/// any point.
pub struct DeployOrchestrator {
    ledger: Arc<dyn Ledger>,
    monitor: Arc<ChainMonitor>,
    reader: RegistryReader,
    config: DeployConfig,
}

/// Outcome of one planning step over the freshly read on-chain state.
#[derive(Debug, PartialEq)]
enum DeployAction {
    Finished(ScriptHash),
    FailWrongName { expected: String, actual: String },
    WaitExternalDeploy,
    InitGroupKey,
    AwaitPendingTx { retry_after: u32 },
    SubmitDeployTx,
}

fn plan_iteration(
    state: Option<&ContractState>,
    local_name: &str,
    has_authority: bool,
    key_ready: bool,
    sent_tx_vub: Option<u32>,
    height: u32,
) -> DeployAction {
    match state {
        Some(state) if state.manifest_name == local_name => DeployAction::Finished(state.script_hash),
        Some(state) => DeployAction::FailWrongName {
            expected: local_name.to_string(),
            actual: state.manifest_name.clone(),
        },
        None if !has_authority => DeployAction::WaitExternalDeploy,
        None if !key_ready => DeployAction::InitGroupKey,
        None => match sent_tx_vub {
            Some(vub) if height <= vub => DeployAction::AwaitPendingTx { retry_after: vub },
            _ => DeployAction::SubmitDeployTx,
        },
    }
}

impl DeployOrchestrator {
    pub fn new(ledger: Arc<dyn Ledger>, monitor: Arc<ChainMonitor>, config: DeployConfig) -> Self {
        Self { reader: RegistryReader::new(Arc::clone(&ledger)), ledger, monitor, config }
    }

    /// Synchronizes the registry contract with the chain and returns its
    /// address. Success is the presence of a correctly named contract at the
    /// well-known identifier; conditions fixable on the chain in the
    /// background never stop the procedure. Cancelling the token stops
    /// execution and returns an error; a later run resumes from whatever
    /// stage the chain reflects.
    pub async fn run(&self, cancel: &CancelToken) -> Result<ScriptHash> {
        let mut sent_tx_vub: Option<u32> = None;
        let mut group_key: Option<GroupKeypair> = None;
        let mut manifest = self.config.local_manifest.clone();

        loop {
            if cancel.is_cancelled() {
                return Err(SyncError::cancelled("registry contract synchronization"));
            }

            info!("reading on-chain state of the registry contract id={}", REGISTRY_CONTRACT_ID);

            match self.reader.registry_state().await {
                Err(err) => {
                    error!("failed to read on-chain state of the registry contract, will try again later error={}", err);
                }
                Ok(state) => {
                    // Dispatch until an action needs the next block; steps that
                    // only change local state re-plan without a chain read.
                    loop {
                        let action = plan_iteration(
                            state.as_ref(),
                            &self.config.local_manifest.name,
                            self.config.group_key_source.is_some(),
                            group_key.is_some(),
                            sent_tx_vub,
                            self.monitor.current_height(),
                        );
                        match action {
                            DeployAction::Finished(address) => return Ok(address),
                            DeployAction::FailWrongName { expected, actual } => {
                                return Err(SyncError::WrongContractName { id: REGISTRY_CONTRACT_ID, expected, actual });
                            }
                            DeployAction::WaitExternalDeploy => {
                                info!("registry contract is missing on the chain but deploy attempts are disabled, will wait for background deployment");
                                break;
                            }
                            DeployAction::InitGroupKey => {
                                let Some(source) = self.config.group_key_source.as_ref() else {
                                    break;
                                };
                                info!("initializing private key of the committee group...");
                                match source.init_group_key().await {
                                    Ok(key) => {
                                        info!("private key of the committee group has been initialized public_key={}", key.public_key());
                                        set_group_in_manifest(&mut manifest, &self.config.local_nef, &key, &self.config.deployer);
                                        group_key = Some(key);
                                        continue;
                                    }
                                    Err(err) => {
                                        error!("failed to init committee group key, will try again later error={}", err);
                                        break;
                                    }
                                }
                            }
                            DeployAction::AwaitPendingTx { retry_after } => {
                                info!("transaction deploying the registry contract was sent earlier, checking relevance...");
                                info!(
                                    "previously sent deploy transaction may still be relevant, will wait for the outcome current_height={} retry_after_height={}",
                                    self.monitor.current_height(),
                                    retry_after
                                );
                                break;
                            }
                            DeployAction::SubmitDeployTx => {
                                if sent_tx_vub.take().is_some() {
                                    info!("previously sent transaction deploying the registry contract expired without side-effect");
                                }
                                info!("sending new transaction deploying the registry contract...");

                                // Copies, so submission can never mutate the local definition.
                                let nef = self.config.local_nef.clone();
                                let signed_manifest = manifest.clone();

                                match self.ledger.submit_deploy(&nef, &signed_manifest, self.seed_data()).await {
                                    Err(err) if err.is_insufficient_funds() => {
                                        info!("not enough funds to deploy the registry contract, will try again later");
                                    }
                                    Err(err) => {
                                        error!("failed to send transaction deploying the registry contract, will try again later error={}", err);
                                    }
                                    Ok(sent) => {
                                        sent_tx_vub = Some(sent.valid_until_block);
                                        info!(
                                            "transaction deploying the registry contract has been successfully sent, will wait for the outcome tx={} valid_until_block={}",
                                            sent.hash, sent.valid_until_block
                                        );
                                    }
                                }
                                break;
                            }
                        }
                    }
                }
            }

            self.monitor.wait_for_next_block(cancel).await;
        }
    }

    /// First-deployment data: every seed domain paired with the system
    /// contact string.
    fn seed_data(&self) -> Value {
        let pairs = self
            .config
            .seed_domains
            .iter()
            .map(|domain| Value::Array(vec![Value::String(domain.clone()), Value::String(self.config.system_contact.clone())]))
            .collect();
        Value::Array(vec![Value::Array(pairs)])
    }
}
