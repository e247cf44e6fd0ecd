use crate::application::monitor::ChainMonitor;
use crate::application::pending::TxGroupTracker;
use crate::application::reader::RegistryReader;
use crate::domain::keys::{GroupKeypair, GroupPublicKey};
use crate::domain::manifest::{set_group_in_manifest, ContractNef, Manifest};
use crate::domain::version::ContractVersion;
use crate::domain::ScriptHash;
use crate::foundation::{CancelToken, Result, SyncError};
use crate::infrastructure::rpc::{Ledger, Value};
use async_trait::async_trait;
use log::{error, info};
use std::cmp::Ordering;
use std::sync::Arc;

const METHOD_UPDATE: &str = "update";

/// Builds version-specific extra arguments for the contract's `update`
/// method. Returning an empty set means no extra data is passed.
pub trait UpdateArgsBuilder: Send + Sync {
    fn build(&self, version_on_chain: &ContractVersion) -> Result<Vec<Value>>;
}

/// Invoked when the shared notary deposit cannot cover the notarized
/// submission. `lack_of_funds` is true for insufficient balance and false
/// when the deposit is about to expire; the handler may top the deposit up
/// out of band before the orchestrator retries.
#[async_trait]
pub trait DepositDeficiencyHandler: Send + Sync {
    async fn on_deficiency(&self, lack_of_funds: bool);
}

/// Inputs of the update orchestration.
pub struct UpdateConfig {
    pub deployer: ScriptHash,
    pub local_nef: ContractNef,
    pub local_manifest: Manifest,
    /// Version of the local executable; compared against the contract's
    /// reported on-chain version.
    pub local_version: ContractVersion,
    pub committee: Vec<GroupPublicKey>,
    pub committee_group_key: GroupKeypair,
    pub extra_update_args: Arc<dyn UpdateArgsBuilder>,
    pub deposit_handler: Arc<dyn DepositDeficiencyHandler>,
}

/// Drives the retry loop that ensures the on-chain registry contract is not
/// behind the local definition, updating it through the committee-notarized
/// path. The contract's presence is a precondition: deploy must precede
/// update.
pub struct UpdateOrchestrator {
    ledger: Arc<dyn Ledger>,
    monitor: Arc<ChainMonitor>,
    reader: RegistryReader,
    tracker: TxGroupTracker,
    config: UpdateConfig,
}

/// Decision over the freshly read version pair.
#[derive(Debug, PartialEq)]
enum VersionCheck {
    /// Another actor already upgraded further; nothing to do.
    LocalBehind,
    /// Equal versions with differing checksums break the "checksum
    /// determines version" discipline; fatal.
    Tie,
    LocalAhead,
}

fn classify_version(local: &ContractVersion, on_chain: &ContractVersion) -> VersionCheck {
    match local.cmp(on_chain) {
        Ordering::Less => VersionCheck::LocalBehind,
        Ordering::Equal => VersionCheck::Tie,
        Ordering::Greater => VersionCheck::LocalAhead,
    }
}

/// Gate applied before a new submission.
#[derive(Debug, PartialEq)]
enum SubmissionGate {
    /// The confirmation waiter of the previous group is still running.
    AwaitConfirmation,
    /// The previous transaction's validity window has not elapsed.
    AwaitValidityWindow { retry_after: u32 },
    Submit,
}

fn plan_submission(tracker_pending: bool, sent_tx_vub: Option<u32>, height: u32) -> SubmissionGate {
    if tracker_pending {
        return SubmissionGate::AwaitConfirmation;
    }
    match sent_tx_vub {
        Some(vub) if height <= vub => SubmissionGate::AwaitValidityWindow { retry_after: vub },
        _ => SubmissionGate::Submit,
    }
}

#[derive(Debug, PartialEq)]
enum SubmitFailure {
    Deficiency { lack_of_funds: bool },
    Other,
}

fn classify_submit_failure(err: &SyncError) -> SubmitFailure {
    if err.is_insufficient_funds() {
        SubmitFailure::Deficiency { lack_of_funds: true }
    } else if err.is_deposit_expiring() {
        SubmitFailure::Deficiency { lack_of_funds: false }
    } else {
        SubmitFailure::Other
    }
}

impl UpdateOrchestrator {
    pub fn new(ledger: Arc<dyn Ledger>, monitor: Arc<ChainMonitor>, config: UpdateConfig) -> Self {
        Self {
            reader: RegistryReader::new(Arc::clone(&ledger)),
            tracker: TxGroupTracker::new(Arc::clone(&ledger)),
            ledger,
            monitor,
            config,
        }
    }

    /// Synchronizes the on-chain contract with the local executables. If the
    /// on-chain version is greater than or equal to the local one, nothing
    /// happens; otherwise a committee-notarized `update` call is driven to
    /// completion. Behaves like the deploy orchestration with respect to
    /// cancellation and restart.
    pub async fn run(&self, cancel: &CancelToken) -> Result<()> {
        let local_nef_bytes = bincode::serialize(&self.config.local_nef)?;

        let mut manifest = self.config.local_manifest.clone();
        let mut update_tx_vub: Option<u32> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(SyncError::cancelled("registry contract update synchronization"));
            }

            info!("reading on-chain state of the registry contract...");

            let state = match self.reader.registry_state().await {
                Ok(state) => state,
                Err(err) => {
                    error!("failed to read on-chain state of the registry contract, will try again later error={}", err);
                    self.monitor.wait_for_next_block(cancel).await;
                    continue;
                }
            };
            let state = match state {
                Some(state) => state,
                None => return Err(SyncError::ContractMissing),
            };

            if state.nef_checksum == self.config.local_nef.checksum {
                // Manifests may differ, but a manifest-only change never bumps
                // the version, so it is not an update trigger.
                info!("same local and on-chain checksums of the registry contract executable, update is not needed");
                return Ok(());
            }

            info!("executable checksums of the on-chain and local registry contracts differ, an update is needed");

            let version_on_chain = match self.reader.contract_version(&state.script_hash).await {
                Ok(version) => version,
                Err(err) => {
                    error!("failed to read on-chain version of the registry contract, will try again later error={}", err);
                    self.monitor.wait_for_next_block(cancel).await;
                    continue;
                }
            };

            match classify_version(&self.config.local_version, &version_on_chain) {
                VersionCheck::LocalBehind => {
                    info!(
                        "local contract version is behind the on-chain one, update is not needed local={} on_chain={}",
                        self.config.local_version, version_on_chain
                    );
                    return Ok(());
                }
                VersionCheck::Tie => return Err(SyncError::VersionChecksumMismatch { version: version_on_chain }),
                VersionCheck::LocalAhead => {}
            }

            let extra_args = match self.config.extra_update_args.build(&version_on_chain) {
                Ok(args) => args,
                Err(err) => {
                    error!(
                        "failed to build extra arguments for the registry contract update, will try again later on_chain_version={} error={}",
                        version_on_chain, err
                    );
                    self.monitor.wait_for_next_block(cancel).await;
                    continue;
                }
            };

            set_group_in_manifest(&mut manifest, &self.config.local_nef, &self.config.committee_group_key, &self.config.deployer);

            let call_args = vec![
                Value::Bytes(local_nef_bytes.clone()),
                Value::Bytes(serde_json::to_vec(&manifest)?),
                if extra_args.is_empty() { Value::Null } else { Value::Array(extra_args) },
            ];

            // The dry run surfaces "already updated" immediately instead of
            // waiting out the validity window of a previously sent transaction.
            let probe = self
                .ledger
                .probe_notarized_call(&self.config.committee, &state.script_hash, METHOD_UPDATE, call_args.clone())
                .await;

            let send_result = match probe {
                Err(err) if err.is_already_updated() => {
                    // Reachable only when the local version is ahead of the
                    // one compared above.
                    info!("registry contract has already been updated, skip");
                    return Ok(());
                }
                Err(err) => Err(err),
                Ok(()) => match plan_submission(self.tracker.is_pending(), update_tx_vub, self.monitor.current_height()) {
                    SubmissionGate::AwaitConfirmation => {
                        info!("previously sent transaction updating the registry contract is still awaiting the outcome");
                        self.monitor.wait_for_next_block(cancel).await;
                        continue;
                    }
                    SubmissionGate::AwaitValidityWindow { retry_after } => {
                        info!("transaction updating the registry contract was sent earlier, checking relevance...");
                        info!(
                            "previously sent update transaction may still be relevant, will wait for the outcome current_height={} retry_after_height={}",
                            self.monitor.current_height(),
                            retry_after
                        );
                        self.monitor.wait_for_next_block(cancel).await;
                        continue;
                    }
                    SubmissionGate::Submit => {
                        if update_tx_vub.take().is_some() {
                            info!("previously sent transaction updating the registry contract expired without side-effect");
                        }
                        info!("sending new transaction updating the registry contract...");
                        self.ledger
                            .submit_notarized_call(&self.config.committee, &state.script_hash, METHOD_UPDATE, call_args)
                            .await
                    }
                },
            };

            match send_result {
                Ok(sent) => {
                    update_tx_vub = Some(sent.valid_until_block);
                    self.tracker.track_async(cancel, sent.valid_until_block, vec![sent.hash]);
                    info!(
                        "transaction updating the registry contract has been successfully sent, will wait for the outcome tx={} valid_until_block={}",
                        sent.hash, sent.valid_until_block
                    );
                }
                Err(err) => match classify_submit_failure(&err) {
                    SubmitFailure::Other => {
                        error!("failed to send transaction updating the registry contract, will try again later error={}", err);
                    }
                    SubmitFailure::Deficiency { lack_of_funds } => {
                        self.config.deposit_handler.on_deficiency(lack_of_funds).await;
                    }
                },
            }

            self.monitor.wait_for_next_block(cancel).await;
        }
    }
}
