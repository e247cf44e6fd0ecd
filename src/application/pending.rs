use crate::foundation::{CancelToken, TxHash};
use crate::infrastructure::rpc::Ledger;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Tracks whether a previously submitted transaction group is still awaiting
/// confirmation, so orchestrators can avoid redundant resubmission.
///
/// The pending flag transitions `false -> true` synchronously with
/// `track_async` and `true -> false` asynchronously once any of the tracked
/// hashes reaches a terminal outcome or the wait gives up. A `false` reading
/// means "safe to attempt a new submission", not "definitely not landed".
/// Only one tracked group may be in flight per owning orchestrator.
pub struct TxGroupTracker {
    ledger: Arc<dyn Ledger>,
    pending: Arc<AtomicBool>,
}

impl TxGroupTracker {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger, pending: Arc::new(AtomicBool::new(false)) }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }

    /// Marks the tracker pending and spawns a waiter for the first of
    /// `hashes` to land (equivalent alternate transactions may represent the
    /// same intent). Panics if `hashes` is empty: that is a programming
    /// error, not a runtime condition.
    pub fn track_async(&self, cancel: &CancelToken, valid_until_block: u32, hashes: Vec<TxHash>) {
        assert!(!hashes.is_empty(), "missing transactions");

        self.pending.store(true, Ordering::SeqCst);

        let pending = Arc::clone(&self.pending);
        let ledger = Arc::clone(&self.ledger);
        let cancel = cancel.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("transaction group tracking cancelled valid_until_block={}", valid_until_block);
                }
                outcome = ledger.wait_any(valid_until_block, &hashes) => match outcome {
                    Ok(result) => debug!("tracked transaction group reached terminal outcome tx={}", result.hash),
                    Err(err) => debug!(
                        "tracked transaction group wait gave up valid_until_block={} error={}",
                        valid_until_block, err
                    ),
                },
            }
            pending.store(false, Ordering::SeqCst);
        });
    }
}
