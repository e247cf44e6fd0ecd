use crate::foundation::{CancelToken, Result, SubscriptionId, SyncError};
use crate::infrastructure::rpc::Ledger;
use log::{info, warn};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Thin utility around the ledger client providing chain-height monitoring.
///
/// The height is updated only by the subscription listener task and is
/// monotonically non-decreasing for the monitor's lifetime; readers observe
/// it with atomic loads. An optional single-slot channel receives a unit
/// notification per observed block, dropped when the consumer lags — callers
/// only ever care about "there is a newer block", never about counting them.
pub struct ChainMonitor {
    ledger: Arc<dyn Ledger>,
    block_interval: Duration,
    sub_id: SubscriptionId,
    height: Arc<AtomicU32>,
    listener: JoinHandle<()>,
}

impl ChainMonitor {
    /// Constructs and runs the monitor. Fails if the ledger cannot report
    /// its protocol timing or current height, or refuses the block
    /// subscription. The resulting monitor must be stopped when no longer
    /// needed.
    pub async fn start(ledger: Arc<dyn Ledger>, new_block_notify: Option<mpsc::Sender<()>>) -> Result<Self> {
        let protocol = ledger
            .protocol_config()
            .await
            .map_err(|err| SyncError::rpc("request ledger protocol configuration", err))?;
        if protocol.ms_per_block == 0 {
            return Err(SyncError::Config("ledger reported a zero block interval".to_string()));
        }

        let initial_height = ledger
            .block_count()
            .await
            .map_err(|err| SyncError::rpc("get current chain height", err))?;

        let subscription = ledger
            .subscribe_blocks()
            .await
            .map_err(|err| SyncError::rpc("subscribe to new blocks of the chain", err))?;

        let height = Arc::new(AtomicU32::new(initial_height));
        let listener_height = Arc::clone(&height);
        let mut blocks = subscription.blocks;

        let listener = tokio::spawn(async move {
            info!("listening to new blocks...");
            while let Some(block) = blocks.recv().await {
                listener_height.fetch_max(block.height, Ordering::SeqCst);
                if let Some(notify) = &new_block_notify {
                    let _ = notify.try_send(());
                }
                info!("new block arrived height={}", block.height);
            }
            info!("listening to new blocks stopped");
        });

        Ok(Self {
            ledger,
            block_interval: Duration::from_millis(protocol.ms_per_block),
            sub_id: subscription.id,
            height,
            listener,
        })
    }

    /// Latest observed chain height.
    pub fn current_height(&self) -> u32 {
        self.height.load(Ordering::SeqCst)
    }

    /// Blocks until a height strictly greater than the one observed at call
    /// time is seen, or `cancel` fires, in which case it returns silently —
    /// callers check the token themselves.
    pub async fn wait_for_next_block(&self, cancel: &CancelToken) {
        let initial_height = self.current_height();

        let mut ticker = tokio::time::interval(self.block_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = ticker.tick() => {
                    if self.height.load(Ordering::SeqCst) > initial_height {
                        return;
                    }
                }
            }
        }
    }

    /// Cancels the block subscription. A stopped monitor must not be used
    /// anymore.
    pub async fn stop(&self) {
        if let Err(err) = self.ledger.unsubscribe(&self.sub_id).await {
            warn!("failed to cancel subscription to new blocks sub_id={} error={}", self.sub_id, err);
        }
        self.listener.abort();
    }
}

impl std::fmt::Debug for ChainMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainMonitor")
            .field("block_interval", &self.block_interval)
            .field("sub_id", &self.sub_id)
            .field("height", &self.height.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
