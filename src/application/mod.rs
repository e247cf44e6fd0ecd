//! Application layer: the chain-state synchronization engine.

pub mod deploy;
pub mod monitor;
pub mod pending;
pub mod reader;
pub mod update;

pub use deploy::{CommitteeGroupKeySource, DeployConfig, DeployOrchestrator};
pub use monitor::ChainMonitor;
pub use pending::TxGroupTracker;
pub use reader::{RegistryReader, REGISTRY_CONTRACT_ID};
pub use update::{DepositDeficiencyHandler, UpdateArgsBuilder, UpdateConfig, UpdateOrchestrator};
