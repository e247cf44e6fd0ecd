//! Infrastructure layer: the ledger capability surface, configuration, logging.

pub mod config;
pub mod logging;
pub mod rpc;
