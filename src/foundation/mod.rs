//! Foundation layer: shared primitives grouped for the layered architecture.

pub mod cancel;
pub mod error;
pub mod types;

pub use cancel::*;
pub use error::*;
pub use types::*;
