//! engine-core: Shared infrastructure for the invoicing financial engine.
pub mod config;
pub mod error;
pub mod money;
pub mod observability;

pub use anyhow;
pub use rust_decimal;
pub use serde;
pub use tracing;
pub use validator;
