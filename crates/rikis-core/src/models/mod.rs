//! Data models shared across the pipeline.

pub mod config;
pub mod record;
pub mod table;

pub use config::RikisConfig;
pub use record::{Category, LineItem, NormalizedCategory, NormalizedRecord};
pub use table::LedgerTable;
