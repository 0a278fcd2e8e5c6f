pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use adapters::storage::LocalStorage;
pub use config::ReportConfig;

pub use crate::core::{
    etl::{EtlEngine, RunSummary},
    pipeline::InventoryPipeline,
};
pub use utils::error::{EtlError, Result};
