pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{ConsoleNotifier, ReqwestTransport};
pub use config::{snapshot::SnapshotFile, toml_config::TomlConfig};
pub use crate::core::product_actions::{ActionButton, NotifyButton, NotifyForm, ProductActions};
pub use crate::core::synchronizer::{CartSynchronizer, FailureAction, SyncSettings};
pub use domain::model::{CartSnapshot, LineKey, LineState, Money};
pub use domain::page::CartPage;
pub use utils::error::{CartError, Result};
