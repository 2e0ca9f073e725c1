pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{LocalStorage, WebDriverFactory};
#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{FileConfig, PendingPrompts};
pub use core::engine::{CaptureEngine, RunReport};
pub use core::ledger::CaseLedger;
pub use domain::settings::RunConfig;
pub use utils::error::{Result, TwinshotError};
