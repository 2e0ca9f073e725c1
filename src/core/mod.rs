pub mod artifacts;
pub mod capture;
pub mod case_numbers;
pub mod devices;
pub mod engine;
pub mod height;
pub mod interaction;
pub mod ledger;
pub mod orchestrator;
pub mod scheduler;
pub mod wait;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{CaptureOutcome, MatchedPair, PairOutcome, RunSummary};
pub use crate::domain::ports::{BrowserSession, SessionFactory, Storage};
pub use crate::utils::error::Result;
