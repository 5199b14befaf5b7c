pub mod action;
pub mod archive;
pub mod config;
pub mod language;
pub mod model;
pub mod report;
pub mod storage;
pub mod style;
pub mod template;
pub mod testing;
pub mod toolchain;

pub use crate::action::{Orchestrator, RunOutcome};
pub use crate::config::Config;
