//! cpupin keeps processes pinned to the CPU cores you chose for them.
//!
//! Rules ("process name -> affinity mask") live in a small sectioned
//! key-value file. While enforcement is running, a background scheduler
//! re-scans the process table every few seconds and re-applies the mask to
//! every matching process, so pins survive process restarts.

pub mod config;
mod core;
pub mod engine;
pub mod error;
pub mod mask;
pub mod store;
pub mod sys;

pub use crate::core::rules::{Rule, RuleSet, Settings};
pub use crate::engine::{sanitize_bits_input, sanitize_hex_input, Engine, RuleStatus};
pub use crate::error::{ApplyError, ConfigError, EngineError};
pub use crate::store::ConfigStore;
