//! Engine boundary for the presentation layer.
//!
//! [`Engine`] is the single owned context object tying together the
//! configuration store, the shared rule set, and the enforcement scheduler.
//! A UI or tray collaborator drives it through `start`/`stop`/`set_rule`/
//! `reload` and polls `status` for display.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;

use crate::config::{MASK_BITS, MASK_HEX_DIGITS, MAX_PERIOD_SECS};
use crate::core::rules::{RuleSet, Settings};
use crate::core::scheduler::Scheduler;
use crate::error::{ConfigError, EngineError};
use crate::mask;
use crate::store::ConfigStore;
use crate::sys::{NativeControl, ProcessControl};

/// Per-rule snapshot handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleStatus {
    pub index: usize,
    pub process_name: String,
    pub affinity_mask: u32,
    pub applied: bool,
}

pub struct Engine {
    store: ConfigStore,
    control: Arc<dyn ProcessControl>,
    rules: Arc<Mutex<RuleSet>>,
    settings: Settings,
    scheduler: Scheduler,
}

impl Engine {
    pub fn new(store: ConfigStore, control: Arc<dyn ProcessControl>) -> Self {
        Engine {
            store,
            control,
            rules: Arc::new(Mutex::new(RuleSet::new())),
            settings: Settings::default(),
            scheduler: Scheduler::new(),
        }
    }

    /// Opens an engine over the configuration file at `path` with the native
    /// OS backend. A missing or malformed file is reported and leaves the
    /// engine Idle with defaults; Start will surface the same error.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let mut engine = Engine::new(ConfigStore::new(path), Arc::new(NativeControl::new()));
        if let Err(e) = engine.reload() {
            tracing::warn!("Configuration not loaded: {e}");
        }
        engine
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Reloads configuration from disk, replacing in-memory rules and
    /// settings. Refused while Running; rules are frozen at Start time.
    pub fn reload(&mut self) -> Result<(), EngineError> {
        if self.is_running() {
            return Err(EngineError::Running);
        }
        let config = self.store.load(self.control.system_mask())?;
        self.settings = config.settings;
        *self.rules.lock().unwrap() = config.rules;
        Ok(())
    }

    /// Starts periodic enforcement. Requires a fresh configuration load to
    /// succeed; on failure the engine stays Idle and the specific
    /// [`ConfigError`] is surfaced. No-op if already running.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.is_running() {
            return Ok(());
        }

        let config = self.store.load(self.control.system_mask())?;
        self.settings = config.settings;
        *self.rules.lock().unwrap() = config.rules;

        let period = Duration::from_secs(u64::from(self.settings.poll_period_secs));
        self.scheduler
            .start(period, Arc::clone(&self.rules), Arc::clone(&self.control));
        tracing::info!(
            "Enforcement running: {} rule(s), period {}s",
            self.rules.lock().unwrap().len(),
            self.settings.poll_period_secs
        );
        Ok(())
    }

    /// Cancels the timer and clears every rule's transient applied flag.
    /// Rules become editable again. No-op when idle.
    pub fn stop(&mut self) {
        self.scheduler.stop();
        self.rules.lock().unwrap().clear_applied();
    }

    /// Whether the rule at `index` was applied on the latest tick.
    pub fn rule_status(&self, index: usize) -> Option<bool> {
        self.rules.lock().unwrap().get(index).map(|r| r.applied)
    }

    /// Snapshot of all configured rules for display.
    pub fn status(&self) -> Vec<RuleStatus> {
        self.rules
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .map(|(index, r)| RuleStatus {
                index,
                process_name: r.process_name.clone(),
                affinity_mask: r.affinity_mask,
                applied: r.applied,
            })
            .collect()
    }

    /// Edits the rule at `index` and persists the rule section immediately.
    /// An empty name truncates the rule list at `index`. Refused while
    /// Running.
    pub fn set_rule(&mut self, index: usize, name: &str, mask: u32) -> Result<(), EngineError> {
        if self.is_running() {
            return Err(EngineError::Running);
        }
        if !name.is_empty() {
            validate_mask(mask, self.control.system_mask())?;
        }

        let mut rules = self.rules.lock().unwrap();
        rules.set(index, name, mask)?;
        self.store.save_rules(&rules)?;
        Ok(())
    }

    /// Sets the poll period (clamped to 0..=99 seconds) and persists it
    /// immediately. Refused while Running; the period is frozen at Start.
    pub fn set_period(&mut self, period_secs: u32) -> Result<(), EngineError> {
        if self.is_running() {
            return Err(EngineError::Running);
        }
        self.settings.poll_period_secs = period_secs.min(MAX_PERIOD_SECS);
        self.store.write_period(self.settings.poll_period_secs)?;
        Ok(())
    }

    pub fn set_silent_start(&mut self, enabled: bool) -> Result<(), EngineError> {
        self.settings.silent_start = enabled;
        self.store.write_silent_start(enabled)?;
        Ok(())
    }

    /// Persists the auto-start flag. Actually registering the elevated
    /// startup task is the external collaborator's job.
    pub fn set_auto_start(&mut self, enabled: bool) -> Result<(), EngineError> {
        self.settings.auto_start = enabled;
        self.store.write_auto_start(enabled)?;
        Ok(())
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.scheduler.stop();
    }
}

fn validate_mask(mask: u32, system_mask: u64) -> Result<(), ConfigError> {
    if mask == 0 {
        return Err(ConfigError::InvalidMask("mask must be non-zero".into()));
    }
    if u64::from(mask) & !system_mask != 0 {
        return Err(ConfigError::InvalidMask(format!(
            "{mask:X} is not a subset of the active-processor mask {system_mask:X}"
        )));
    }
    Ok(())
}

/// Live-typing affordance for a bit-mask field: over-long input is cut to
/// 32 digits and an invalid character cuts the string at its position.
/// This is interactive truncation, not validation; the codec itself stays
/// pure (see [`crate::mask`]).
pub fn sanitize_bits_input(input: &str) -> String {
    let mut text: String = input.chars().take(MASK_BITS).collect();
    if let Err(index) = mask::validate_bits(&text) {
        text.truncate(index);
    }
    text
}

/// Live-typing affordance for a hex field: cut to 8 digits, truncated at
/// the first invalid character.
pub fn sanitize_hex_input(input: &str) -> String {
    let mut text: String = input.chars().take(MASK_HEX_DIGITS).collect();
    if let Err(index) = mask::validate_hex(&text) {
        text.truncate(index);
    }
    text
}
