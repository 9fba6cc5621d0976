//! Durable configuration store.
//!
//! Rules live as whole-line `name:hexmask` pairs in a `[pairs]` section;
//! settings are independent scalar keys in `[settings]`, written immediately
//! on each edit. Load validates everything up front so a Start can be
//! refused with a specific [`ConfigError`].

mod ini;

use std::path::{Path, PathBuf};

use crate::config::{DEFAULT_PERIOD_SECS, MAX_PERIOD_SECS, MAX_RULES};
use crate::core::rules::{Rule, RuleSet, Settings};
use crate::error::ConfigError;

use ini::IniDoc;

const SETTINGS_SECTION: &str = "settings";
const PAIRS_SECTION: &str = "pairs";

const SILENT_START_KEY: &str = "silent-start";
const AUTO_START_KEY: &str = "auto-start";
const PERIOD_KEY: &str = "period";

/// A fully validated configuration snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub rules: RuleSet,
    pub settings: Settings,
}

/// Reads and writes the sectioned configuration file at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ConfigStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and validates the whole configuration. `system_mask` is the
    /// machine's active-processor mask; any rule mask outside it is invalid.
    pub fn load(&self, system_mask: u64) -> Result<Config, ConfigError> {
        if !self.path.exists() {
            return Err(ConfigError::StorageMissing(self.path.clone()));
        }
        let doc = IniDoc::load(&self.path)?;

        let mut rules = Vec::new();
        for raw in doc.lines(PAIRS_SECTION) {
            let pair = raw.trim_matches(|c: char| c == ' ' || c == '\t');
            if pair.is_empty() {
                continue;
            }
            if rules.len() == MAX_RULES {
                return Err(ConfigError::TooManyRules);
            }

            // Split at the last colon so process names containing ':' are
            // tolerated as long as the mask does not.
            let Some((name, mask_text)) = pair.rsplit_once(':') else {
                return Err(ConfigError::CorruptEntry(pair.to_string()));
            };
            if name.is_empty() {
                return Err(ConfigError::CorruptEntry(pair.to_string()));
            }

            let mask = parse_mask(mask_text, system_mask)?;
            rules.push(Rule::new(name, mask));
        }

        Ok(Config {
            rules: RuleSet::from_rules(rules),
            settings: self.read_settings(&doc),
        })
    }

    /// Persists the rule set, replacing the whole `[pairs]` section. Pairs
    /// are written in index order so save→load preserves rule order.
    pub fn save_rules(&self, rules: &RuleSet) -> Result<(), ConfigError> {
        let mut doc = self.load_doc()?;
        let lines = rules
            .iter()
            .filter(|r| !r.process_name.is_empty() && r.affinity_mask != 0)
            .map(|r| format!("{}:{:X}", r.process_name, r.affinity_mask))
            .collect();
        doc.replace_lines(PAIRS_SECTION, lines);
        doc.save(&self.path)?;
        Ok(())
    }

    pub fn write_period(&self, period_secs: u32) -> Result<(), ConfigError> {
        self.write_setting(PERIOD_KEY, &period_secs.min(MAX_PERIOD_SECS).to_string())
    }

    pub fn write_silent_start(&self, enabled: bool) -> Result<(), ConfigError> {
        self.write_setting(SILENT_START_KEY, if enabled { "1" } else { "0" })
    }

    pub fn write_auto_start(&self, enabled: bool) -> Result<(), ConfigError> {
        self.write_setting(AUTO_START_KEY, if enabled { "1" } else { "0" })
    }

    fn write_setting(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut doc = self.load_doc()?;
        doc.set(SETTINGS_SECTION, key, value);
        doc.save(&self.path)?;
        Ok(())
    }

    fn load_doc(&self) -> Result<IniDoc, ConfigError> {
        if self.path.exists() {
            Ok(IniDoc::load(&self.path)?)
        } else {
            Ok(IniDoc::new())
        }
    }

    fn read_settings(&self, doc: &IniDoc) -> Settings {
        let mut period = doc
            .get(SETTINGS_SECTION, PERIOD_KEY)
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_PERIOD_SECS);
        if period > MAX_PERIOD_SECS {
            tracing::warn!("Persisted period {period}s exceeds {MAX_PERIOD_SECS}s, clamping");
            period = MAX_PERIOD_SECS;
        }

        Settings {
            poll_period_secs: period,
            silent_start: self.read_flag(doc, SILENT_START_KEY),
            auto_start: self.read_flag(doc, AUTO_START_KEY),
        }
    }

    fn read_flag(&self, doc: &IniDoc, key: &str) -> bool {
        doc.get(SETTINGS_SECTION, key)
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0)
            != 0
    }
}

fn parse_mask(text: &str, system_mask: u64) -> Result<u32, ConfigError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let mask = u32::from_str_radix(digits, 16)
        .map_err(|_| ConfigError::InvalidMask(text.trim().to_string()))?;
    if mask == 0 {
        return Err(ConfigError::InvalidMask("mask must be non-zero".into()));
    }
    if u64::from(mask) & !system_mask != 0 {
        return Err(ConfigError::InvalidMask(format!(
            "{mask:X} is not a subset of the active-processor mask {system_mask:X}"
        )));
    }
    Ok(mask)
}
