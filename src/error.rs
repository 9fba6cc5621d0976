//! Unified error types for the enforcement engine.
//!
//! Errors serialize as `{ "kind": "...", "message": "..." }` so a
//! presentation layer can programmatically distinguish failure categories.

use std::path::PathBuf;

use serde::ser::SerializeStruct;

use crate::config::MAX_RULES;

/// Failures surfaced by configuration load/save.
///
/// Load-side failures refuse a Start and leave the engine Idle; nothing here
/// is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The backing configuration file does not exist.
    #[error("configuration file not found: {0}")]
    StorageMissing(PathBuf),

    /// More than [`MAX_RULES`] rule pairs are persisted.
    #[error("more than {MAX_RULES} rules are not supported")]
    TooManyRules,

    /// A persisted rule pair has no `:` separator or no process name.
    #[error("malformed rule entry: {0:?}")]
    CorruptEntry(String),

    /// A persisted mask is zero, unparsable, or not a subset of the
    /// machine's active-processor mask.
    #[error("invalid affinity mask: {0}")]
    InvalidMask(String),

    /// Filesystem errors while reading or writing the store.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Per-rule, per-tick enforcement failures. Recoverable: the rule is
/// retried on every subsequent tick.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApplyError {
    /// The process handle could not be opened, commonly for lack of
    /// privilege over another user's or a protected process.
    #[error("process handle could not be opened: {0}")]
    HandleOpenDenied(String),

    /// The OS rejected the mask, or the re-read mask did not match.
    #[error("affinity mask rejected by the operating system")]
    MaskRejected,
}

/// Errors returned by the engine boundary operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Rules are frozen while enforcement is running; Stop first.
    #[error("engine is running; stop enforcement before editing rules")]
    Running,

    /// Rule index outside the dense prefix of configured rules.
    #[error("rule index {0} out of range")]
    BadIndex(usize),
}

impl ConfigError {
    /// Returns the error kind as a string matching the variant name.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigError::StorageMissing(_) => "StorageMissing",
            ConfigError::TooManyRules => "TooManyRules",
            ConfigError::CorruptEntry(_) => "CorruptEntry",
            ConfigError::InvalidMask(_) => "InvalidMask",
            ConfigError::Io(_) => "Io",
        }
    }
}

impl EngineError {
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Config(e) => e.kind(),
            EngineError::Running => "Running",
            EngineError::BadIndex(_) => "BadIndex",
        }
    }
}

/// Custom Serialize: produces `{ "kind": "Variant", "message": "..." }`.
impl serde::Serialize for EngineError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut s = serializer.serialize_struct("EngineError", 2)?;
        s.serialize_field("kind", self.kind())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_kind_matches_variant() {
        assert_eq!(
            ConfigError::StorageMissing(PathBuf::from("x.ini")).kind(),
            "StorageMissing"
        );
        assert_eq!(ConfigError::TooManyRules.kind(), "TooManyRules");
        assert_eq!(ConfigError::CorruptEntry("a b".into()).kind(), "CorruptEntry");
        assert_eq!(ConfigError::InvalidMask("0".into()).kind(), "InvalidMask");
    }

    #[test]
    fn test_engine_error_kind_flattens_config() {
        let err = EngineError::Config(ConfigError::TooManyRules);
        assert_eq!(err.kind(), "TooManyRules");
        assert_eq!(EngineError::Running.kind(), "Running");
        assert_eq!(EngineError::BadIndex(20).kind(), "BadIndex");
    }

    #[test]
    fn test_engine_error_serializes_as_kind_and_message() {
        let err = EngineError::Running;
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "Running");
        assert!(json["message"].as_str().unwrap().contains("running"));
    }

    #[test]
    fn test_display_messages() {
        let err = ConfigError::CorruptEntry("chrome.exe 3".into());
        assert!(err.to_string().contains("chrome.exe 3"));
        assert!(ConfigError::TooManyRules.to_string().contains("16"));
        assert!(EngineError::BadIndex(17).to_string().contains("17"));
    }
}
