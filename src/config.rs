//! Centralized runtime constants for cpupin.
//!
//! All tunable limits and defaults are collected here so they can be found
//! and adjusted in a single place rather than scattered across modules.

/// Maximum number of enforcement rules the engine supports.
pub const MAX_RULES: usize = 16;

/// Maximum length of a rule's process name, in characters.
pub const MAX_PROCESS_NAME_LEN: usize = 63;

/// Width of an affinity mask in bits (one bit per logical CPU).
pub const MASK_BITS: usize = 32;

/// Maximum number of hex digits in an affinity mask.
pub const MASK_HEX_DIGITS: usize = 8;

/// Default enforcement poll period when no setting is persisted (seconds).
pub const DEFAULT_PERIOD_SECS: u32 = 5;

/// Largest accepted enforcement poll period (seconds).
pub const MAX_PERIOD_SECS: u32 = 99;

/// Default configuration file name, resolved next to the executable.
pub const CONFIG_FILE_NAME: &str = "cpupin.ini";
