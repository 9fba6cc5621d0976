//! OS collaborator boundary: process snapshots and affinity syscalls.
//!
//! [`ProcessControl`] is the seam the enforcement engine works against.
//! [`NativeControl`] backs it with `sysinfo` for process enumeration and a
//! per-platform affinity backend.

#[cfg(unix)]
mod unix_backend;
#[cfg(windows)]
mod windows_backend;

#[cfg(unix)]
use unix_backend as backend;
#[cfg(windows)]
use windows_backend as backend;

use std::ffi::OsStr;
use std::sync::Mutex;

use sysinfo::{ProcessesToUpdate, System};

use crate::error::ApplyError;

/// Blocking, synchronous OS operations the engine consumes.
pub trait ProcessControl: Send + Sync {
    /// Takes a fresh snapshot of the system process table and returns the
    /// PIDs whose executable name matches `name` exactly (case-sensitive,
    /// no globbing). A failed snapshot reads as "no processes found".
    fn pids_by_name(&self, name: &str) -> Vec<u32>;

    /// Reads the process's current affinity mask.
    fn affinity(&self, pid: u32) -> Result<u64, ApplyError>;

    /// Sets the process's affinity mask.
    fn set_affinity(&self, pid: u32, mask: u64) -> Result<(), ApplyError>;

    /// The machine's active-processor mask.
    fn system_mask(&self) -> u64;
}

/// Real OS implementation of [`ProcessControl`].
pub struct NativeControl {
    system: Mutex<System>,
    system_mask: u64,
}

impl NativeControl {
    pub fn new() -> Self {
        let system = System::new_all();
        let cpus = system.cpus().len().max(1);
        let system_mask = if cpus >= 64 {
            u64::MAX
        } else {
            (1u64 << cpus) - 1
        };

        NativeControl {
            system: Mutex::new(system),
            system_mask,
        }
    }
}

impl Default for NativeControl {
    fn default() -> Self {
        NativeControl::new()
    }
}

impl ProcessControl for NativeControl {
    fn pids_by_name(&self, name: &str) -> Vec<u32> {
        let mut system = self.system.lock().unwrap();
        system.refresh_processes(ProcessesToUpdate::All, true);
        system
            .processes()
            .values()
            .filter(|p| p.name() == OsStr::new(name))
            .map(|p| p.pid().as_u32())
            .collect()
    }

    fn affinity(&self, pid: u32) -> Result<u64, ApplyError> {
        backend::get_affinity(pid)
    }

    fn set_affinity(&self, pid: u32, mask: u64) -> Result<(), ApplyError> {
        backend::set_affinity(pid, mask)
    }

    fn system_mask(&self) -> u64 {
        self.system_mask
    }
}
