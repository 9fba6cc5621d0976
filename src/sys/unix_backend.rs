//! Unix affinity backend via the `sched_{get,set}affinity` syscalls.

use nix::errno::Errno;
use nix::sched::{sched_getaffinity, sched_setaffinity, CpuSet};
use nix::unistd::Pid;

use crate::error::ApplyError;

pub(super) fn get_affinity(pid: u32) -> Result<u64, ApplyError> {
    let set = sched_getaffinity(Pid::from_raw(pid as i32)).map_err(map_errno)?;

    let mut mask = 0u64;
    for cpu in 0..CpuSet::count().min(64) {
        if set.is_set(cpu).unwrap_or(false) {
            mask |= 1u64 << cpu;
        }
    }
    Ok(mask)
}

pub(super) fn set_affinity(pid: u32, mask: u64) -> Result<(), ApplyError> {
    let mut set = CpuSet::new();
    for cpu in 0..CpuSet::count().min(64) {
        if mask & (1u64 << cpu) != 0 {
            set.set(cpu).map_err(|_| ApplyError::MaskRejected)?;
        }
    }

    sched_setaffinity(Pid::from_raw(pid as i32), &set).map_err(map_errno)
}

fn map_errno(err: Errno) -> ApplyError {
    match err {
        // No permission over the target, or it vanished between the
        // snapshot and the syscall.
        Errno::EPERM | Errno::EACCES | Errno::ESRCH => {
            ApplyError::HandleOpenDenied(err.to_string())
        }
        _ => ApplyError::MaskRejected,
    }
}
