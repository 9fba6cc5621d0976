//! Windows affinity backend via `OpenProcess` + `{Get,Set}ProcessAffinityMask`.

use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Threading::{
    GetProcessAffinityMask, OpenProcess, SetProcessAffinityMask, PROCESS_QUERY_INFORMATION,
    PROCESS_SET_INFORMATION,
};

use crate::error::ApplyError;

fn open(pid: u32) -> Result<HANDLE, ApplyError> {
    unsafe { OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_SET_INFORMATION, false, pid) }
        .map_err(|e| ApplyError::HandleOpenDenied(e.to_string()))
}

pub(super) fn get_affinity(pid: u32) -> Result<u64, ApplyError> {
    let handle = open(pid)?;
    let mut process_mask = 0usize;
    let mut system_mask = 0usize;

    let result = unsafe { GetProcessAffinityMask(handle, &mut process_mask, &mut system_mask) };
    let _ = unsafe { CloseHandle(handle) };

    result.map_err(|_| ApplyError::MaskRejected)?;
    Ok(process_mask as u64)
}

pub(super) fn set_affinity(pid: u32, mask: u64) -> Result<(), ApplyError> {
    let handle = open(pid)?;

    let result = unsafe { SetProcessAffinityMask(handle, mask as usize) };
    let _ = unsafe { CloseHandle(handle) };

    result.map_err(|_| ApplyError::MaskRejected)
}
