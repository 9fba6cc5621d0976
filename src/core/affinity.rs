//! Idempotent affinity application.

use crate::error::ApplyError;
use crate::sys::ProcessControl;

/// Applies `desired_mask` to the process, skipping the OS mutator when the
/// current mask already matches (permission-sensitive calls are not made
/// needlessly). After a set, the mask is re-read and success is reported
/// only if it took effect.
pub fn apply(control: &dyn ProcessControl, pid: u32, desired_mask: u32) -> Result<(), ApplyError> {
    let desired = u64::from(desired_mask);

    if control.affinity(pid)? == desired {
        return Ok(());
    }

    control.set_affinity(pid, desired)?;

    if control.affinity(pid)? == desired {
        Ok(())
    } else {
        Err(ApplyError::MaskRejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::testing::FakeControl;

    #[test]
    fn test_apply_sets_and_verifies() {
        let control = FakeControl::new(u64::MAX);
        control.spawn(100, "app.exe", 0xFF);

        apply(&control, 100, 0x3).unwrap();
        assert_eq!(control.mask_of(100), Some(0x3));
        assert_eq!(control.set_calls(), 1);
    }

    #[test]
    fn test_apply_is_idempotent_without_mutator_call() {
        let control = FakeControl::new(u64::MAX);
        control.spawn(100, "app.exe", 0x3);

        apply(&control, 100, 0x3).unwrap();
        assert_eq!(control.set_calls(), 0, "mutator must not be called");
    }

    #[test]
    fn test_apply_denied_handle() {
        let control = FakeControl::new(u64::MAX);
        control.spawn(100, "app.exe", 0xFF);
        control.deny(100);

        let err = apply(&control, 100, 0x3).unwrap_err();
        assert!(matches!(err, ApplyError::HandleOpenDenied(_)));
    }

    #[test]
    fn test_apply_reports_rejection_when_set_does_not_stick() {
        let control = FakeControl::new(u64::MAX);
        control.spawn(100, "app.exe", 0xFF);
        control.make_set_ineffective(100);

        let err = apply(&control, 100, 0x3).unwrap_err();
        assert_eq!(err, ApplyError::MaskRejected);
        assert_eq!(control.mask_of(100), Some(0xFF));
    }

    #[test]
    fn test_apply_missing_process() {
        let control = FakeControl::new(u64::MAX);
        let err = apply(&control, 999, 0x3).unwrap_err();
        assert!(matches!(err, ApplyError::HandleOpenDenied(_)));
    }
}
