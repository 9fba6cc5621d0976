//! Periodic enforcement scheduler.
//!
//! One dedicated worker thread owns the repeating timer and runs enforcement
//! passes synchronously and sequentially, so ticks never overlap. A `Stop`
//! message on the control channel cancels the timer between ticks; a tick
//! already in flight completes first.

use std::sync::{mpsc, Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::core::affinity;
use crate::core::rules::RuleSet;
use crate::sys::ProcessControl;

/// Idle/Running state machine around the enforcement worker thread.
#[derive(Default)]
pub struct Scheduler {
    worker: Option<Worker>,
}

struct Worker {
    stop_tx: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler::default()
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Arms the repeating timer and starts ticking. The first pass runs
    /// immediately, not after one full period. A zero period means a single
    /// immediate pass. No-op if already running.
    pub fn start(
        &mut self,
        period: Duration,
        rules: Arc<Mutex<RuleSet>>,
        control: Arc<dyn ProcessControl>,
    ) {
        if self.worker.is_some() {
            return;
        }

        let (stop_tx, stop_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name("enforcement".into())
            .spawn(move || {
                run_pass(&rules, control.as_ref());

                if period.is_zero() {
                    // One-shot timer: hold the thread until Stop.
                    let _ = stop_rx.recv();
                    return;
                }

                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(mpsc::RecvTimeoutError::Timeout) => {
                            run_pass(&rules, control.as_ref());
                        }
                        Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .expect("failed to spawn enforcement thread");

        self.worker = Some(Worker { stop_tx, handle });
        tracing::debug!("Enforcement started (period {:?})", period);
    }

    /// Cancels the timer and joins the worker. Returns once no further
    /// ticks can run. No-op when idle.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = worker.stop_tx.send(());
            let _ = worker.handle.join();
            tracing::debug!("Enforcement stopped");
        }
    }
}

/// One enforcement pass over every configured rule, in index order.
///
/// The (name, mask) targets are copied out under the lock and the OS calls
/// run unlocked, so status reads never wait on a blocking syscall; only the
/// `applied` flags are written back.
fn run_pass(rules: &Mutex<RuleSet>, control: &dyn ProcessControl) {
    let targets = rules.lock().unwrap().targets();

    for (index, name, mask) in targets {
        let applied = enforce_rule(control, &name, mask);

        let mut guard = rules.lock().unwrap();
        let was_applied = guard.get(index).map(|r| r.applied).unwrap_or(false);
        if applied && !was_applied {
            tracing::info!("Pinned {name} to affinity mask {mask:X}");
        } else if !applied && was_applied {
            tracing::debug!("Lost affinity enforcement of {name}");
        }
        guard.set_applied(index, applied);
    }
}

/// Matches `name` against a fresh process snapshot and applies the mask to
/// every match. Reports true only when at least one process matched and all
/// matches accepted the mask; an absent process always reads as not applied.
fn enforce_rule(control: &dyn ProcessControl, name: &str, mask: u32) -> bool {
    let pids = control.pids_by_name(name);
    if pids.is_empty() {
        return false;
    }

    let mut all_applied = true;
    for pid in pids {
        if let Err(e) = affinity::apply(control, pid, mask) {
            tracing::debug!("Could not pin {name} (PID {pid}): {e}");
            all_applied = false;
        }
    }
    all_applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sys::testing::FakeControl;

    const TICK: Duration = Duration::from_millis(20);

    fn rule_set(pairs: &[(&str, u32)]) -> Arc<Mutex<RuleSet>> {
        let mut rules = RuleSet::new();
        for (i, (name, mask)) in pairs.iter().enumerate() {
            rules.set(i, name, *mask).unwrap();
        }
        Arc::new(Mutex::new(rules))
    }

    fn applied(rules: &Mutex<RuleSet>, index: usize) -> bool {
        rules.lock().unwrap().get(index).unwrap().applied
    }

    #[test]
    fn test_first_tick_fires_immediately() {
        let control = Arc::new(FakeControl::new(u64::MAX));
        control.spawn(1, "app.exe", 0xFF);
        let rules = rule_set(&[("app.exe", 0x3)]);

        let mut scheduler = Scheduler::new();
        // Period far longer than the test: only the immediate fire can run.
        scheduler.start(Duration::from_secs(60), Arc::clone(&rules), control.clone());
        thread::sleep(Duration::from_millis(50));

        assert!(applied(&rules, 0));
        assert_eq!(control.mask_of(1), Some(0x3));
        scheduler.stop();
    }

    #[test]
    fn test_absent_then_present_process() {
        let control = Arc::new(FakeControl::new(u64::MAX));
        let rules = rule_set(&[("app.exe", 0x3)]);

        let mut scheduler = Scheduler::new();
        scheduler.start(TICK, Arc::clone(&rules), control.clone());
        thread::sleep(TICK * 3);
        assert!(!applied(&rules, 0), "absent process must read not applied");

        control.spawn(7, "app.exe", 0xFF);
        thread::sleep(TICK * 3);
        assert!(applied(&rules, 0));
        assert_eq!(control.mask_of(7), Some(0x3));
        scheduler.stop();
    }

    #[test]
    fn test_applied_resets_when_process_disappears() {
        let control = Arc::new(FakeControl::new(u64::MAX));
        control.spawn(7, "app.exe", 0x3);
        let rules = rule_set(&[("app.exe", 0x3)]);

        let mut scheduler = Scheduler::new();
        scheduler.start(TICK, Arc::clone(&rules), control.clone());
        thread::sleep(TICK * 3);
        assert!(applied(&rules, 0));

        control.kill(7);
        thread::sleep(TICK * 3);
        assert!(!applied(&rules, 0), "status must not persist across absence");
        scheduler.stop();
    }

    #[test]
    fn test_stop_halts_ticks() {
        let control = Arc::new(FakeControl::new(u64::MAX));
        let rules = rule_set(&[("app.exe", 0x3)]);

        let mut scheduler = Scheduler::new();
        scheduler.start(TICK, Arc::clone(&rules), control.clone());
        thread::sleep(TICK * 3);
        scheduler.stop();
        assert!(!scheduler.is_running());

        let calls_after_stop = control.snapshot_calls();
        thread::sleep(TICK * 4);
        assert_eq!(control.snapshot_calls(), calls_after_stop);
    }

    #[test]
    fn test_zero_period_runs_single_pass() {
        let control = Arc::new(FakeControl::new(u64::MAX));
        control.spawn(1, "app.exe", 0xFF);
        let rules = rule_set(&[("app.exe", 0x3)]);

        let mut scheduler = Scheduler::new();
        scheduler.start(Duration::ZERO, Arc::clone(&rules), control.clone());
        thread::sleep(Duration::from_millis(50));

        assert!(applied(&rules, 0));
        assert_eq!(control.snapshot_calls(), 1);
        scheduler.stop();
    }

    #[test]
    fn test_failed_rule_is_retried_each_tick() {
        let control = Arc::new(FakeControl::new(u64::MAX));
        control.spawn(9, "app.exe", 0xFF);
        control.deny(9);
        let rules = rule_set(&[("app.exe", 0x3)]);

        let mut scheduler = Scheduler::new();
        scheduler.start(TICK, Arc::clone(&rules), control.clone());
        thread::sleep(TICK * 3);
        assert!(!applied(&rules, 0));
        let attempts = control.snapshot_calls();
        assert!(attempts >= 2, "expected repeated attempts, saw {attempts}");
        scheduler.stop();
    }

    #[test]
    fn test_rules_enforced_in_index_order() {
        let control = Arc::new(FakeControl::new(u64::MAX));
        control.spawn(1, "a.exe", 0xFF);
        control.spawn(2, "b.exe", 0xFF);
        let rules = rule_set(&[("a.exe", 0x1), ("b.exe", 0x2)]);

        run_pass(&rules, control.as_ref());

        assert_eq!(control.mask_of(1), Some(0x1));
        assert_eq!(control.mask_of(2), Some(0x2));
        assert!(applied(&rules, 0) && applied(&rules, 1));
    }

    #[test]
    fn test_all_matches_must_accept_the_mask() {
        let control = Arc::new(FakeControl::new(u64::MAX));
        control.spawn(1, "app.exe", 0xFF);
        control.spawn(2, "app.exe", 0xFF);
        control.deny(2);
        let rules = rule_set(&[("app.exe", 0x3)]);

        run_pass(&rules, control.as_ref());

        assert_eq!(control.mask_of(1), Some(0x3));
        assert!(!applied(&rules, 0));
    }

    #[test]
    fn test_start_is_noop_while_running() {
        let control = Arc::new(FakeControl::new(u64::MAX));
        let rules = rule_set(&[]);

        let mut scheduler = Scheduler::new();
        scheduler.start(Duration::from_secs(60), Arc::clone(&rules), control.clone());
        scheduler.start(Duration::from_secs(60), Arc::clone(&rules), control.clone());
        assert!(scheduler.is_running());
        scheduler.stop();
        assert!(!scheduler.is_running());
    }
}
