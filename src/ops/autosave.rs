use std::time::{Duration, Instant};

use crate::model::config::AutosaveConfig;

/// Which deferred actions are due
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fired {
    pub cleanup: bool,
    pub save: bool,
}

impl Fired {
    pub fn any(self) -> bool {
        self.cleanup || self.save
    }
}

/// Debounced autosave plus the deferred cleanup trigger.
///
/// Both are single deadlines: arming again moves the deadline instead of
/// queueing another one. Time is passed in, so callers (and tests) drive it.
#[derive(Debug, Clone)]
pub struct AutosavePolicy {
    interval: Duration,
    cleanup_delay: Duration,
    save_at: Option<Instant>,
    cleanup_at: Option<Instant>,
}

impl AutosavePolicy {
    pub fn new(interval: Duration, cleanup_delay: Duration) -> Self {
        AutosavePolicy {
            interval,
            // A zero delay would run cleanup inside the mutation that armed it
            cleanup_delay: cleanup_delay.max(Duration::from_millis(1)),
            save_at: None,
            cleanup_at: None,
        }
    }

    pub fn from_config(config: &AutosaveConfig) -> Self {
        Self::new(
            Duration::from_millis(config.interval_ms),
            Duration::from_millis(config.cleanup_delay_ms),
        )
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// A data-affecting mutation happened at `now`
    pub fn arm(&mut self, now: Instant) {
        self.save_at = Some(now + self.interval);
        self.schedule_cleanup(now);
    }

    /// Request a cleanup pass without scheduling a save
    pub fn schedule_cleanup(&mut self, now: Instant) {
        self.cleanup_at = Some(now + self.cleanup_delay);
    }

    /// Forget both pending deadlines
    pub fn cancel(&mut self) {
        self.save_at = None;
        self.cleanup_at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.save_at.is_some()
    }

    pub fn cleanup_pending(&self) -> bool {
        self.cleanup_at.is_some()
    }

    /// Earliest pending deadline, for sizing an event-loop poll timeout
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.save_at, self.cleanup_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Report and clear every deadline that has passed by `now`
    pub fn fire(&mut self, now: Instant) -> Fired {
        let mut fired = Fired::default();
        if self.cleanup_at.is_some_and(|at| at <= now) {
            self.cleanup_at = None;
            fired.cleanup = true;
        }
        if self.save_at.is_some_and(|at| at <= now) {
            self.save_at = None;
            fired.save = true;
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AutosavePolicy {
        AutosavePolicy::new(Duration::from_millis(3000), Duration::from_millis(10))
    }

    #[test]
    fn nothing_fires_before_deadline() {
        let t0 = Instant::now();
        let mut p = policy();
        p.arm(t0);
        assert_eq!(p.fire(t0 + Duration::from_millis(5)), Fired::default());
        assert!(p.is_armed());
    }

    #[test]
    fn cleanup_fires_before_save() {
        let t0 = Instant::now();
        let mut p = policy();
        p.arm(t0);
        assert_eq!(
            p.fire(t0 + Duration::from_millis(10)),
            Fired { cleanup: true, save: false }
        );
        assert_eq!(
            p.fire(t0 + Duration::from_millis(3000)),
            Fired { cleanup: false, save: true }
        );
        assert!(!p.is_armed());
    }

    #[test]
    fn rearm_resets_deadline_instead_of_stacking() {
        let t0 = Instant::now();
        let mut p = policy();
        p.arm(t0);
        p.arm(t0 + Duration::from_millis(2000));

        assert!(!p.fire(t0 + Duration::from_millis(3500)).save);
        assert!(p.fire(t0 + Duration::from_millis(5000)).save);
        assert!(!p.fire(t0 + Duration::from_millis(9000)).any());
    }

    #[test]
    fn firing_twice_is_a_no_op() {
        let t0 = Instant::now();
        let mut p = policy();
        p.arm(t0);
        let late = t0 + Duration::from_secs(10);
        assert_eq!(p.fire(late), Fired { cleanup: true, save: true });
        assert_eq!(p.fire(late), Fired::default());
    }

    #[test]
    fn cancel_clears_both() {
        let t0 = Instant::now();
        let mut p = policy();
        p.arm(t0);
        p.cancel();
        assert!(!p.cleanup_pending());
        assert!(p.next_deadline().is_none());
        assert!(!p.fire(t0 + Duration::from_secs(10)).any());
    }

    #[test]
    fn schedule_cleanup_does_not_arm_save() {
        let t0 = Instant::now();
        let mut p = policy();
        p.schedule_cleanup(t0);
        assert!(!p.is_armed());
        assert!(p.cleanup_pending());
        assert_eq!(p.next_deadline(), Some(t0 + Duration::from_millis(10)));
    }

    #[test]
    fn zero_cleanup_delay_is_bumped() {
        let t0 = Instant::now();
        let mut p = AutosavePolicy::new(Duration::from_millis(100), Duration::ZERO);
        p.arm(t0);
        assert!(!p.fire(t0).cleanup);
        assert!(p.fire(t0 + Duration::from_millis(1)).cleanup);
    }
}
