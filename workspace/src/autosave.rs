//! Deadline bookkeeping for the auto-save task.
//!
//! Two triggers feed the same save path: a debounce that fires once the
//! edits go quiet, and a fixed interval that fires regardless of edit
//! activity. [`AutosaveSchedule`] is the pure part: it takes instants in
//! and hands deadlines out, so the clear-before-reset discipline can be
//! tested without sleeping.

use std::time::Duration;

use tokio::time::Instant;

/// Timings for the two auto-save triggers.
#[derive(Debug, Clone, Copy)]
pub struct AutosavePolicy {
    /// Save fires this long after the last edit.
    pub debounce: Duration,
    /// Save fires this often regardless of edits.
    pub interval: Duration,
}

impl Default for AutosavePolicy {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(2),
            interval: Duration::from_secs(30),
        }
    }
}

/// Tracks the pending debounce deadline and the interval anchor.
#[derive(Debug)]
pub struct AutosaveSchedule {
    policy: AutosavePolicy,
    last_edit: Option<Instant>,
    interval_anchor: Instant,
}

impl AutosaveSchedule {
    pub fn new(policy: AutosavePolicy, now: Instant) -> Self {
        Self {
            policy,
            last_edit: None,
            interval_anchor: now,
        }
    }

    /// An edit happened: the debounce deadline moves, replacing any
    /// pending one.
    pub fn record_edit(&mut self, now: Instant) {
        self.last_edit = Some(now);
    }

    /// The next instant a save might be due.
    pub fn next_deadline(&self) -> Instant {
        let interval = self.interval_anchor + self.policy.interval;
        match self.last_edit {
            Some(edit) => interval.min(edit + self.policy.debounce),
            None => interval,
        }
    }

    /// Whether a save should fire at `now`. A firing debounce is cleared
    /// and a firing interval is re-anchored, so neither trigger can
    /// stack.
    pub fn fire(&mut self, now: Instant) -> bool {
        let mut due = false;
        if let Some(edit) = self.last_edit
            && now >= edit + self.policy.debounce
        {
            self.last_edit = None;
            due = true;
        }
        if now >= self.interval_anchor + self.policy.interval {
            self.interval_anchor = now;
            due = true;
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AutosavePolicy {
        AutosavePolicy {
            debounce: Duration::from_secs(2),
            interval: Duration::from_secs(30),
        }
    }

    #[test]
    fn quiet_schedule_waits_for_the_interval() {
        let t0 = Instant::now();
        let schedule = AutosaveSchedule::new(policy(), t0);
        assert_eq!(schedule.next_deadline(), t0 + Duration::from_secs(30));
    }

    #[test]
    fn later_edits_replace_the_pending_deadline() {
        let t0 = Instant::now();
        let mut schedule = AutosaveSchedule::new(policy(), t0);
        schedule.record_edit(t0);
        schedule.record_edit(t0 + Duration::from_secs(1));
        assert_eq!(schedule.next_deadline(), t0 + Duration::from_secs(3));

        // not due before the moved deadline
        assert!(!schedule.fire(t0 + Duration::from_secs(2)));
        assert!(schedule.fire(t0 + Duration::from_secs(3)));
        // debounce cleared: only the interval remains
        assert_eq!(schedule.next_deadline(), t0 + Duration::from_secs(30));
    }

    #[test]
    fn interval_fires_without_edits_and_re_anchors() {
        let t0 = Instant::now();
        let mut schedule = AutosaveSchedule::new(policy(), t0);
        let t1 = t0 + Duration::from_secs(30);
        assert!(schedule.fire(t1));
        assert_eq!(schedule.next_deadline(), t1 + Duration::from_secs(30));
    }

    #[test]
    fn debounce_and_interval_due_together_fire_once() {
        let t0 = Instant::now();
        let mut schedule = AutosaveSchedule::new(policy(), t0);
        schedule.record_edit(t0 + Duration::from_secs(29));
        let t1 = t0 + Duration::from_secs(31);
        assert!(schedule.fire(t1));
        // both triggers consumed
        assert!(!schedule.fire(t1 + Duration::from_millis(1)));
    }
}
