// ============================================================================
// scheduler.rs — WASD Viewport Controls
// Fixed-period movement ticker, polled by the host event loop.
// ============================================================================

use std::time::{Duration, Instant};

use crate::config::MAX_CATCH_UP_TICKS;

/// A single recurring timer. While active it owns the deadline of the next
/// tick; the event loop sleeps until that deadline and then polls.
#[derive(Debug)]
pub struct TickScheduler {
    period: Duration,
    next_due: Option<Instant>,
}

impl TickScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period: period.max(Duration::from_millis(1)),
            next_due: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_active(&self) -> bool {
        self.next_due.is_some()
    }

    /// Arm the timer. The first tick fires one period after `now`.
    /// Starting an active timer keeps its phase. A deadline past the end of
    /// the clock leaves the timer idle.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.next_due.is_some() {
            return false;
        }
        let Some(due) = now.checked_add(self.period) else {
            log::warn!("Tick period {:?} overflows the clock; timer not started", self.period);
            return false;
        };
        self.next_due = Some(due);
        true
    }

    pub fn stop(&mut self) -> bool {
        self.next_due.take().is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_due
    }

    /// Number of ticks due at `now`, advancing the deadline past them.
    /// After a long stall at most `MAX_CATCH_UP_TICKS` are reported and the
    /// phase restarts from `now`.
    pub fn poll(&mut self, now: Instant) -> u32 {
        let Some(mut due) = self.next_due else {
            return 0;
        };

        let mut ticks = 0;
        while due <= now {
            ticks += 1;
            let Some(next) = due.checked_add(self.period) else {
                self.next_due = None;
                return ticks;
            };
            due = next;
            if ticks == MAX_CATCH_UP_TICKS {
                if due <= now {
                    match now.checked_add(self.period) {
                        Some(resync) => due = resync,
                        None => {
                            self.next_due = None;
                            return ticks;
                        }
                    }
                }
                break;
            }
        }
        self.next_due = Some(due);
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_millis(5);

    #[test]
    fn idle_timer_never_ticks() {
        let mut sched = TickScheduler::new(PERIOD);
        assert!(!sched.is_active());
        assert_eq!(sched.poll(Instant::now() + Duration::from_secs(1)), 0);
        assert!(!sched.stop());
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let t0 = Instant::now();
        let mut sched = TickScheduler::new(PERIOD);
        assert!(sched.start(t0));
        assert!(!sched.start(t0 + Duration::from_millis(3)));
        assert_eq!(sched.next_deadline(), Some(t0 + PERIOD));
        assert!(sched.stop());
        assert!(!sched.stop());
        assert!(sched.next_deadline().is_none());
    }

    #[test]
    fn ticks_once_per_period() {
        let t0 = Instant::now();
        let mut sched = TickScheduler::new(PERIOD);
        sched.start(t0);

        assert_eq!(sched.poll(t0 + Duration::from_millis(4)), 0);
        assert_eq!(sched.poll(t0 + Duration::from_millis(5)), 1);
        assert_eq!(sched.poll(t0 + Duration::from_millis(9)), 0);
        assert_eq!(sched.poll(t0 + Duration::from_millis(21)), 3);
        assert_eq!(sched.next_deadline(), Some(t0 + Duration::from_millis(25)));
    }

    #[test]
    fn long_stall_is_capped_and_resynchronised() {
        let t0 = Instant::now();
        let mut sched = TickScheduler::new(PERIOD);
        sched.start(t0);

        let late = t0 + Duration::from_millis(500);
        assert_eq!(sched.poll(late), MAX_CATCH_UP_TICKS);
        assert_eq!(sched.next_deadline(), Some(late + PERIOD));
    }

    #[test]
    fn overflowing_period_leaves_timer_idle() {
        let mut sched = TickScheduler::new(Duration::MAX);
        assert!(!sched.start(Instant::now()));
        assert!(!sched.is_active());
        assert_eq!(sched.poll(Instant::now()), 0);
    }

    #[test]
    fn zero_period_is_raised_to_one_millisecond() {
        let sched = TickScheduler::new(Duration::ZERO);
        assert_eq!(sched.period(), Duration::from_millis(1));
    }
}
