//! Fixed-interval task handle polled from the UI frame loop

use std::time::{Duration, Instant};

/// A recurring task that fires on the UI thread.
///
/// There is no background thread: the owner polls [`IntervalTask::fire_if_due`]
/// from the frame loop, and cancelling just forgets the deadline.
#[derive(Debug, Clone)]
pub struct IntervalTask {
    interval: Duration,
    next_due: Option<Instant>,
}

impl IntervalTask {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Arm the task so it first fires one interval after `now`
    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    /// Returns true when the deadline has passed and re-arms for the next interval.
    ///
    /// Missed intervals are not replayed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval);
                true
            }
            _ => false,
        }
    }

    /// Time left until the next firing, `None` when cancelled
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_per_interval() {
        let start = Instant::now();
        let mut task = IntervalTask::new(Duration::from_secs(30));
        task.start(start);

        assert!(!task.fire_if_due(start + Duration::from_secs(29)));
        assert!(task.fire_if_due(start + Duration::from_secs(30)));
        assert!(!task.fire_if_due(start + Duration::from_secs(31)));
        assert!(task.fire_if_due(start + Duration::from_secs(61)));
    }

    #[test]
    fn test_cancel_stops_firing() {
        let start = Instant::now();
        let mut task = IntervalTask::new(Duration::from_secs(5));
        task.start(start);
        task.cancel();

        assert!(!task.fire_if_due(start + Duration::from_secs(60)));
        assert_eq!(task.remaining(start), None);
    }

    #[test]
    fn test_remaining_saturates() {
        let start = Instant::now();
        let mut task = IntervalTask::new(Duration::from_secs(10));
        task.start(start);

        assert_eq!(task.remaining(start), Some(Duration::from_secs(10)));
        assert_eq!(
            task.remaining(start + Duration::from_secs(15)),
            Some(Duration::ZERO)
        );
    }
}
