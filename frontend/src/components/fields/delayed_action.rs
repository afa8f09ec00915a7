use std::time::{Duration, Instant};

/// A one-shot action scheduled for a future instant. The owner polls it with
/// the current time; cancelling or dropping the owner discards it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DelayedAction {
    deadline: Option<Instant>,
}

impl DelayedAction {
    pub fn new() -> Self {
        Self { deadline: None }
    }

    /// Schedule (or reschedule) to fire `delay` after `now`
    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.deadline = Some(now + delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// True exactly once, on the first poll at or after the deadline
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_after_deadline() {
        let start = Instant::now();
        let mut action = DelayedAction::new();
        action.schedule(start, Duration::from_millis(150));

        assert!(!action.poll(start + Duration::from_millis(149)));
        assert!(action.poll(start + Duration::from_millis(150)));
        assert!(!action.poll(start + Duration::from_millis(500)));
        assert!(!action.is_pending());
    }

    #[test]
    fn test_cancel() {
        let start = Instant::now();
        let mut action = DelayedAction::new();
        action.schedule(start, Duration::from_millis(10));
        action.cancel();
        assert!(!action.poll(start + Duration::from_secs(1)));
    }
}
