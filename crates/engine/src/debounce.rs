//! Trailing-edge debounce driven by explicit timestamps.
//!
//! The debouncer owns no timer. The event loop calls [`Debouncer::poll`] on
//! every tick with the current instant, which keeps the logic deterministic
//! under test.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct PendingInput {
    text: String,
    deadline: Instant,
}

/// Coalesces rapid text changes into one signal after a quiet period.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<PendingInput>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// Record new input; the quiet period restarts from `now`.
    pub fn input(&mut self, text: impl Into<String>, now: Instant) {
        self.pending = Some(PendingInput {
            text: text.into(),
            deadline: now + self.delay,
        });
    }

    /// Returns the latest input once its quiet period has elapsed. Fires at most once per input.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let ready = self.pending.as_ref().is_some_and(|pending| now >= pending.deadline);
        if ready {
            self.pending.take().map(|pending| pending.text)
        } else {
            None
        }
    }

    /// Drop pending input without firing. Returns whether anything was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(300);

    #[test]
    fn fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.input("p", start);
        assert_eq!(debouncer.poll(start + Duration::from_millis(100)), None);
        assert_eq!(debouncer.poll(start + DELAY), Some("p".to_string()));
        assert_eq!(debouncer.poll(start + DELAY * 2), None);
    }

    #[test]
    fn every_keystroke_resets_the_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.input("p", start);
        debouncer.input("pl", start + Duration::from_millis(200));
        assert_eq!(debouncer.poll(start + DELAY), None);
        assert_eq!(debouncer.poll(start + Duration::from_millis(500)), Some("pl".to_string()));
    }

    #[test]
    fn cancel_discards_pending_input() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.input("plc", start);
        assert!(debouncer.cancel());
        assert!(!debouncer.is_pending());
        assert_eq!(debouncer.poll(start + DELAY * 10), None);
    }
}
