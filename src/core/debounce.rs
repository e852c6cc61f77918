//! Cancel-and-reschedule debouncing for tick-driven event loops.
//!
//! A [`Debouncer`] holds at most one pending value. Scheduling a new value
//! replaces the pending one and restarts the quiet window; [`Debouncer::poll`]
//! releases the value once the window has elapsed with no further activity.

use std::time::{Duration, Instant};

/// Default quiet window for search input.
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending value and restart the window from `now`.
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Take the pending value if the window has elapsed at `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((_, at)) if now.saturating_duration_since(at) >= self.delay => {
                self.pending.take().map(|(value, _)| value)
            }
            _ => None,
        }
    }

    /// Take the pending value immediately, ignoring the window.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn test_fires_after_quiet_window() {
        let start = Instant::now();
        let mut d = Debouncer::new(200 * MS);
        d.schedule("rust", start);
        assert_eq!(d.poll(start + 199 * MS), None);
        assert_eq!(d.poll(start + 200 * MS), Some("rust"));
        assert!(!d.is_pending());
        assert_eq!(d.poll(start + 400 * MS), None);
    }

    #[test]
    fn test_keystrokes_reset_the_timer() {
        let start = Instant::now();
        let mut d = Debouncer::new(200 * MS);
        d.schedule("r", start);
        d.schedule("ru", start + 150 * MS);
        d.schedule("rus", start + 300 * MS);
        // 200ms after the first keystroke, but only 50ms after the last one.
        assert_eq!(d.poll(start + 350 * MS), None);
        // Only the latest value is ever released.
        assert_eq!(d.poll(start + 500 * MS), Some("rus"));
    }

    #[test]
    fn test_cancel_and_flush() {
        let start = Instant::now();
        let mut d = Debouncer::new(200 * MS);
        d.schedule(1, start);
        d.cancel();
        assert_eq!(d.poll(start + 1000 * MS), None);

        d.schedule(2, start);
        assert_eq!(d.flush(), Some(2));
        assert_eq!(d.flush(), None);
    }

    #[test]
    fn test_default_window() {
        let d: Debouncer<String> = Debouncer::default();
        assert_eq!(d.delay(), Duration::from_millis(200));
    }
}
