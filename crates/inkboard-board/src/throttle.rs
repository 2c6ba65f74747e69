//! Trailing-edge throttle
//!
//! Lets at most one value through per interval. A value offered inside the
//! window is parked; a newer offer replaces it, and [`Throttle::poll`]
//! releases the most recent one once the window closes.

use std::time::{Duration, Instant};

/// Rate limiter with trailing-edge coalescing
#[derive(Debug, Clone)]
pub struct Throttle<T> {
    interval: Duration,
    last_sent: Option<Instant>,
    pending: Option<T>,
}

impl<T> Throttle<T> {
    /// Create a throttle that releases at most one value per `interval`
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sent: None,
            pending: None,
        }
    }

    fn window_open(&self, now: Instant) -> bool {
        self.last_sent
            .map_or(true, |last| now.duration_since(last) >= self.interval)
    }

    /// Offer a value. Returns it if it may go out now; otherwise parks it.
    pub fn offer(&mut self, now: Instant, value: T) -> Option<T> {
        if self.window_open(now) {
            self.last_sent = Some(now);
            self.pending = None;
            Some(value)
        } else {
            self.pending = Some(value);
            None
        }
    }

    /// Release the parked value if its window has closed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.pending.is_some() && self.window_open(now) {
            self.last_sent = Some(now);
            self.pending.take()
        } else {
            None
        }
    }

    /// Drop the parked value, if any
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take()
    }

    /// Whether a value is parked
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the parked value becomes releasable
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        self.last_sent.map(|last| last + self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(50);

    #[test]
    fn test_leading_value_passes() {
        let mut throttle = Throttle::new(INTERVAL);
        let t0 = Instant::now();
        assert_eq!(throttle.offer(t0, 1), Some(1));
        assert!(!throttle.has_pending());
    }

    #[test]
    fn test_trailing_value_is_most_recent() {
        let mut throttle = Throttle::new(INTERVAL);
        let t0 = Instant::now();
        throttle.offer(t0, 1);

        assert_eq!(throttle.offer(t0 + Duration::from_millis(10), 2), None);
        assert_eq!(throttle.offer(t0 + Duration::from_millis(20), 3), None);
        assert_eq!(throttle.next_deadline(), Some(t0 + INTERVAL));

        assert_eq!(throttle.poll(t0 + Duration::from_millis(30)), None);
        assert_eq!(throttle.poll(t0 + INTERVAL), Some(3));
        assert_eq!(throttle.poll(t0 + INTERVAL * 3), None);
    }

    #[test]
    fn test_window_restarts_after_trailing_send() {
        let mut throttle = Throttle::new(INTERVAL);
        let t0 = Instant::now();
        throttle.offer(t0, 1);
        throttle.offer(t0 + Duration::from_millis(10), 2);
        assert_eq!(throttle.poll(t0 + INTERVAL), Some(2));

        // Inside the new window opened by the trailing send
        assert_eq!(throttle.offer(t0 + INTERVAL + Duration::from_millis(5), 3), None);
        assert_eq!(throttle.offer(t0 + INTERVAL * 2, 4), Some(4));
    }

    #[test]
    fn test_cancel_drops_pending() {
        let mut throttle = Throttle::new(INTERVAL);
        let t0 = Instant::now();
        throttle.offer(t0, 1);
        throttle.offer(t0 + Duration::from_millis(1), 2);

        assert_eq!(throttle.cancel(), Some(2));
        assert_eq!(throttle.next_deadline(), None);
        assert_eq!(throttle.poll(t0 + INTERVAL), None);
    }
}
