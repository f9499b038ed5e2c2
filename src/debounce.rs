use std::time::{Duration, Instant};

/// Default settle window for slider-driven range updates.
pub const DEFAULT_RANGE_DEBOUNCE: Duration = Duration::from_millis(250);

struct Pending<T> {
    value: T,
    deadline: Instant,
}

/// Single-slot debounce gate with replace-on-new-value semantics.
///
/// A submitted candidate replaces any pending one and re-arms the deadline;
/// superseded values are dropped, never queued. The owner polls the gate
/// from its tick and commits the value once the delay has elapsed with no
/// newer submission. There is no timer thread: deadlines are plain
/// [`Instant`] arithmetic, so a committed value is always applied against
/// the state current at commit time.
pub struct DebounceGate<T> {
    delay: Duration,
    pending: Option<Pending<T>>,
}

impl<T> DebounceGate<T> {
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Replaces any pending candidate and restarts the settle window.
    pub fn submit_at(&mut self, value: T, now: Instant) {
        self.pending = Some(Pending {
            value,
            deadline: now + self.delay,
        });
    }

    pub fn submit(&mut self, value: T) {
        self.submit_at(value, Instant::now());
    }

    /// Takes the pending value if its settle window has elapsed.
    pub fn poll_at(&mut self, now: Instant) -> Option<T> {
        if self.pending.as_ref()?.deadline > now {
            return None;
        }
        self.pending.take().map(|pending| pending.value)
    }

    pub fn poll(&mut self) -> Option<T> {
        self.poll_at(Instant::now())
    }

    /// Takes the pending value immediately, ignoring the deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take().map(|pending| pending.value)
    }

    /// Drops any pending candidate (view teardown).
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<T> Default for DebounceGate<T> {
    fn default() -> Self {
        Self::new(DEFAULT_RANGE_DEBOUNCE)
    }
}
