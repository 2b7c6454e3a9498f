//! Quiet-period gate for search input.
//!
//! The caller supplies the clock. Each [`Debouncer::input`] restarts the
//! quiet period; [`Debouncer::poll`] releases the latest value once the
//! period has elapsed with no further input.

use std::time::{Duration, Instant};

/// Default quiet period for search input.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Records a new value, replacing any pending one.
    pub fn input(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.quiet));
    }

    /// When the pending value becomes ready, if there is one.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at)
    }

    /// Takes the pending value if its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.deadline() {
            Some(at) if now >= at => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}
