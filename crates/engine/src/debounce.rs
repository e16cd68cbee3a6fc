//! Deadline-based debouncer.
//!
//! `Idle -> Pending(deadline) -> Fired -> Idle`. Every push while idle or
//! pending moves the deadline; the latest value wins.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    Idle,
    Pending { deadline: Instant },
    Fired,
}

#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    state: DebounceState,
    latest: Option<T>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self { delay, state: DebounceState::Idle, latest: None }
    }

    pub fn state(&self) -> DebounceState {
        self.state
    }

    pub fn push(&mut self, value: T, now: Instant) {
        self.latest = Some(value);
        self.state = DebounceState::Pending { deadline: now + self.delay };
    }

    /// Returns the latest value once the quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.state {
            DebounceState::Fired => {
                self.state = DebounceState::Idle;
                None
            }
            DebounceState::Pending { deadline } if now >= deadline => {
                self.state = DebounceState::Fired;
                self.latest.take()
            }
            _ => None,
        }
    }

    /// Drop any pending value.
    pub fn clear(&mut self) {
        self.state = DebounceState::Idle;
        self.latest = None;
    }
}
