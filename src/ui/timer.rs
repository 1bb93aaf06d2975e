//! Software timers serviced from the UI owner's tick.
//!
//! Both timers compare against `now_ms` with `wrapping_sub`, so they keep
//! working across the 49-day `u32` millisecond wrap.

/// Restartable single-shot timer (the inactivity deadline).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OneShot {
    period_ms: u32,
    armed_at: Option<u32>,
}

impl OneShot {
    pub const fn new(period_ms: u32) -> Self {
        Self {
            period_ms,
            armed_at: None,
        }
    }

    /// (Re)start the countdown from `now_ms`.
    pub fn reset(&mut self, now_ms: u32) {
        self.armed_at = Some(now_ms);
    }

    pub fn cancel(&mut self) {
        self.armed_at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    /// Milliseconds until expiry, if armed.
    pub fn remaining(&self, now_ms: u32) -> Option<u32> {
        self.armed_at
            .map(|t| self.period_ms.saturating_sub(now_ms.wrapping_sub(t)))
    }

    /// `true` exactly once when the period has elapsed; the timer disarms.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        match self.armed_at {
            Some(t) if now_ms.wrapping_sub(t) >= self.period_ms => {
                self.armed_at = None;
                true
            }
            _ => false,
        }
    }
}

/// Pausable periodic timer (the main-screen clock refresh).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Periodic {
    period_ms: u32,
    last_ms: u32,
    paused: bool,
}

impl Periodic {
    pub const fn new(period_ms: u32, now_ms: u32) -> Self {
        Self {
            period_ms,
            last_ms: now_ms,
            paused: false,
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume and restart the period from `now_ms`.
    pub fn resume(&mut self, now_ms: u32) {
        self.paused = false;
        self.last_ms = now_ms;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// `true` once per elapsed period while running.
    pub fn poll(&mut self, now_ms: u32) -> bool {
        if self.paused || now_ms.wrapping_sub(self.last_ms) < self.period_ms {
            return false;
        }
        self.last_ms = now_ms;
        true
    }
}
