//! ISR-fed debounced digital input.
//!
//! ## Model
//!
//! ```text
//!            edge (ISR)              edge (ISR)
//!   Settled ───────────▶ Settling ◀───────────┐
//!      ▲                    │   restarts window│
//!      │   window expired,  └──────────────────┘
//!      └── line re-sampled
//! ```
//!
//! The GPIO ISR only records the edge time and bumps an edge counter
//! (lock-free atomics). A debounce worker calls [`DebouncedInput::service`]
//! every few milliseconds; once `window_ms` has passed since the most recent
//! edge it samples the line *at that moment* and commits the level. Readers
//! see the committed level through [`DebouncedInput::is_asserted`] and never
//! observe a mid-bounce value.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use embedded_hal::digital::InputPin;
use log::{debug, warn};

/// Per-input debounce phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebouncePhase {
    /// Window running; the committed value may be stale.
    Settling,
    /// Window idle; the committed value is authoritative.
    Settled,
}

pub struct DebouncedInput {
    name: &'static str,
    window_ms: u32,
    active_low: bool,
    /// Timestamp of the most recent edge (ISR-written).
    last_edge_ms: AtomicU32,
    /// Incremented on every edge (ISR-written).
    edge_seq: AtomicU32,
    /// `edge_seq` value covered by the last commit (worker-written).
    committed_seq: AtomicU32,
    /// Debounced level, `true` = asserted.
    committed: AtomicBool,
}

impl DebouncedInput {
    pub const fn new(name: &'static str, window_ms: u32, active_low: bool) -> Self {
        Self {
            name,
            window_ms,
            active_low,
            last_edge_ms: AtomicU32::new(0),
            edge_seq: AtomicU32::new(0),
            committed_seq: AtomicU32::new(0),
            committed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Record an edge. Lock-free; safe to call from interrupt context.
    ///
    /// A new edge while settling restarts the window.
    pub fn note_edge(&self, now_ms: u32) {
        self.last_edge_ms.store(now_ms, Ordering::Release);
        self.edge_seq.fetch_add(1, Ordering::AcqRel);
    }

    pub fn phase(&self) -> DebouncePhase {
        if self.edge_seq.load(Ordering::Acquire) == self.committed_seq.load(Ordering::Acquire) {
            DebouncePhase::Settled
        } else {
            DebouncePhase::Settling
        }
    }

    /// The committed (debounced) level.
    pub fn is_asserted(&self) -> bool {
        self.committed.load(Ordering::Acquire)
    }

    /// Commit the current line level if the quiet window has elapsed.
    ///
    /// Returns the newly committed level, or `None` if nothing was committed
    /// (still settling, already settled, or the pin read failed).
    pub fn service<P: InputPin>(&self, now_ms: u32, pin: &mut P) -> Option<bool> {
        let seq = self.edge_seq.load(Ordering::Acquire);
        if seq == self.committed_seq.load(Ordering::Acquire) {
            return None;
        }
        // An edge stamped after `now_ms` was read shows up as a huge age;
        // it is still settling.
        let age = now_ms.wrapping_sub(self.last_edge_ms.load(Ordering::Acquire));
        if age < self.window_ms || age > u32::MAX / 2 {
            return None;
        }

        let level = if self.active_low { pin.is_low() } else { pin.is_high() };
        let asserted = match level {
            Ok(v) => v,
            Err(_) => {
                warn!("Debounce[{}]: pin read failed, retrying", self.name);
                return None;
            }
        };

        // An edge landed while we were sampling: keep settling.
        if self.edge_seq.load(Ordering::Acquire) != seq {
            return None;
        }
        self.committed.store(asserted, Ordering::Release);
        self.committed_seq.store(seq, Ordering::Release);
        Some(asserted)
    }

    /// Commit the current line level without waiting for an edge.
    ///
    /// Used once at startup so the first reading matches the line. Edges
    /// seen before the read are covered by it; later ones settle normally.
    pub fn seed<P: InputPin>(&self, pin: &mut P) -> bool {
        let seq = self.edge_seq.load(Ordering::Acquire);
        let level = if self.active_low { pin.is_low() } else { pin.is_high() };
        let asserted = level.unwrap_or(false);
        self.committed.store(asserted, Ordering::Release);
        self.committed_seq.store(seq, Ordering::Release);
        asserted
    }
}

// ── Worker ────────────────────────────────────────────────────

/// The set of inputs one debounce thread services.
pub struct DebounceWorker<P: InputPin> {
    lines: Vec<(Arc<DebouncedInput>, P)>,
}

impl<P: InputPin> Default for DebounceWorker<P> {
    fn default() -> Self {
        Self { lines: Vec::new() }
    }
}

impl<P: InputPin> DebounceWorker<P> {
    /// Seed `input` from `pin` and start servicing it.
    pub fn add(&mut self, input: Arc<DebouncedInput>, mut pin: P) {
        let asserted = input.seed(&mut pin);
        debug!("Debounce[{}]: initial level asserted={}", input.name(), asserted);
        self.lines.push((input, pin));
    }

    /// Service every input once. Returns how many committed a new level.
    pub fn service_all(&mut self, now_ms: u32) -> usize {
        let mut commits = 0;
        for (input, pin) in &mut self.lines {
            if let Some(asserted) = input.service(now_ms, pin) {
                debug!("Debounce[{}]: committed asserted={}", input.name(), asserted);
                commits += 1;
            }
        }
        commits
    }
}

// ── Simulation pin ────────────────────────────────────────────

/// Host-side input line whose level can be flipped from another thread.
#[cfg(not(target_os = "espidf"))]
#[derive(Clone, Default)]
pub struct SimPin {
    high: std::sync::Arc<AtomicBool>,
}

#[cfg(not(target_os = "espidf"))]
impl SimPin {
    pub fn new(high: bool) -> Self {
        Self {
            high: std::sync::Arc::new(AtomicBool::new(high)),
        }
    }

    pub fn set_high(&self, high: bool) {
        self.high.store(high, Ordering::Release);
    }
}

#[cfg(not(target_os = "espidf"))]
impl embedded_hal::digital::ErrorType for SimPin {
    type Error = core::convert::Infallible;
}

#[cfg(not(target_os = "espidf"))]
impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.high.load(Ordering::Acquire))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.high.load(Ordering::Acquire))
    }
}
