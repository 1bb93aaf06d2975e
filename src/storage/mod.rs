//! SD-card backed persistence beyond the settings file.
//!
//! ```text
//!   log::info!() ──► TeeLogger ──► console (UART / USB-CDC)
//!                        │
//!                        └──► LogFileSink ──► /sdcard/system/logs/L00007.txt
//!                                  ▲
//!                  log-sync thread ┘ (fsync when dirty, every second)
//! ```

pub mod log_rotator;

use std::sync::{Mutex, MutexGuard, TryLockError};
use std::time::{Duration, Instant};

/// Spin on `try_lock` until `timeout` elapses. A poisoned lock is recovered.
pub(crate) fn lock_with_timeout<T>(m: &Mutex<T>, timeout: Duration) -> Option<MutexGuard<'_, T>> {
    let deadline = Instant::now() + timeout;
    loop {
        match m.try_lock() {
            Ok(guard) => return Some(guard),
            Err(TryLockError::Poisoned(p)) => return Some(p.into_inner()),
            Err(TryLockError::WouldBlock) => {
                if Instant::now() >= deadline {
                    return None;
                }
                std::thread::sleep(Duration::from_millis(1));
            }
        }
    }
}
