//! Fault accounting for the tone driver.
//!
//! Audio feedback is a nonessential subsystem: nothing in here stops
//! the host application. Timeouts and rejected calls are latched and
//! counted so the main loop (or a console) can observe them, while the
//! playback path carries on.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Fault codes recording why a driver operation degraded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// The buffer-fetched signal did not appear within its bound after
    /// a transfer start. The chunk was abandoned with the peripheral
    /// still running.
    FetchTimeout = 1,

    /// The stopped signal did not appear within its bound after a stop
    /// command.
    StopTimeout = 2,

    /// A playback call arrived before `initialize()` succeeded and was
    /// rejected without touching the hardware.
    NotConfigured = 3,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => FaultCode::FetchTimeout,
            2 => FaultCode::StopTimeout,
            3 => FaultCode::NotConfigured,
            _ => FaultCode::None,
        }
    }
}

/// Latched fault state with a lifetime counter.
///
/// Set by the transfer scheduler and the playback guards; read from
/// wherever health is reported. All access is atomic, so the state can
/// be inspected from outside the playback path.
pub struct FaultState {
    /// True if a fault is latched.
    active: AtomicBool,

    /// Fault code (reason).
    code: AtomicU8,

    /// Additional data (sample count of the failed chunk, or the
    /// rejected frequency for `NotConfigured`).
    data: AtomicU32,

    /// Total fault count since boot (never cleared).
    count: AtomicU32,
}

impl FaultState {
    /// Create new fault state (no fault).
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            code: AtomicU8::new(0),
            data: AtomicU32::new(0),
            count: AtomicU32::new(0),
        }
    }

    /// Latch a fault with the given code and data.
    ///
    /// Increments the lifetime counter.
    #[inline]
    pub fn set(&self, code: FaultCode, data: u32) {
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }

    /// Check whether a fault is currently latched.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Latched fault code (only meaningful while `is_active()`).
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    /// Fault data (meaning depends on the code).
    #[inline]
    pub fn data(&self) -> u32 {
        self.data.load(Ordering::Acquire)
    }

    /// Total fault count since boot.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Clear the latched fault.
    ///
    /// The lifetime counter is preserved for diagnostics.
    #[inline]
    pub fn clear(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Snapshot of the current fault state.
    #[inline]
    pub fn snapshot(&self) -> FaultSnapshot {
        FaultSnapshot {
            active: self.is_active(),
            code: self.code(),
            data: self.data(),
            count: self.count(),
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of [`FaultState`].
#[derive(Clone, Copy, Debug)]
pub struct FaultSnapshot {
    pub active: bool,
    pub code: FaultCode,
    pub data: u32,
    pub count: u32,
}
