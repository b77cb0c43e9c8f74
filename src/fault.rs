//! Fault state for the ICSP serializer.
//!
//! The timer callback cannot return errors to anyone. When a pin write
//! fails it latches a fault here and stops emitting; the supervisor in
//! `main` polls the state, stops the timer and parks the pins low.
//!
//! A programmer that keeps clocking after a failed write corrupts the
//! target. A programmer that stops is safe.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Fault codes indicating why the serializer stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum FaultCode {
    /// No fault (normal operation).
    None = 0,

    /// Clock or data pin write failed inside the timer callback.
    PinWrite = 1,
}

impl FaultCode {
    /// Convert from raw u8 value.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => FaultCode::None,
            1 => FaultCode::PinWrite,
            _ => FaultCode::None,
        }
    }
}

/// Thread-safe fault state.
///
/// # Usage
///
/// ```ignore
/// static FAULT: FaultState = FaultState::new();
///
/// // In timer callback:
/// if serializer.tick(&mut clk, &mut dat).is_err() {
///     FAULT.set(FaultCode::PinWrite, serializer.stats().bits_emitted);
/// }
///
/// // In supervisor:
/// if FAULT.is_active() {
///     timer.stop();
/// }
/// ```
pub struct FaultState {
    /// True if fault is active.
    active: AtomicBool,

    /// Fault code (reason for fault).
    code: AtomicU8,

    /// Additional data (bits emitted when the fault hit).
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

    /// Latch a fault.
    #[inline]
    pub fn set(&self, code: FaultCode, data: u32) {
        self.code.store(code as u8, Ordering::Release);
        self.data.store(data, Ordering::Release);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.active.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Only meaningful if `is_active()` is true.
    #[inline]
    pub fn code(&self) -> FaultCode {
        FaultCode::from_u8(self.code.load(Ordering::Acquire))
    }

    #[inline]
    pub fn data(&self) -> u32 {
        self.data.load(Ordering::Acquire)
    }

    /// Get total fault count since boot.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }

    /// Clear the active flag. The counter is kept.
    #[inline]
    pub fn clear(&self) {
        self.active.store(false, Ordering::Release);
    }

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

/// Snapshot of fault state at a point in time.
#[derive(Clone, Copy, Debug)]
pub struct FaultSnapshot {
    pub active: bool,
    pub code: FaultCode,
    pub data: u32,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_state_basic() {
        let fault = FaultState::new();

        assert!(!fault.is_active());
        assert_eq!(fault.code(), FaultCode::None);
        assert_eq!(fault.count(), 0);

        fault.set(FaultCode::PinWrite, 17);

        assert!(fault.is_active());
        assert_eq!(fault.code(), FaultCode::PinWrite);
        assert_eq!(fault.data(), 17);
        assert_eq!(fault.count(), 1);

        fault.clear();

        assert!(!fault.is_active());
        assert_eq!(fault.count(), 1); // Count preserved
    }

    #[test]
    fn test_snapshot_matches_state() {
        let fault = FaultState::new();
        fault.set(FaultCode::PinWrite, 64);
        fault.clear();
        fault.set(FaultCode::PinWrite, 65);

        let snap = fault.snapshot();
        assert!(snap.active);
        assert_eq!(snap.code, FaultCode::PinWrite);
        assert_eq!(snap.data, 65);
        assert_eq!(snap.count, 2);
    }

    #[test]
    fn test_unknown_code_maps_to_none() {
        assert_eq!(FaultCode::from_u8(200), FaultCode::None);
    }
}
