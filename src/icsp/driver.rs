//! Timer-period handler binding the serializer to its pins.
//!
//! `IcspDriver::on_period` is the whole body of the periodic timer
//! callback. It owns the pins, reports through the RT log stream and
//! latches faults, so the device timer is only a thin closure around it.

use core::sync::atomic::{AtomicBool, Ordering};

use embedded_hal::digital::OutputPin;

use super::serializer::SerializerContext;
use crate::config::WORD_QUEUE_SIZE;
use crate::fault::{FaultCode, FaultState};
use crate::logging::LogStream;
use crate::{rt_error, rt_info};

/// Flags shared between the timer callback and the rest of the firmware.
pub struct IcspSignals {
    halt: AtomicBool,
    pub fault: FaultState,
}

impl IcspSignals {
    pub const fn new() -> Self {
        Self {
            halt: AtomicBool::new(false),
            fault: FaultState::new(),
        }
    }

    /// Ask the callback to park the pins on its next period.
    #[inline]
    pub fn request_halt(&self) {
        self.halt.store(true, Ordering::Release);
    }

    #[inline]
    pub fn halt_requested(&self) -> bool {
        self.halt.load(Ordering::Acquire)
    }
}

impl Default for IcspSignals {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializer plus the two pins it drives.
pub struct IcspDriver<'q, C, D, const N: usize = WORD_QUEUE_SIZE> {
    serializer: SerializerContext<'q, N>,
    clk: C,
    dat: D,
    halted: bool,
}

impl<'q, C, D, const N: usize> IcspDriver<'q, C, D, N>
where
    C: OutputPin,
    D: OutputPin,
{
    pub fn new(serializer: SerializerContext<'q, N>, clk: C, dat: D) -> Self {
        Self {
            serializer,
            clk,
            dat,
            halted: false,
        }
    }

    /// One timer period. Never blocks.
    ///
    /// After a halt request or a pin fault the pins are parked low and
    /// every later call returns immediately.
    pub fn on_period(&mut self, signals: &IcspSignals, log: &LogStream, now_us: i64) {
        if self.halted {
            return;
        }

        if signals.halt_requested() {
            let discarded = self.park();
            rt_info!(log, now_us, "ICSP halted, {} words discarded", discarded);
            return;
        }

        match self.serializer.tick(&mut self.clk, &mut self.dat) {
            Ok(tick) if tick.drained => {
                let stats = self.serializer.stats();
                rt_info!(
                    log,
                    now_us,
                    "word queue drained: {} words, {} bits",
                    stats.words_loaded,
                    stats.bits_emitted
                );
            }
            Ok(_) => {}
            Err(err) => {
                signals
                    .fault
                    .set(FaultCode::PinWrite, self.serializer.stats().bits_emitted);
                rt_error!(log, now_us, "ICSP fault: {}", err);
                self.park();
            }
        }
    }

    fn park(&mut self) -> u32 {
        self.halted = true;
        // Best effort: a failing pin cannot be parked either
        self.serializer
            .halt(&mut self.clk, &mut self.dat)
            .unwrap_or(0)
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    #[inline]
    pub fn serializer(&self) -> &SerializerContext<'q, N> {
        &self.serializer
    }

    /// Release the pins.
    pub fn into_pins(self) -> (C, D) {
        (self.clk, self.dat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icsp::WordQueue;
    use crate::logging::LogLevel;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    struct Level(bool);

    impl ErrorType for Level {
        type Error = Infallible;
    }

    impl OutputPin for Level {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.0 = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.0 = true;
            Ok(())
        }
    }

    /// Fails every write once armed.
    struct Flaky {
        fail: bool,
    }

    impl ErrorType for Flaky {
        type Error = ErrorKind;
    }

    impl OutputPin for Flaky {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.check()
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.check()
        }
    }

    impl Flaky {
        fn check(&self) -> Result<(), ErrorKind> {
            if self.fail {
                return Err(ErrorKind::Other);
            }
            Ok(())
        }
    }

    fn drain_messages(log: &LogStream) -> Vec<(LogLevel, String)> {
        let mut out = Vec::new();
        while let Some(entry) = log.drain() {
            out.push((entry.level, entry.text().to_string()));
        }
        out
    }

    #[test]
    fn test_logs_when_queue_drains() {
        let queue = WordQueue::<8>::new();
        queue.push_bits(0b10, 2).unwrap();
        let signals = IcspSignals::new();
        let log = LogStream::new();
        let mut driver =
            IcspDriver::new(SerializerContext::new(&queue), Level(false), Level(false));

        for t in 0..6 {
            driver.on_period(&signals, &log, t);
        }

        let msgs = drain_messages(&log);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].0, LogLevel::Info);
        assert_eq!(msgs[0].1, "word queue drained: 1 words, 2 bits");
    }

    #[test]
    fn test_halt_request_parks_pins() {
        let queue = WordQueue::<8>::new();
        queue.push_bits(0xFFFF, 16).unwrap();
        queue.push_bits(0xFFFF, 16).unwrap();
        let signals = IcspSignals::new();
        let log = LogStream::new();
        let mut driver =
            IcspDriver::new(SerializerContext::new(&queue), Level(false), Level(false));

        for t in 0..4 {
            driver.on_period(&signals, &log, t);
        }
        signals.request_halt();
        driver.on_period(&signals, &log, 4);
        assert!(driver.is_halted());

        // Further periods do nothing
        driver.on_period(&signals, &log, 5);
        let clock = driver.serializer().clock();
        assert!(!clock);

        let (clk, dat) = driver.into_pins();
        assert!(!clk.0);
        assert!(!dat.0);
        assert!(queue.is_empty());

        let msgs = drain_messages(&log);
        assert_eq!(
            msgs.last().map(|m| m.1.as_str()),
            Some("ICSP halted, 1 words discarded")
        );
    }

    #[test]
    fn test_pin_failure_latches_fault() {
        let queue = WordQueue::<8>::new();
        queue.push_bits(1, 1).unwrap();
        let signals = IcspSignals::new();
        let log = LogStream::new();
        let mut driver = IcspDriver::new(
            SerializerContext::new(&queue),
            Level(false),
            Flaky { fail: false },
        );

        driver.on_period(&signals, &log, 0); // load, data pin untouched
        assert!(!signals.fault.is_active());

        driver.dat.fail = true;
        driver.on_period(&signals, &log, 1);

        assert!(driver.is_halted());
        assert!(signals.fault.is_active());
        assert_eq!(signals.fault.code(), FaultCode::PinWrite);
        assert_eq!(signals.fault.data(), 0);

        let msgs = drain_messages(&log);
        assert_eq!(msgs[0].0, LogLevel::Error);
        assert_eq!(msgs[0].1, "ICSP fault: S03: pin write failed");
    }

    #[test]
    fn test_clock_failure_reports_only_driven_bits() {
        let queue = WordQueue::<8>::new();
        queue.push_bits(0b11, 2).unwrap();
        let signals = IcspSignals::new();
        let log = LogStream::new();
        let mut driver = IcspDriver::new(
            SerializerContext::new(&queue),
            Flaky { fail: false },
            Level(false),
        );

        driver.on_period(&signals, &log, 0); // load
        driver.on_period(&signals, &log, 1); // bit 0
        assert_eq!(driver.serializer().stats().bits_emitted, 1);

        driver.clk.fail = true;
        driver.on_period(&signals, &log, 2);

        assert!(driver.is_halted());
        assert!(signals.fault.is_active());
        assert_eq!(signals.fault.data(), 1);
        assert_eq!(driver.serializer().stats().bits_emitted, 1);
    }
}
