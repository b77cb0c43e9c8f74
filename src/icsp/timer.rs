//! esp_timer binding for the ICSP driver.
//!
//! Creates a periodic `esp_timer` whose callback runs
//! [`IcspDriver::on_period`]. Creation and start failures are reported
//! once as [`InitError`] and never retried.

use core::time::Duration;

use embedded_hal::digital::OutputPin;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::sys::EspError;
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

use super::driver::{IcspDriver, IcspSignals};
use crate::error::InitError;
use crate::logging::LogStream;

/// Running ICSP clock.
pub struct IcspTimer {
    _service: EspTaskTimerService,
    timer: EspTimer<'static>,
    signals: &'static IcspSignals,
    period_us: u64,
}

impl IcspTimer {
    /// Create the timer and start it with the given period.
    pub fn start<C, D>(
        mut driver: IcspDriver<'static, C, D>,
        signals: &'static IcspSignals,
        log: &'static LogStream,
        period_us: u64,
    ) -> Result<Self, InitError>
    where
        C: OutputPin + Send + 'static,
        D: OutputPin + Send + 'static,
    {
        let service = EspTaskTimerService::new().map_err(|_| InitError::TimerCreate)?;

        let timer = service
            .timer(move || {
                // SAFETY: esp_timer_get_time is always safe to call
                let now_us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
                driver.on_period(signals, log, now_us);
            })
            .map_err(|_| InitError::TimerCreate)?;

        timer
            .every(Duration::from_micros(period_us))
            .map_err(|_| InitError::TimerStart)?;

        Ok(Self {
            _service: service,
            timer,
            signals,
            period_us,
        })
    }

    #[inline]
    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    /// Stop hook: park the pins through the callback, then cancel the timer.
    pub fn stop(self) -> Result<(), EspError> {
        self.signals.request_halt();

        // Give the callback a few periods to see the request
        FreeRtos::delay_ms(1 + (self.period_us / 1000) as u32 * 4);

        self.timer.cancel()?;
        Ok(())
    }
}
