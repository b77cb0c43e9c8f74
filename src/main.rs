//! PicWriter - Main entry point
//!
//! 1. Park the ICSP pins low and start the ICSP timer
//! 2. Spawn the command task
//! 3. Supervise: drain logs, stop the timer on a serializer fault
//!
//! Host builds get an empty `main`; everything testable lives in the library.

#![cfg_attr(target_os = "espidf", no_std)]
#![cfg_attr(target_os = "espidf", no_main)]

#[cfg(not(target_os = "espidf"))]
fn main() {}

#[cfg(target_os = "espidf")]
mod firmware {
    use esp_idf_svc::sys as esp_idf_sys;

    use core::cell::UnsafeCell;
    use core::ffi::c_void;
    use core::sync::atomic::AtomicBool;

    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::task;
    use esp_idf_svc::log::EspLogger;

    use pic_writer::{
        config::{CONFIG, LOG_TAG},
        hal::{init_command_uart, init_icsp_pins, IcspPins, UartLink},
        icsp::{IcspDriver, IcspSignals, IcspTimer, SerializerContext, WordQueue},
        log_drain::LogDrain,
        CommandContext, InitError, BG_LOG_STREAM, RT_LOG_STREAM, VERSION,
    };

    // Wrapper to make UnsafeCell Sync for the command link hand-off.
    // SAFETY: main writes it once before the command task exists,
    // the command task takes it once at start.
    #[repr(transparent)]
    struct SyncCell<T>(UnsafeCell<T>);
    unsafe impl<T> Sync for SyncCell<T> {}

    impl<T> SyncCell<T> {
        const fn new(value: T) -> Self {
            Self(UnsafeCell::new(value))
        }

        fn get(&self) -> *mut T {
            self.0.get()
        }
    }

    // Static allocations
    static WORD_QUEUE: WordQueue = WordQueue::new();
    static ICSP_SIGNALS: IcspSignals = IcspSignals::new();
    static COMMAND_STOP: AtomicBool = AtomicBool::new(false);
    static COMMAND_LINK: SyncCell<Option<UartLink>> = SyncCell::new(None);

    /// Supervisor poll interval.
    const SUPERVISE_INTERVAL_MS: u32 = 10;

    #[no_mangle]
    fn main() {
        // Initialize ESP-IDF
        esp_idf_sys::link_patches();
        EspLogger::initialize_default();

        log::info!(target: LOG_TAG, "{}", VERSION);

        let peripherals = match Peripherals::take() {
            Ok(p) => p,
            Err(e) => {
                log::error!(target: LOG_TAG, "peripherals unavailable: {}", e);
                return;
            }
        };

        // Serializer failure leaves the command loop running without ICSP output
        let (timer, _vpp) = match start_icsp() {
            Ok((timer, vpp)) => (Some(timer), Some(vpp)),
            Err(e) => {
                log::error!(target: LOG_TAG, "ICSP disabled: {}", e);
                (None, None)
            }
        };

        match init_command_uart(peripherals.uart1, &CONFIG.uart) {
            Ok(link) => {
                if let Err(e) = spawn_command_task(link) {
                    log::error!(target: LOG_TAG, "command task not started: {}", e);
                }
            }
            Err(e) => log::error!(target: LOG_TAG, "command UART: {}", e),
        }

        supervise(timer);
    }

    /// Configure pins and start the ICSP timer. Returns the VPP pin, which must stay alive.
    fn start_icsp() -> Result<(IcspTimer, pic_writer::hal::OutPin), InitError> {
        let period_us = CONFIG.icsp_period_us()?;
        let IcspPins { clk, dat, vpp } = init_icsp_pins(&CONFIG.icsp_pins)?;

        let driver = IcspDriver::new(SerializerContext::new(&WORD_QUEUE), clk, dat);
        let timer = IcspTimer::start(driver, &ICSP_SIGNALS, &RT_LOG_STREAM, period_us)?;

        log::info!(
            target: LOG_TAG,
            "ICSP clock on GPIO{}/GPIO{}, period {}us",
            CONFIG.icsp_pins.clk_pin,
            CONFIG.icsp_pins.dat_pin,
            period_us
        );
        Ok((timer, vpp))
    }

    fn spawn_command_task(link: UartLink) -> Result<(), InitError> {
        // SAFETY: command task does not exist yet, no concurrent access
        unsafe {
            *COMMAND_LINK.get() = Some(link);
        }

        // SAFETY: entry point never returns, it deletes its own task
        let created = unsafe {
            task::create(
                command_task,
                CONFIG.task.name,
                CONFIG.task.stack_size,
                core::ptr::null_mut(),
                CONFIG.task.priority,
                None,
            )
        };

        created.map(|_| ()).map_err(|_| InitError::OutOfMemory)
    }

    /// Command task entry point.
    extern "C" fn command_task(_arg: *mut c_void) {
        // SAFETY: written once by main before this task was created
        let link = unsafe { (*COMMAND_LINK.get()).take() };

        if let Some(link) = link {
            let mut ctx = CommandContext::new(link, &BG_LOG_STREAM);
            let stats = ctx.run(&COMMAND_STOP, timestamp_us);
            pic_writer::rt_info!(
                BG_LOG_STREAM,
                timestamp_us(),
                "command loop stopped after {} polls",
                stats.polls
            );
        }

        // SAFETY: a FreeRTOS task must delete itself instead of returning
        unsafe {
            esp_idf_sys::vTaskDelete(core::ptr::null_mut());
        }
    }

    /// Main task loop: forward logs, react to serializer faults.
    fn supervise(mut timer: Option<IcspTimer>) -> ! {
        let mut drain = LogDrain::new(&RT_LOG_STREAM, &BG_LOG_STREAM);

        loop {
            drain.poll(timestamp_us(), |level, line| {
                log::log!(target: LOG_TAG, level, "{}", line);
            });

            if ICSP_SIGNALS.fault.is_active() {
                let fault = ICSP_SIGNALS.fault.snapshot();
                log::error!(
                    target: LOG_TAG,
                    "ICSP fault {:?} after {} bits (#{}), stopping clock",
                    fault.code,
                    fault.data,
                    fault.count
                );
                if let Some(t) = timer.take() {
                    if let Err(e) = t.stop() {
                        log::error!(target: LOG_TAG, "timer stop failed: {}", e);
                    }
                }
                // Acknowledged: report once
                ICSP_SIGNALS.fault.clear();
            }

            FreeRtos::delay_ms(SUPERVISE_INTERVAL_MS);
        }
    }

    fn timestamp_us() -> i64 {
        // SAFETY: esp_timer_get_time is always safe to call
        unsafe { esp_idf_sys::esp_timer_get_time() }
    }
}
