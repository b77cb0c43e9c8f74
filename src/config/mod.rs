//! Module: config
//!
//! Purpose: Build-time configuration for PicWriter.
//!
//! Architecture:
//! - Every knob is a named constant fixed at build time
//! - No runtime reconfiguration, no persistence
//! - `CONFIG` is the single source of truth read by `main.rs`
//!
//! Safety: RT-safe. Plain `const` data, nothing to lock.

use core::ffi::CStr;

use crate::error::InitError;

/// Default ICSP clock rate (200 kHz → 5µs timer period).
pub const ICSP_RATE_HZ: u32 = 200_000;

/// UART input buffer size. One byte is reserved for the terminator.
pub const INPUT_BUFFER_SIZE: usize = 16;

/// UART driver RX ring. ESP-IDF rejects rings not larger than the 128-byte hardware FIFO.
pub const UART_RX_RING_SIZE: usize = 256;

/// Word queue capacity (must be power of 2).
pub const WORD_QUEUE_SIZE: usize = 64;

/// Diagnostic log tag.
pub const LOG_TAG: &str = "pic_writer";

/// ICSP pin assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IcspPinConfig {
    /// ICSPCLK output.
    pub clk_pin: i32,
    /// ICSPDAT output.
    pub dat_pin: i32,
    /// VPP switch control. Held low at boot.
    pub vpp_ctrl_pin: i32,
}

/// Command UART configuration (UART1, 8N1, no flow control).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandUartConfig {
    pub tx_pin: i32,
    pub rx_pin: i32,
    pub baud_rate: u32,
    /// Driver RX ring size in bytes.
    pub rx_buffer_size: usize,
    /// Per-poll read timeout.
    pub read_timeout_ms: u32,
}

/// Command task parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandTaskConfig {
    pub name: &'static CStr,
    pub stack_size: usize,
    pub priority: u8,
}

/// Complete firmware configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PicWriterConfig {
    pub icsp_pins: IcspPinConfig,
    pub icsp_rate_hz: u32,
    pub uart: CommandUartConfig,
    pub task: CommandTaskConfig,
}

impl PicWriterConfig {
    /// ICSP timer period for the configured rate.
    pub fn icsp_period_us(&self) -> Result<u64, InitError> {
        icsp_period_us(self.icsp_rate_hz)
    }
}

/// Firmware configuration.
pub const CONFIG: PicWriterConfig = PicWriterConfig {
    icsp_pins: IcspPinConfig {
        clk_pin: 8,
        dat_pin: 9,
        vpp_ctrl_pin: 10,
    },
    icsp_rate_hz: ICSP_RATE_HZ,
    uart: CommandUartConfig {
        tx_pin: 4,
        rx_pin: 5,
        baud_rate: 115_200,
        rx_buffer_size: UART_RX_RING_SIZE,
        read_timeout_ms: 20,
    },
    task: CommandTaskConfig {
        name: c"cmd_task",
        stack_size: 3072,
        priority: 10,
    },
};

/// Timer period in microseconds for a given ICSP rate.
///
/// `period = 1_000_000 / rate_hz`. Rates above 1 MHz round to a zero
/// period and are rejected along with zero.
pub const fn icsp_period_us(rate_hz: u32) -> Result<u64, InitError> {
    if rate_hz == 0 {
        return Err(InitError::InvalidRate);
    }
    let period = 1_000_000 / rate_hz as u64;
    if period == 0 {
        return Err(InitError::InvalidRate);
    }
    Ok(period)
}
