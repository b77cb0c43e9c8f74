//! # PicWriter
//!
//! ICSP bit-bang writer for ESP32 with a UART command loop.
//!
//! ## Architecture
//!
//! Two components, no shared state except the word queue:
//! - [`icsp`]: esp_timer callback toggles ICSPCLK and shifts queued words
//!   out on ICSPDAT, LSB first
//! - [`command`]: FreeRTOS task polling the command UART and echoing input
//!
//! Everything outside [`hal`] and the timer binding is pure logic and is
//! tested on host.

#![cfg_attr(not(test), no_std)]

pub mod command;
pub mod config;
pub mod error;
pub mod fault;
pub mod icsp;
pub mod log_drain;
pub mod log_globals;
pub mod logging;

#[cfg(target_os = "espidf")]
pub mod hal;

pub use command::{ByteLink, CommandContext, CommandState, TransitionPolicy};
pub use config::CONFIG;
pub use error::{IcspError, InitError};
pub use fault::{FaultCode, FaultState};
pub use icsp::{IcspDriver, IcspSignals, IcspWord, SerializerContext, WordQueue};
pub use log_globals::{BG_LOG_STREAM, RT_LOG_STREAM};

/// Version string (set by build.rs, includes git hash)
pub const VERSION: &str = env!("VERSION_STRING");
