//! Hardware Abstraction Layer for PicWriter.
//!
//! Thin wrappers around ESP-IDF peripherals.
//! Business logic stays in `icsp` and `command`, HAL is just I/O.

pub mod gpio;
pub mod uart;

pub use gpio::{init_icsp_pins, IcspPins, OutPin};
pub use uart::{init_command_uart, UartLink};
