//! Command UART.
//!
//! # Hardware Setup
//!
//! ```text
//! ESP32 GPIO4 (TX) ──────▶ host RX
//! ESP32 GPIO5 (RX) ◀────── host TX
//! ```

use esp_idf_svc::hal::delay::TickType;
use esp_idf_svc::hal::gpio::AnyIOPin;
use esp_idf_svc::hal::peripheral::Peripheral;
use esp_idf_svc::hal::uart::{self, Uart, UartDriver};
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::sys::EspError;

use crate::command::ByteLink;
use crate::config::CommandUartConfig;
use crate::error::InitError;

/// UART driver as a [`ByteLink`].
pub struct UartLink {
    driver: UartDriver<'static>,
}

/// Install the UART driver: 8N1, no flow control, RX ring only.
pub fn init_command_uart(
    uart: impl Peripheral<P = impl Uart> + 'static,
    config: &CommandUartConfig,
) -> Result<UartLink, InitError> {
    let uart_config = uart::config::Config::default()
        .baudrate(Hertz(config.baud_rate))
        .rx_fifo_size(config.rx_buffer_size)
        .tx_fifo_size(0);

    // SAFETY: TX/RX pin numbers come from CONFIG and are not claimed elsewhere.
    let (tx, rx) = unsafe { (AnyIOPin::new(config.tx_pin), AnyIOPin::new(config.rx_pin)) };

    let driver = UartDriver::new(
        uart,
        tx,
        rx,
        Option::<AnyIOPin>::None, // CTS
        Option::<AnyIOPin>::None, // RTS
        &uart_config,
    )
    .map_err(|_| InitError::UartSetup)?;

    Ok(UartLink { driver })
}

impl ByteLink for UartLink {
    type Error = EspError;

    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, EspError> {
        self.driver
            .read(buf, TickType::new_millis(timeout_ms as u64).ticks())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), EspError> {
        let mut rest = bytes;
        while !rest.is_empty() {
            let n = self.driver.write(rest)?;
            rest = &rest[n..];
        }
        Ok(())
    }
}
