//! GPIO setup for the ICSP lines.

use esp_idf_svc::hal::gpio::{AnyOutputPin, Output, PinDriver};

use crate::config::IcspPinConfig;
use crate::error::InitError;

/// Push-pull output owned for the program lifetime.
pub type OutPin = PinDriver<'static, AnyOutputPin, Output>;

/// ICSP outputs, all driven low after init.
pub struct IcspPins {
    pub clk: OutPin,
    pub dat: OutPin,
    /// Dropping this releases VPP control; keep it alive.
    pub vpp: OutPin,
}

/// Claim and configure the ICSP pins.
pub fn init_icsp_pins(config: &IcspPinConfig) -> Result<IcspPins, InitError> {
    Ok(IcspPins {
        clk: output_low(config.clk_pin)?,
        dat: output_low(config.dat_pin)?,
        vpp: output_low(config.vpp_ctrl_pin)?,
    })
}

fn output_low(pin: i32) -> Result<OutPin, InitError> {
    // SAFETY: each configured pin number is claimed exactly once, at boot,
    // and is not handed out through `Peripherals`.
    let pin = unsafe { AnyOutputPin::new(pin) };
    let mut driver = PinDriver::output(pin).map_err(|_| InitError::PinSetup)?;
    driver.set_low().map_err(|_| InitError::PinSetup)?;
    Ok(driver)
}
