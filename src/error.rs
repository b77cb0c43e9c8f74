//! Error types for PicWriter.
//!
//! Init errors are reported once to the caller and never retried.
//! Read timeouts are not errors: they yield a zero byte count.

/// Startup failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    /// I01: ICSP rate is zero or yields a zero period
    InvalidRate,
    /// I02: Periodic timer could not be created
    TimerCreate,
    /// I03: Periodic timer could not be started
    TimerStart,
    /// I04: UART driver install or pin setup failed
    UartSetup,
    /// I05: GPIO could not be configured as output
    PinSetup,
    /// I06: Task or buffer allocation failed
    OutOfMemory,
}

impl InitError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRate => "I01",
            Self::TimerCreate => "I02",
            Self::TimerStart => "I03",
            Self::UartSetup => "I04",
            Self::PinSetup => "I05",
            Self::OutOfMemory => "I06",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidRate => "invalid ICSP rate",
            Self::TimerCreate => "timer create failed",
            Self::TimerStart => "timer start failed",
            Self::UartSetup => "UART setup failed",
            Self::PinSetup => "GPIO setup failed",
            Self::OutOfMemory => "out of memory",
        }
    }
}

impl core::fmt::Display for InitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// ICSP serializer error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcspError {
    /// S01: Word length exceeds 32 bits
    InvalidLength,
    /// S02: Word queue is full
    QueueFull,
    /// S03: Clock or data pin write failed
    Pin,
}

impl IcspError {
    /// Get error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidLength => "S01",
            Self::QueueFull => "S02",
            Self::Pin => "S03",
        }
    }

    /// Get error message
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidLength => "word length > 32",
            Self::QueueFull => "word queue full",
            Self::Pin => "pin write failed",
        }
    }
}

impl core::fmt::Display for IcspError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_code() {
        use crate::logging::format_to_buffer;

        let mut buf = [0u8; 64];
        let len = format_to_buffer(&mut buf, format_args!("{}", InitError::TimerStart));
        assert_eq!(&buf[..len], b"I03: timer start failed");

        let len = format_to_buffer(&mut buf, format_args!("{}", IcspError::QueueFull));
        assert_eq!(&buf[..len], b"S02: word queue full");
    }
}
