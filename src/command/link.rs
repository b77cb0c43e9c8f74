//! Byte link used by the command loop.

/// Byte source and sink (the command UART on device).
pub trait ByteLink {
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes, waiting at most `timeout_ms`.
    ///
    /// Returns the number of bytes read; zero on timeout.
    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error>;

    /// Write all of `bytes`.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;
}

impl<L: ByteLink + ?Sized> ByteLink for &mut L {
    type Error = L::Error;

    fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, Self::Error> {
        (**self).read(buf, timeout_ms)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write(bytes)
    }
}
