//! Fixed input buffer for the command loop

use crate::config::INPUT_BUFFER_SIZE;

/// Bytes a single poll may fill. The last slot holds the terminator.
pub const INPUT_CAPACITY: usize = INPUT_BUFFER_SIZE - 1;

/// Input buffer, overwritten by every poll
pub struct InputBuffer {
    buf: [u8; INPUT_BUFFER_SIZE],
    len: usize,
}

impl InputBuffer {
    /// Create empty buffer
    pub const fn new() -> Self {
        Self {
            buf: [0u8; INPUT_BUFFER_SIZE],
            len: 0,
        }
    }

    /// Writable region for the next poll (terminator slot excluded)
    pub fn read_slot(&mut self) -> &mut [u8] {
        &mut self.buf[..INPUT_CAPACITY]
    }

    /// Record how many bytes the last poll produced
    pub fn set_len(&mut self, len: usize) {
        self.len = len.min(INPUT_CAPACITY);
    }

    /// Clear buffer
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Get valid bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Null-terminate after the valid bytes and view them as text
    pub fn terminate(&mut self) -> &str {
        self.buf[self.len] = 0;
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("<invalid utf8>")
    }

    /// Valid bytes plus terminator, as left by `terminate`
    pub fn as_bytes_with_nul(&self) -> &[u8] {
        &self.buf[..=self.len]
    }

    /// Get valid byte count
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}
