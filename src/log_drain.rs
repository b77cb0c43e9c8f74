//! Log drain: moves RT-safe log entries to the ESP-IDF logger.
//!
//! # Flow
//!
//! ```text
//! RT_LOG_STREAM ─┐
//!                ├──▶ LogDrain::poll() ──▶ sink(level, line) ──▶ log::log!(target: "pic_writer")
//! BG_LOG_STREAM ─┘    main task              EspLogger → console UART
//! ```
//!
//! The drain is the only place that may block on log output.

use crate::logging::{BufWriter, LogEntry, LogLevel, LogStream};

/// How often dropped-message counts are reported.
pub const DROP_REPORT_INTERVAL_US: i64 = 10_000_000;

/// Formatted line buffer size.
const LINE_SIZE: usize = 160;

/// Format log entry as `[timestamp_us] LEVEL: message`.
///
/// Returns bytes written.
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    use core::fmt::Write;

    let mut writer = BufWriter::new(buf);
    let _ = write!(
        writer,
        "[{:10}] {}: {}",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.text()
    );
    writer.len()
}

/// Drains the RT and background streams in priority order.
pub struct LogDrain<'a> {
    rt: &'a LogStream,
    bg: &'a LogStream,
    last_drop_report_us: i64,
}

impl<'a> LogDrain<'a> {
    pub fn new(rt: &'a LogStream, bg: &'a LogStream) -> Self {
        Self {
            rt,
            bg,
            last_drop_report_us: 0,
        }
    }

    /// Forward every pending entry to `sink`.
    ///
    /// RT entries go first. Every `DROP_REPORT_INTERVAL_US` a warning is
    /// emitted if either stream dropped messages. Returns the number of
    /// entries forwarded.
    pub fn poll<F>(&mut self, now_us: i64, mut sink: F) -> usize
    where
        F: FnMut(log::Level, &str),
    {
        let mut line = [0u8; LINE_SIZE];
        let mut forwarded = 0;

        for stream in [self.rt, self.bg] {
            while let Some(entry) = stream.drain() {
                let len = format_log_entry(&entry, &mut line);
                sink(entry.level.to_log(), as_text(&line[..len]));
                forwarded += 1;
            }
        }

        if now_us - self.last_drop_report_us >= DROP_REPORT_INTERVAL_US {
            let rt_dropped = self.rt.dropped();
            let bg_dropped = self.bg.dropped();

            if rt_dropped > 0 || bg_dropped > 0 {
                let len = crate::logging::format_to_buffer(
                    &mut line,
                    format_args!("Dropped: RT={}, BG={}", rt_dropped, bg_dropped),
                );
                sink(LogLevel::Warn.to_log(), as_text(&line[..len]));

                self.rt.reset_dropped();
                self.bg.reset_dropped();
            }

            self.last_drop_report_us = now_us;
        }

        forwarded
    }
}

/// Truncation may split a UTF-8 sequence; keep the valid prefix.
fn as_text(bytes: &[u8]) -> &str {
    match core::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
    }
}
