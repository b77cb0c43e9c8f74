//! Global log stream instances.
//!
//! One stream per producer context, one drain in the main task.

use crate::logging::LogStream;

/// RT log stream, written only by the ICSP timer callback.
pub static RT_LOG_STREAM: LogStream = LogStream::new();

/// Background log stream, written only by the command task.
pub static BG_LOG_STREAM: LogStream = LogStream::new();
