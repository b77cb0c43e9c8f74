//! Command loop context.
//!
//! Owns everything the command task touches: the UART link, the input
//! buffer and the current state. Each `step` runs the handler for the
//! current state, then moves on according to the [`TransitionPolicy`].

use core::sync::atomic::{AtomicBool, Ordering};

use super::buffer::InputBuffer;
use super::link::ByteLink;
use super::state::{CommandState, TransitionPolicy};
use crate::config::CONFIG;
use crate::logging::LogStream;
use crate::{rt_info, rt_warn};

/// Running counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommandStats {
    pub polls: u32,
    pub bytes_in: u32,
    pub bytes_out: u32,
    /// Reads that failed. Reported to the handler as zero bytes.
    pub read_errors: u32,
    pub write_errors: u32,
}

/// State owned by the command task.
pub struct CommandContext<'a, L: ByteLink> {
    link: L,
    buffer: InputBuffer,
    state: CommandState,
    policy: TransitionPolicy,
    read_timeout_ms: u32,
    log: &'a LogStream,
    stats: CommandStats,
}

impl<'a, L: ByteLink> CommandContext<'a, L> {
    /// Create a context in `AwaitInput` with the default policy and timeout.
    pub fn new(link: L, log: &'a LogStream) -> Self {
        Self {
            link,
            buffer: InputBuffer::new(),
            state: CommandState::AwaitInput,
            policy: TransitionPolicy::default(),
            read_timeout_ms: CONFIG.uart.read_timeout_ms,
            log,
            stats: CommandStats::default(),
        }
    }

    pub fn with_policy(mut self, policy: TransitionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_read_timeout(mut self, timeout_ms: u32) -> Self {
        self.read_timeout_ms = timeout_ms;
        self
    }

    /// Run the current state's handler and advance.
    ///
    /// Returns the state the next call will run.
    pub fn step(&mut self, now_us: i64) -> CommandState {
        match self.state {
            CommandState::AwaitInput => self.await_input(),
            CommandState::Validate => self.validate(),
            CommandState::Respond => self.respond(now_us),
        }

        self.state = self.policy.next(self.state);
        self.state
    }

    /// Step until `stop` is set. Each poll waits at most the read timeout,
    /// so a stop request is seen within one cycle.
    pub fn run<F>(&mut self, stop: &AtomicBool, mut now_us: F) -> CommandStats
    where
        F: FnMut() -> i64,
    {
        while !stop.load(Ordering::Acquire) {
            self.step(now_us());
        }
        self.stats
    }

    fn await_input(&mut self) {
        self.stats.polls = self.stats.polls.wrapping_add(1);

        let timeout_ms = self.read_timeout_ms;
        match self.link.read(self.buffer.read_slot(), timeout_ms) {
            Ok(n) => self.buffer.set_len(n),
            Err(_) => {
                self.stats.read_errors = self.stats.read_errors.wrapping_add(1);
                self.buffer.clear();
            }
        }

        self.stats.bytes_in = self.stats.bytes_in.wrapping_add(self.buffer.len() as u32);
    }

    fn validate(&mut self) {}

    fn respond(&mut self, now_us: i64) {
        if self.buffer.is_empty() {
            return;
        }

        match self.link.write(self.buffer.as_bytes()) {
            Ok(()) => {
                self.stats.bytes_out = self.stats.bytes_out.wrapping_add(self.buffer.len() as u32);
            }
            Err(err) => {
                self.stats.write_errors = self.stats.write_errors.wrapping_add(1);
                rt_warn!(self.log, now_us, "echo write failed: {:?}", err);
            }
        }

        let text = self.buffer.terminate();
        rt_info!(self.log, now_us, "Recv str: {}", text);
    }

    #[inline]
    pub fn state(&self) -> CommandState {
        self.state
    }

    #[inline]
    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    #[inline]
    pub fn buffer(&self) -> &InputBuffer {
        &self.buffer
    }

    #[inline]
    pub fn stats(&self) -> CommandStats {
        self.stats
    }

    #[inline]
    pub fn link(&self) -> &L {
        &self.link
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns one scripted chunk per read, then times out.
    #[derive(Default)]
    struct Script {
        chunks: Vec<Result<Vec<u8>, ()>>,
        written: Vec<u8>,
        timeouts: Vec<u32>,
    }

    impl ByteLink for Script {
        type Error = ();

        fn read(&mut self, buf: &mut [u8], timeout_ms: u32) -> Result<usize, ()> {
            self.timeouts.push(timeout_ms);
            if self.chunks.is_empty() {
                return Ok(0);
            }
            let chunk = self.chunks.remove(0)?;
            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            Ok(n)
        }

        fn write(&mut self, bytes: &[u8]) -> Result<(), ()> {
            self.written.extend_from_slice(bytes);
            Ok(())
        }
    }

    #[test]
    fn test_read_error_counts_as_zero() {
        let log = LogStream::new();
        let link = Script {
            chunks: vec![Err(())],
            ..Script::default()
        };
        let mut ctx = CommandContext::new(link, &log);

        ctx.step(0);
        assert!(ctx.buffer().is_empty());
        assert_eq!(ctx.stats().read_errors, 1);

        ctx.step(1);
        ctx.step(2);
        assert!(ctx.link().written.is_empty());
        assert!(!log.has_entries());
    }

    #[test]
    fn test_read_error_discards_previous_input() {
        let log = LogStream::new();
        let link = Script {
            chunks: vec![Ok(b"ab".to_vec()), Err(())],
            ..Script::default()
        };
        let mut ctx = CommandContext::new(link, &log);

        for t in 0..3 {
            ctx.step(t);
        }
        assert_eq!(ctx.link().written, b"ab");

        ctx.step(3);
        assert!(ctx.buffer().is_empty());
        ctx.step(4);
        ctx.step(5);
        assert_eq!(ctx.link().written, b"ab");
        assert_eq!(ctx.stats().bytes_out, 2);
    }

    #[test]
    fn test_poll_uses_configured_timeout() {
        let log = LogStream::new();
        let mut ctx = CommandContext::new(Script::default(), &log);
        ctx.step(0);
        assert_eq!(ctx.link().timeouts, vec![20]);

        let mut ctx = CommandContext::new(Script::default(), &log).with_read_timeout(5);
        ctx.step(0);
        assert_eq!(ctx.link().timeouts, vec![5]);
    }

    #[test]
    fn test_poll_never_exceeds_capacity() {
        let log = LogStream::new();
        let link = Script {
            chunks: vec![Ok(vec![b'z'; 40])],
            ..Script::default()
        };
        let mut ctx = CommandContext::new(link, &log);

        ctx.step(0);
        assert_eq!(ctx.buffer().len(), 15);
    }

    #[test]
    fn test_run_stops_on_flag() {
        let log = LogStream::new();
        let stop = AtomicBool::new(false);
        let link = Script {
            chunks: vec![Ok(b"ab".to_vec())],
            ..Script::default()
        };
        let mut ctx = CommandContext::new(link, &log);

        let mut calls = 0;
        let stats = ctx.run(&stop, || {
            calls += 1;
            if calls == 6 {
                stop.store(true, Ordering::Release);
            }
            calls
        });

        assert_eq!(stats.polls, 2);
        assert_eq!(stats.bytes_in, 2);
        assert_eq!(stats.bytes_out, 2);
        assert_eq!(ctx.link().written, b"ab");
    }
}
