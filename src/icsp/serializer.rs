//! ICSP bit serializer.
//!
//! Pure logic over two `OutputPin`s. Called once per timer period, it
//! toggles ICSPCLK and shifts one bit of the current word onto ICSPDAT,
//! LSB first. When the word runs out the next tick loads the following
//! word from the queue instead of emitting.
//!
//! # Timing
//!
//! ```text
//! tick:      1    2    3    4    5    6    7
//! CLK:      _/‾‾‾‾\____/‾‾‾‾\____/‾‾‾‾\____/‾‾‾‾
//! action:  load  b0   b1   b2   b3  idle idle
//! ```
//!
//! # Rules
//!
//! - O(1) per tick: no loops, no allocation, no blocking
//! - Clock toggles on every tick, independent of data
//! - Data pin is only written when a bit is emitted

use embedded_hal::digital::{OutputPin, PinState};

use super::queue::WordQueue;
use super::word::IcspWord;
use crate::config::WORD_QUEUE_SIZE;
use crate::error::IcspError;

/// Order of the two pin writes within a tick.
///
/// The emitted bit and the clock level are the same either way; only
/// which pin changes first differs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EdgeOrder {
    /// Drive the clock edge, then the data bit.
    #[default]
    ClockFirst,
    /// Set up the data bit, then drive the clock edge.
    DataFirst,
}

/// Serializer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerializerState {
    /// Bits left in the current word, or words waiting in the queue.
    ActiveWord,
    /// Current word exhausted and queue empty.
    Idle,
}

/// What a single tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    /// Clock level after this tick.
    pub clock: bool,
    /// Bit driven on the data pin, if any.
    pub data: Option<bool>,
    /// A new word was taken from the queue.
    pub loaded: bool,
    /// First idle tick after activity (queue ran dry).
    pub drained: bool,
}

/// Running counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SerializerStats {
    pub words_loaded: u32,
    pub bits_emitted: u32,
    pub idle_ticks: u32,
}

/// Serializer state owned by the timer callback.
pub struct SerializerContext<'q, const N: usize = WORD_QUEUE_SIZE> {
    queue: &'q WordQueue<N>,
    clock: bool,
    current: IcspWord,
    order: EdgeOrder,
    was_idle: bool,
    stats: SerializerStats,
}

impl<'q, const N: usize> SerializerContext<'q, N> {
    /// Create a serializer reading from `queue`. Clock starts low, no word loaded.
    pub fn new(queue: &'q WordQueue<N>) -> Self {
        Self::with_order(queue, EdgeOrder::default())
    }

    pub fn with_order(queue: &'q WordQueue<N>, order: EdgeOrder) -> Self {
        Self {
            queue,
            clock: false,
            current: IcspWord::EMPTY,
            order,
            was_idle: true,
            stats: SerializerStats::default(),
        }
    }

    /// Advance one timer period.
    #[inline]
    pub fn tick<C, D>(&mut self, clk: &mut C, dat: &mut D) -> Result<Tick, IcspError>
    where
        C: OutputPin,
        D: OutputPin,
    {
        self.clock = !self.clock;

        let data = self.current.peek_bit();
        let mut loaded = false;
        let mut drained = false;

        if data.is_some() {
            self.was_idle = false;
        } else if let Some(word) = self.queue.pop() {
            self.current = word;
            loaded = true;
            self.stats.words_loaded = self.stats.words_loaded.wrapping_add(1);
            self.was_idle = false;
        } else {
            self.stats.idle_ticks = self.stats.idle_ticks.wrapping_add(1);
            drained = !self.was_idle;
            self.was_idle = true;
        }

        match self.order {
            EdgeOrder::ClockFirst => {
                drive(clk, self.clock)?;
                if let Some(bit) = data {
                    drive(dat, bit)?;
                }
            }
            EdgeOrder::DataFirst => {
                if let Some(bit) = data {
                    drive(dat, bit)?;
                }
                drive(clk, self.clock)?;
            }
        }

        // A bit only counts once both writes went through
        if data.is_some() {
            self.current.next_bit();
            self.stats.bits_emitted = self.stats.bits_emitted.wrapping_add(1);
        }

        Ok(Tick {
            clock: self.clock,
            data,
            loaded,
            drained,
        })
    }

    /// Stop hook: drop the current word, discard queued words and park both pins low.
    ///
    /// Returns the number of queued words discarded. Call only once the
    /// timer is stopped so this is the sole consumer.
    pub fn halt<C, D>(&mut self, clk: &mut C, dat: &mut D) -> Result<u32, IcspError>
    where
        C: OutputPin,
        D: OutputPin,
    {
        self.current = IcspWord::EMPTY;
        self.clock = false;
        self.was_idle = true;

        let mut discarded = 0;
        while self.queue.pop().is_some() {
            discarded += 1;
        }

        drive(clk, false)?;
        drive(dat, false)?;
        Ok(discarded)
    }

    pub fn state(&self) -> SerializerState {
        if !self.current.is_exhausted() || !self.queue.is_empty() {
            SerializerState::ActiveWord
        } else {
            SerializerState::Idle
        }
    }

    #[inline]
    pub fn clock(&self) -> bool {
        self.clock
    }

    #[inline]
    pub fn current(&self) -> &IcspWord {
        &self.current
    }

    #[inline]
    pub fn order(&self) -> EdgeOrder {
        self.order
    }

    #[inline]
    pub fn stats(&self) -> SerializerStats {
        self.stats
    }
}

#[inline]
fn drive<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), IcspError> {
    pin.set_state(PinState::from(high)).map_err(|_| IcspError::Pin)
}
