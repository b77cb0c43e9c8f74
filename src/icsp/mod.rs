//! ICSP bit-bang serializer.
//!
//! Word queue in, clock and data edges out. Everything except the
//! `esp_timer` binding is pure logic and runs on host.

pub mod driver;
pub mod queue;
pub mod serializer;
pub mod word;

#[cfg(target_os = "espidf")]
pub mod timer;

pub use driver::{IcspDriver, IcspSignals};
pub use queue::WordQueue;
pub use serializer::{EdgeOrder, SerializerContext, SerializerState, SerializerStats, Tick};
pub use word::{IcspWord, MAX_WORD_BITS};

#[cfg(target_os = "espidf")]
pub use timer::IcspTimer;
