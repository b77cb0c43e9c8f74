//! UART command loop
//!
//! Cooperative state machine on its own FreeRTOS task.
//! Zero heap allocation - one fixed input buffer.

pub mod buffer;
pub mod context;
pub mod link;
pub mod state;

pub use buffer::{InputBuffer, INPUT_CAPACITY};
pub use context::{CommandContext, CommandStats};
pub use link::ByteLink;
pub use state::{CommandState, TransitionPolicy};
