// Typeswitch State
// Rolling buffer of typed events owned by the switcher

mod buffer;

pub use buffer::{EventBuffer, DEFAULT_BUFFER_CAPACITY};
