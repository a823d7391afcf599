//! Message sources and chat clients for the command processor.
//!
//! - [`QueueSource`]: batches pushed through an in-process channel
//! - [`LineSource`]: one message per line of an async reader (stdin, files)
//! - [`ConsoleClient`]: replies printed to stdout
//! - [`MemoryClient`]: replies recorded for inspection

pub mod console;
pub mod line;
pub mod queue;

pub use console::{ConsoleClient, MemoryClient};
pub use line::LineSource;
pub use queue::QueueSource;
