pub mod message;
pub mod traits;

pub use message::{GroupUpdate, Message, MESSAGE_NEW};
pub use traits::{ChatClient, UpdateSource};
