pub mod conversation;
pub mod session;

pub use conversation::{ChatMessage, Conversation};
pub use session::Session;
