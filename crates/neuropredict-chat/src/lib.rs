//! Chat layer: prompt construction and the outbound text-generation client.

pub mod prompt;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::{ChatClient, ChatConfig, ChatError};
pub use prompt::build_prompt;
