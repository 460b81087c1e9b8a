//! Chat backends
//!
//! The seam between the trial executor and whatever serves the model tiers.

mod mock;
mod ollama;
mod traits;

pub use mock::{MockBackend, MockConfig, RecordedCall};
pub use ollama::{OllamaBackend, OllamaConfig};
pub use traits::{
    validate_endpoint, ChatBackend, ChatMessage, ChatReply, ChatRequest, ChatRole,
};
