//! API translation between Anthropic and `OpenAI` formats.
//!
//! Converts Anthropic message requests into chat completion requests and chat
//! completion responses back into Anthropic messages. All translation functions
//! are pure (no I/O).

pub mod anthropic_types;
pub mod openai_types;
pub mod request;
pub mod response;

pub use request::anthropic_to_openai;
pub use response::openai_to_anthropic;
