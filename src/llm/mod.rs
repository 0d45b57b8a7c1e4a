pub mod gateway;
pub mod gemini;
pub mod ollama;
pub mod provider;

pub use gateway::{Embedder, ModelGateway, TextGenerator};
pub use provider::LlmProvider;
