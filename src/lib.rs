pub mod core;
pub mod index;
pub mod llm;
pub mod pipeline;
pub mod web;
