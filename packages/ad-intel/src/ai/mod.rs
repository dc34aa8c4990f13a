//! Hosted model implementations.

pub mod openai;

pub use openai::OpenAiLlm;
