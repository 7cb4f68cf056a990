//! LLM provider implementations for DocRelay.
//!
//! All providers implement the `docrelay_core::Provider` trait. The registry
//! maps a validated selector to its provider and operator credential.

pub mod completion;
pub mod http;
pub mod normalize;
pub mod openai_compat;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_support;

pub use completion::CompletionProvider;
pub use normalize::extract_answer;
pub use openai_compat::OpenAiCompatProvider;
pub use registry::{ProviderRegistry, RegisteredProvider, build_from_config};
