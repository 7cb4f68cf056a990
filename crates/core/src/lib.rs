//! # DocRelay Core
//!
//! Domain types, traits and errors for the DocRelay prompt relay.
//! This crate has **no framework dependencies**. It defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod document;
pub mod error;
pub mod provider;
pub mod request;

// Re-export key types at crate root for ergonomics
pub use document::{Document, DocumentResolver, DocumentStore, DocumentSummary, NewDocument};
pub use error::{DocumentError, Error, ErrorKind, ProviderError, Result};
pub use provider::{Provider, ProviderKind};
pub use request::{CredentialSource, NormalizedRequest, PromptRequest};
