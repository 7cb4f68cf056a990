//! The DocRelay pipeline.
//!
//! Takes a prompt request naming stored documents and one provider, and
//! turns it into exactly one provider call:
//!
//! 1. **Normalize** the request and pick the credential
//! 2. **Resolve** documents in caller order
//! 3. **Assemble** the final prompt with a fixed template
//! 4. **Budget** output tokens against the model's context window
//! 5. **Dispatch** and return the normalized answer

pub mod context;
pub mod models;
pub mod pipeline;

pub use context::{BudgetPlan, TokenEstimator, assemble, plan, plan_for_input};
pub use models::{ModelCatalog, ModelProfile, TokenizerFamily};
pub use pipeline::{DispatchResult, RelayPipeline};
