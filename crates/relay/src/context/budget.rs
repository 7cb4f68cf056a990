//! Output-token budgeting.
//!
//! ```text
//! input     = estimate(final_prompt)
//! available = context_window - input - safety_margin   (signed)
//! allowed   = min(requested, max(available, 0))
//! ```

use docrelay_core::error::Result;
use serde::Serialize;

use crate::models::ModelProfile;
use super::token::TokenEstimator;

/// The outcome of budgeting one prompt against one model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetPlan {
    pub input_tokens: usize,
    /// May be negative when the prompt alone overflows the window.
    pub available: i64,
    pub allowed_output_tokens: u32,
}

impl BudgetPlan {
    /// Whether the plan leaves no room for any output.
    pub fn is_exhausted(&self) -> bool {
        self.allowed_output_tokens == 0
    }
}

/// The planner arithmetic on an already-counted input.
pub fn plan_for_input(
    input_tokens: usize,
    context_window: usize,
    requested: u32,
    safety_margin: u32,
) -> BudgetPlan {
    let available = context_window as i64 - input_tokens as i64 - i64::from(safety_margin);
    let allowed = available.clamp(0, i64::from(requested));

    BudgetPlan {
        input_tokens,
        available,
        // In 0..=requested, so it fits.
        allowed_output_tokens: allowed as u32,
    }
}

/// Count `final_prompt` for `profile` and plan the output ceiling.
pub fn plan(
    final_prompt: &str,
    profile: &ModelProfile,
    requested: u32,
    safety_margin: u32,
    estimator: &TokenEstimator,
) -> Result<BudgetPlan> {
    let input_tokens = estimator.estimate(final_prompt, &profile.model_id)?;
    Ok(plan_for_input(
        input_tokens,
        profile.context_window_tokens,
        requested,
        safety_margin,
    ))
}
