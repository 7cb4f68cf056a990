//! Prompt context: assembly, token counting and output budgeting.

pub mod assembler;
pub mod budget;
pub mod token;

pub use assembler::{MARKDOWN_DIRECTIVE, SEPARATOR, assemble};
pub use budget::{BudgetPlan, plan, plan_for_input};
pub use token::{TokenEstimator, count_tokens};
