//! Token estimation with the model family's BPE.
//!
//! Counts are exact for OpenAI models and an approximation for Claude and
//! custom models, which are counted with `cl100k_base`.
//!
//! BPE merging is quadratic in the length of a single pre-token, so runs of
//! whitespace or non-whitespace longer than [`MAX_RUN_BYTES`] are counted in
//! chunks. Ordinary prose never hits the cap and counts exactly.

use std::sync::{Arc, LazyLock};

use docrelay_core::error::{Error, Result};
use tiktoken_rs::CoreBPE;

use crate::models::{ModelCatalog, TokenizerFamily};

static CL100K: LazyLock<Option<CoreBPE>> = LazyLock::new(|| tiktoken_rs::cl100k_base().ok());
static O200K: LazyLock<Option<CoreBPE>> = LazyLock::new(|| tiktoken_rs::o200k_base().ok());

fn bpe(family: TokenizerFamily) -> Result<&'static CoreBPE> {
    let slot: &'static Option<CoreBPE> = match family {
        TokenizerFamily::Cl100kBase => &CL100K,
        TokenizerFamily::O200kBase => &O200K,
    };
    slot.as_ref()
        .ok_or_else(|| Error::config(format!("Failed to load the {family} tokenizer")))
}

/// Longest same-class run encoded in one piece.
pub const MAX_RUN_BYTES: usize = 128;

/// Split `text` wherever a whitespace or non-whitespace run would exceed
/// [`MAX_RUN_BYTES`]. Cuts fall on char boundaries.
fn split_long_runs(text: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut run_start = 0;
    let mut run_is_space = None;

    for (i, c) in text.char_indices() {
        let is_space = c.is_whitespace();
        if run_is_space != Some(is_space) {
            run_is_space = Some(is_space);
            run_start = i;
        } else if i + c.len_utf8() - run_start > MAX_RUN_BYTES {
            pieces.push(&text[start..i]);
            start = i;
            run_start = i;
        }
    }
    pieces.push(&text[start..]);
    pieces
}

/// Count tokens in `text` with the given vocabulary.
pub fn count_tokens(text: &str, family: TokenizerFamily) -> Result<usize> {
    if text.is_empty() {
        return Ok(0);
    }
    let bpe = bpe(family)?;
    Ok(split_long_runs(text)
        .into_iter()
        .map(|piece| bpe.encode_with_special_tokens(piece).len())
        .sum())
}

/// Counts tokens for a model id by looking up its tokenizer in the catalog.
#[derive(Debug, Clone)]
pub struct TokenEstimator {
    catalog: Arc<ModelCatalog>,
}

impl TokenEstimator {
    pub fn new(catalog: Arc<ModelCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// Token count of `text` for `model_id`. Unknown models are an error.
    pub fn estimate(&self, text: &str, model_id: &str) -> Result<usize> {
        let profile = self.catalog.get(model_id)?;
        count_tokens(text, profile.tokenizer)
    }
}
