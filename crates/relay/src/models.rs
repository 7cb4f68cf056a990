//! Model profiles: context window and tokenizer per model id.
//!
//! The catalog is built once at startup from the built-in table plus any
//! `[[models]]` entries in configuration, then shared read-only.

use std::collections::HashMap;
use std::str::FromStr;

use docrelay_config::ModelConfig;
use docrelay_core::error::{Error, Result};
use serde::Serialize;

/// BPE vocabulary used to count a model's tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenizerFamily {
    Cl100kBase,
    O200kBase,
}

impl TokenizerFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cl100kBase => "cl100k_base",
            Self::O200kBase => "o200k_base",
        }
    }
}

impl FromStr for TokenizerFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cl100k_base" => Ok(Self::Cl100kBase),
            "o200k_base" => Ok(Self::O200kBase),
            other => Err(Error::config(format!("Unknown tokenizer '{other}'"))),
        }
    }
}

impl std::fmt::Display for TokenizerFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelProfile {
    pub model_id: String,
    pub context_window_tokens: usize,
    pub tokenizer: TokenizerFamily,
}

impl ModelProfile {
    pub fn new(
        model_id: impl Into<String>,
        context_window_tokens: usize,
        tokenizer: TokenizerFamily,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            context_window_tokens,
            tokenizer,
        }
    }
}

/// Built-in profiles. Claude and custom models have no public BPE, so they
/// are counted with `cl100k_base` as an approximation.
const BUILTIN: &[(&str, usize, TokenizerFamily)] = &[
    ("gpt-3.5-turbo", 16_385, TokenizerFamily::Cl100kBase),
    ("gpt-4", 8_192, TokenizerFamily::Cl100kBase),
    ("gpt-4-turbo", 128_000, TokenizerFamily::Cl100kBase),
    ("gpt-4o", 128_000, TokenizerFamily::O200kBase),
    ("gpt-4o-mini", 128_000, TokenizerFamily::O200kBase),
    ("claude-2.1", 200_000, TokenizerFamily::Cl100kBase),
    ("claude-2.0", 100_000, TokenizerFamily::Cl100kBase),
    ("claude-instant-1.2", 100_000, TokenizerFamily::Cl100kBase),
    ("custom-model", 4_096, TokenizerFamily::Cl100kBase),
];

/// Lookup table from model id to [`ModelProfile`].
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    profiles: HashMap<String, ModelProfile>,
}

impl ModelCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table only.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (id, window, tokenizer) in BUILTIN {
            catalog.insert(ModelProfile::new(*id, *window, *tokenizer));
        }
        catalog
    }

    /// Built-in table plus configured profiles. A configured profile with
    /// the same id replaces the built-in one.
    pub fn from_config(models: &[ModelConfig]) -> Result<Self> {
        let mut catalog = Self::builtin();
        for model in models {
            if model.context_window == 0 {
                return Err(Error::config(format!(
                    "Model '{}' has a zero context window",
                    model.id
                )));
            }
            let tokenizer = model.tokenizer.parse()?;
            catalog.insert(ModelProfile::new(&model.id, model.context_window, tokenizer));
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, profile: ModelProfile) {
        self.profiles.insert(profile.model_id.clone(), profile);
    }

    /// Look up a profile. Unknown ids are a configuration error.
    pub fn get(&self, model_id: &str) -> Result<&ModelProfile> {
        self.profiles
            .get(model_id)
            .ok_or_else(|| {
                Error::config(format!("Unknown model '{model_id}': no profile configured"))
            })
    }

    /// All profiles sorted by id.
    pub fn list(&self) -> Vec<&ModelProfile> {
        let mut profiles: Vec<_> = self.profiles.values().collect();
        profiles.sort_by(|a, b| a.model_id.cmp(&b.model_id));
        profiles
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
