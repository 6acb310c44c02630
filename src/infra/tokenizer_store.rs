// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads an optional HuggingFace tokenizer.json for sub-word
// tokenisation of sentences before representation lookup.
//
// Without one, the encoder splits on whitespace. A tokenizer is
// only useful when the embedding file was built over the same
// sub-word vocabulary.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tokenizers::Tokenizer;

pub struct TokenizerStore {
    path: PathBuf,
}

impl TokenizerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the tokenizer from its JSON file
    pub fn load(&self) -> Result<Tokenizer> {
        if !self.path.exists() {
            bail!("Tokenizer file '{}' does not exist", self.path.display());
        }
        let tokenizer = Tokenizer::from_file(&self.path)
            .map_err(|e| anyhow::anyhow!(
                "Cannot load tokenizer from '{}': {}", self.path.display(), e
            ))?;
        tracing::info!("Loaded tokenizer from '{}'", self.path.display());
        Ok(tokenizer)
    }

    /// Load when a path was configured, `None` otherwise.
    pub fn load_optional(path: Option<&Path>) -> Result<Option<Tokenizer>> {
        path.map(|p| Self::new(p).load()).transpose()
    }
}
