// ============================================================
// Layer 3 — Domain Errors
// ============================================================
// Failures that callers may want to match on. Everything else
// travels as anyhow::Error with file/context attached.
//
// Not every failure is an error here:
//   - a chunk longer than the trained sequence length is
//     recovered by labelling the excess sentences "none"
//   - a token missing from the vocabulary uses the unknown vector
//   - a sentence the parser cannot handle gets tense "UNK"

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HighlightError {
    /// Segmentation produced no sentences; there is nothing to highlight.
    #[error("no sentences found in the input text")]
    EmptyInput,

    /// The configured model variant has not been trained / exported.
    #[error("no trained tagger for configuration `{key}`: missing {}", path.display())]
    ModelArtifactMissing { key: String, path: PathBuf },

    #[error("invalid label index: {0}")]
    InvalidLabelIndex(String),

    #[error("invalid embedding table: {0}")]
    InvalidEmbeddings(String),

    /// Tensor or score shapes disagree with the loaded topology.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
}
