// ============================================================
// Layer 6 — Embedding Table
// ============================================================
// Loads pre-trained word vectors from a plain-text file in the
// GloVe / word2vec text layout:
//
//   [optional header]  400000 300
//   token v1 v2 ... vD
//   token v1 v2 ... vD
//
// The dimension is taken from the first vector line. Lines with a
// different width or an unparseable number are skipped with a
// warning. The vector for unknown tokens is the file's own
// "[UNK]" / "<unk>" entry when present, zeros otherwise.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::error::HighlightError;
use crate::domain::traits::RepresentationSource;

const UNKNOWN_KEYS: &[&str] = &["[UNK]", "<unk>", "UNK"];

#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    dim:     usize,
    vectors: HashMap<String, Vec<f32>>,
    unknown: Vec<f32>,
}

impl EmbeddingTable {
    /// Build a table from in-memory entries.
    pub fn from_entries(
        dim:     usize,
        entries: impl IntoIterator<Item = (String, Vec<f32>)>,
        unknown: Vec<f32>,
    ) -> Result<Self, HighlightError> {
        if dim == 0 {
            return Err(HighlightError::InvalidEmbeddings("dimension must be positive".into()));
        }
        if unknown.len() != dim {
            return Err(HighlightError::InvalidEmbeddings(format!(
                "unknown vector has {} values, expected {dim}",
                unknown.len()
            )));
        }
        let mut vectors = HashMap::new();
        for (token, v) in entries {
            if v.len() != dim {
                return Err(HighlightError::InvalidEmbeddings(format!(
                    "vector for '{token}' has {} values, expected {dim}",
                    v.len()
                )));
            }
            vectors.insert(token, v);
        }
        Ok(Self { dim, vectors, unknown })
    }

    /// Load vectors from a text file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read embeddings from '{}'", path.display()))?;
        let table = Self::parse(&text)
            .with_context(|| format!("Invalid embeddings file '{}'", path.display()))?;
        tracing::info!(
            "Loaded {} word vectors (dim={}) from '{}'",
            table.len(),
            table.dim,
            path.display()
        );
        Ok(table)
    }

    /// Parse the text layout described at the top of this file.
    pub fn parse(text: &str) -> Result<Self, HighlightError> {
        let mut dim: Option<usize> = None;
        let mut vectors            = HashMap::new();
        let mut skipped            = 0usize;

        for (line_no, line) in text.lines().enumerate() {
            let mut fields = line.split_whitespace();
            let Some(token) = fields.next() else { continue };
            let values: Vec<&str> = fields.collect();

            // word2vec header: "<count> <dim>"
            if line_no == 0 && values.len() == 1 && token.parse::<usize>().is_ok() && values[0].parse::<usize>().is_ok() {
                continue;
            }

            let parsed: Result<Vec<f32>, _> = values.iter().map(|v| v.parse::<f32>()).collect();
            let vector = match parsed {
                Ok(v) if !v.is_empty() => v,
                _ => {
                    skipped += 1;
                    continue;
                }
            };

            match dim {
                None                          => dim = Some(vector.len()),
                Some(d) if d != vector.len()  => {
                    skipped += 1;
                    continue;
                }
                Some(_)                       => {}
            }
            vectors.insert(token.to_string(), vector);
        }

        if skipped > 0 {
            tracing::warn!("Skipped {} malformed embedding lines", skipped);
        }

        let dim = dim.ok_or_else(|| HighlightError::InvalidEmbeddings("no vectors found".into()))?;
        let unknown = UNKNOWN_KEYS
            .iter()
            .find_map(|k| vectors.get(*k).cloned())
            .unwrap_or_else(|| vec![0.0; dim]);

        Self::from_entries(dim, vectors, unknown)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }
}

impl RepresentationSource for EmbeddingTable {
    fn dim(&self) -> usize {
        self.dim
    }

    fn lookup(&self, token: &str) -> Option<&[f32]> {
        self.vectors.get(token).map(Vec::as_slice)
    }

    fn unknown(&self) -> &[f32] {
        &self.unknown
    }
}
