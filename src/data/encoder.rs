// ============================================================
// Layer 4 — Sequence Encoder
// ============================================================
// Converts a Chunk of sentences into fixed-shape numbers the
// tagger network can read.
//
// Two layouts, picked by the loaded topology:
//
//   Averaged   [max_seq_len, rep_dim]
//              one vector per sentence: the mean of its token
//              vectors (taggers trained without word attention)
//
//   Clauses    [max_seq_len, max_clause_len, rep_dim]
//              every token vector kept, for word-level attention
//
// Padding follows the training convention: sequences are padded
// on the LEFT, and when too long they lose their FIRST elements.
// The same rule applies to tokens inside a sentence. So the
// real sentences of a short chunk always occupy the last rows.
//
// Example, max_seq_len=5, chunk of 3 sentences:
//   row:  0    1    2    3    4
//         pad  pad  s0   s1   s2
//
// Token vectors come from a RepresentationSource; a token it does
// not know resolves to the unknown vector, never an error.

use std::sync::Arc;

use tokenizers::Tokenizer;

use crate::domain::sentence::Chunk;
use crate::domain::traits::RepresentationSource;

/// Large negative score added to padded word positions before softmax.
pub const PAD_PENALTY: f32 = -1.0e9;

/// Shape settings, taken from the topology the tagger was trained with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderSettings {
    pub max_seq_len:    usize,
    /// `Some` when the tagger attends over words, `None` for averaged input
    pub max_clause_len: Option<usize>,
    /// Lower-case sentences before tokenising
    pub lowercase:      bool,
}

/// One encoded chunk, flattened row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedChunk {
    /// Sentences in the source chunk
    pub sentence_count:    usize,
    /// Sentences that fit in the sequence (the last ones)
    pub kept:              usize,
    pub max_seq_len:       usize,
    pub max_clause_len:    Option<usize>,
    pub rep_dim:           usize,
    /// Averaged: [max_seq_len * rep_dim]
    /// Clauses:  [max_seq_len * max_clause_len * rep_dim]
    pub features:          Vec<f32>,
    /// Clauses only: 1/len for real tokens, 0 for padding, [max_seq_len * max_clause_len]
    pub word_weights:      Vec<f32>,
    /// Clauses only: 0 for real tokens, PAD_PENALTY for padding
    pub word_penalty:      Vec<f32>,
    /// Tokens that resolved to the unknown vector
    pub vocabulary_misses: usize,
}

impl EncodedChunk {
    /// Leading sentences that did not fit in the sequence
    pub fn dropped(&self) -> usize {
        self.sentence_count - self.kept
    }
}

pub struct SequenceEncoder {
    representations: Arc<dyn RepresentationSource + Send + Sync>,
    tokenizer:       Option<Tokenizer>,
    settings:        EncoderSettings,
}

impl SequenceEncoder {
    pub fn new(
        representations: Arc<dyn RepresentationSource + Send + Sync>,
        settings:        EncoderSettings,
    ) -> Self {
        Self { representations, tokenizer: None, settings }
    }

    /// Use a sub-word tokenizer instead of whitespace splitting.
    pub fn with_tokenizer(mut self, tokenizer: Option<Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn rep_dim(&self) -> usize {
        self.representations.dim()
    }

    /// Split one sentence into the tokens used for representation lookup.
    pub fn tokens(&self, sentence: &str) -> Vec<String> {
        let text = if self.settings.lowercase {
            sentence.to_lowercase()
        } else {
            sentence.to_string()
        };

        if let Some(tok) = &self.tokenizer {
            match tok.encode(text.as_str(), false) {
                Ok(enc) => return enc.get_tokens().to_vec(),
                Err(e)  => tracing::warn!("Sub-word tokenisation failed, splitting on whitespace: {e}"),
            }
        }

        text.split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn encode(&self, chunk: &Chunk) -> EncodedChunk {
        let max_seq_len = self.settings.max_seq_len;
        let rep_dim     = self.rep_dim();
        let kept        = chunk.len().min(max_seq_len);
        let offset      = max_seq_len - kept;

        // Only the last `kept` sentences are encoded (front truncation)
        let visible = &chunk.sentences()[chunk.len() - kept..];

        let mut misses = 0usize;
        let mut out = match self.settings.max_clause_len {
            None => {
                let mut features = vec![0.0f32; max_seq_len * rep_dim];
                for (row, sentence) in visible.iter().enumerate() {
                    let tokens = self.tokens(&sentence.text);
                    let start  = (offset + row) * rep_dim;
                    self.mean_vector(&tokens, &mut features[start..start + rep_dim], &mut misses);
                }
                EncodedChunk {
                    sentence_count:    chunk.len(),
                    kept,
                    max_seq_len,
                    max_clause_len:    None,
                    rep_dim,
                    features,
                    word_weights:      Vec::new(),
                    word_penalty:      Vec::new(),
                    vocabulary_misses: 0,
                }
            }
            Some(max_clause_len) => {
                let cells        = max_seq_len * max_clause_len;
                let mut features = vec![0.0f32; cells * rep_dim];
                let mut weights  = vec![0.0f32; cells];
                let mut penalty  = vec![PAD_PENALTY; cells];

                for (row, sentence) in visible.iter().enumerate() {
                    let tokens     = self.tokens(&sentence.text);
                    let n          = tokens.len().min(max_clause_len);
                    let tokens     = &tokens[tokens.len() - n..];
                    let word_off   = max_clause_len - n;
                    let row_base   = (offset + row) * max_clause_len;

                    for (i, token) in tokens.iter().enumerate() {
                        let cell = row_base + word_off + i;
                        let vec  = self.lookup_counting(token, &mut misses);
                        features[cell * rep_dim..(cell + 1) * rep_dim].copy_from_slice(vec);
                        weights[cell] = 1.0 / n as f32;
                        penalty[cell] = 0.0;
                    }
                }
                EncodedChunk {
                    sentence_count:    chunk.len(),
                    kept,
                    max_seq_len,
                    max_clause_len:    Some(max_clause_len),
                    rep_dim,
                    features,
                    word_weights:      weights,
                    word_penalty:      penalty,
                    vocabulary_misses: 0,
                }
            }
        };

        out.vocabulary_misses = misses;
        out
    }

    fn lookup_counting(&self, token: &str, misses: &mut usize) -> &[f32] {
        match self.representations.lookup(token) {
            Some(v) => v,
            None => {
                *misses += 1;
                self.representations.unknown()
            }
        }
    }

    /// Write the mean of the token vectors into `dst`. A sentence with
    /// no tokens is represented by the unknown vector.
    fn mean_vector(&self, tokens: &[String], dst: &mut [f32], misses: &mut usize) {
        if tokens.is_empty() {
            dst.copy_from_slice(self.representations.unknown());
            return;
        }
        for token in tokens {
            let v = self.lookup_counting(token, misses);
            for (d, x) in dst.iter_mut().zip(v) {
                *d += x;
            }
        }
        let n = tokens.len() as f32;
        dst.iter_mut().for_each(|d| *d /= n);
    }
}
