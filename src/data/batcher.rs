// ============================================================
// Layer 4 — Chunk Batcher
// ============================================================
// Stacks a list of EncodedChunks into tensors for one forward
// pass of the tagger.
//
// How batching works here:
//   Input:  N EncodedChunks, all encoded with the same settings
//   Output: ChunkBatch with N as the first dimension
//
//   Averaged   features [N, S, D]
//   Clauses    words    [N, S, W, D]
//              weights  [N, S, W]   1/len per real word, 0 for padding
//              penalty  [N, S, W]   0 per real word, large negative for padding
//
// Every chunk is already padded to the same S (and W), so the
// flat buffers simply concatenate before the reshape.

use anyhow::{bail, Result};
use burn::{prelude::*, tensor::TensorData};

use crate::data::encoder::EncodedChunk;
use crate::domain::error::HighlightError;

// ─── ChunkBatch ───────────────────────────────────────────────────────────────
/// Tagger input for a batch of chunks.
#[derive(Debug, Clone)]
pub enum ChunkBatch<B: Backend> {
    /// One averaged vector per sentence
    Averaged {
        sentences: Tensor<B, 3>,
    },
    /// Every word vector, for word-level attention
    Clauses {
        words:        Tensor<B, 4>,
        mean_weights: Tensor<B, 3>,
        word_penalty: Tensor<B, 3>,
    },
}

// ─── ChunkBatcher ─────────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct ChunkBatcher<B: Backend> {
    pub device: B::Device,
}

impl<B: Backend> ChunkBatcher<B> {
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }

    /// Stack encoded chunks into one batch.
    ///
    /// Fails when the list is empty or when the chunks were encoded
    /// with different shapes.
    pub fn batch(&self, items: &[EncodedChunk]) -> Result<ChunkBatch<B>> {
        let Some(first) = items.first() else {
            bail!("cannot batch an empty list of chunks");
        };
        let batch_size  = items.len();
        let seq_len     = first.max_seq_len;
        let rep_dim     = first.rep_dim;
        let clause_len  = first.max_clause_len;

        for item in items {
            if item.max_seq_len != seq_len
                || item.rep_dim != rep_dim
                || item.max_clause_len != clause_len
            {
                return Err(HighlightError::ShapeMismatch {
                    expected: format!("[{seq_len}, {clause_len:?}, {rep_dim}]"),
                    actual:   format!("[{}, {:?}, {}]", item.max_seq_len, item.max_clause_len, item.rep_dim),
                }
                .into());
            }
        }

        let features: Vec<f32> = items.iter().flat_map(|c| c.features.iter().copied()).collect();

        match clause_len {
            None => {
                let sentences = self.tensor(features, [batch_size * seq_len * rep_dim])
                    .reshape([batch_size, seq_len, rep_dim]);
                Ok(ChunkBatch::Averaged { sentences })
            }
            Some(words_per) => {
                let cells = batch_size * seq_len * words_per;

                let words = self.tensor(features, [cells * rep_dim])
                    .reshape([batch_size, seq_len, words_per, rep_dim]);

                let weights: Vec<f32> = items.iter().flat_map(|c| c.word_weights.iter().copied()).collect();
                let penalty: Vec<f32> = items.iter().flat_map(|c| c.word_penalty.iter().copied()).collect();

                let mean_weights = self.tensor(weights, [cells]).reshape([batch_size, seq_len, words_per]);
                let word_penalty = self.tensor(penalty, [cells]).reshape([batch_size, seq_len, words_per]);

                Ok(ChunkBatch::Clauses { words, mean_weights, word_penalty })
            }
        }
    }

    fn tensor(&self, values: Vec<f32>, shape: [usize; 1]) -> Tensor<B, 1> {
        Tensor::<B, 1>::from_data(TensorData::new(values, shape), &self.device)
    }
}
