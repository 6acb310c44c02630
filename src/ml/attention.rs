// ============================================================
// Layer 5 — Word Attention
// ============================================================
// Collapses the words of each sentence into one sentence vector
// by a learned weighted average.
//
// Shapes (N chunks, S sentences, W words, P projected width):
//   input   words   [N, S, W, P]
//           penalty [N, S, W]     0 for real words, large negative for padding
//   output          [N, S, P]
//
// Every word gets a score  u_w · c  where u_w = tanh(W_a x_w + b)
// and c is the attention context. Three contexts exist:
//
//   word         c is one learned vector shared by all sentences
//   clause       c = tanh(W_c mean(x)) from the sentence's own words
//   LSTM_clause  c = tanh(W_c h_last) where h_last is the last state
//                of an LSTM run over the sentence's words
//
// Scores go through a softmax over W (padding excluded by the
// penalty) and weight the word vectors.

use burn::{
    module::Param,
    nn::{Initializer, Linear, LinearConfig, Lstm, LstmConfig},
    prelude::*,
    tensor::activation::{softmax, tanh},
};

use crate::domain::variant::AttentionContext;

#[derive(Config, Debug)]
pub struct WordAttentionConfig {
    /// Width of the projected word vectors
    pub input_dim:   usize,
    pub context:     AttentionContext,
    #[config(default = 110)]
    pub proj_dim:    usize,
    /// Hidden width of the clause LSTM (LSTM_clause only)
    #[config(default = 60)]
    pub rec_hid_dim: usize,
}

impl WordAttentionConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> WordAttention<B> {
        let projection = LinearConfig::new(self.input_dim, self.proj_dim).init(device);

        let (context_vector, context_proj, clause_encoder) = match self.context {
            AttentionContext::Word => {
                let init = Initializer::Normal { mean: 0.0, std: 0.05 };
                (Some(init.init([self.proj_dim], device)), None, None)
            }
            AttentionContext::Clause => {
                let proj = LinearConfig::new(self.input_dim, self.proj_dim).init(device);
                (None, Some(proj), None)
            }
            AttentionContext::LstmClause => {
                let lstm = LstmConfig::new(self.input_dim, self.rec_hid_dim, true).init(device);
                let proj = LinearConfig::new(self.rec_hid_dim, self.proj_dim).init(device);
                (None, Some(proj), Some(lstm))
            }
        };

        WordAttention { projection, context_vector, context_proj, clause_encoder }
    }
}

#[derive(Module, Debug)]
pub struct WordAttention<B: Backend> {
    pub projection:     Linear<B>,
    /// Learned context (word context)
    pub context_vector: Option<Param<Tensor<B, 1>>>,
    /// Context projection (clause and LSTM_clause contexts)
    pub context_proj:   Option<Linear<B>>,
    pub clause_encoder: Option<Lstm<B>>,
}

impl<B: Backend> WordAttention<B> {
    pub fn forward(
        &self,
        words:        Tensor<B, 4>,
        mean_weights: Tensor<B, 3>,
        penalty:      Tensor<B, 3>,
    ) -> Tensor<B, 3> {
        let [n, s, w, p] = words.dims();
        let rows         = n * s;

        let x       = words.reshape([rows, w, p]);
        let keys    = tanh(self.projection.forward(x.clone()));   // [rows, W, A]
        let context = self.context(x.clone(), mean_weights.reshape([rows, w, 1])); // [rows, 1, A] or [1, 1, A]

        let scores  = (keys * context).sum_dim(2).reshape([rows, w])
            + penalty.reshape([rows, w]);
        let weights = softmax(scores, 1).reshape([rows, w, 1]);

        (x * weights).sum_dim(1).reshape([n, s, p])
    }

    fn context(&self, x: Tensor<B, 3>, mean_weights: Tensor<B, 3>) -> Tensor<B, 3> {
        if let Some(c) = &self.context_vector {
            let a = c.val().dims()[0];
            return c.val().reshape([1, 1, a]);
        }

        let summary = match &self.clause_encoder {
            Some(lstm) => {
                // Words are left-padded, so the last step has seen every real word.
                let [rows, w, _] = x.dims();
                let (hidden, _)  = lstm.forward(x, None);
                let h            = hidden.dims()[2];
                hidden.slice([0..rows, w - 1..w, 0..h])
            }
            None => (x * mean_weights).sum_dim(1),
        };

        match &self.context_proj {
            Some(proj) => tanh(proj.forward(summary)),
            None       => summary,
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::encoder::PAD_PENALTY;
    use burn::backend::NdArray;
    use burn::tensor::TensorData;

    type TestBackend = NdArray;

    fn inputs(device: &<TestBackend as Backend>::Device) -> (Tensor<TestBackend, 4>, Tensor<TestBackend, 3>, Tensor<TestBackend, 3>) {
        // 1 chunk, 2 sentences, 3 words, width 4; the first word of each sentence is padding
        let words   = Tensor::<TestBackend, 4>::ones([1, 2, 3, 4], device);
        let weights = Tensor::<TestBackend, 1>::from_data(TensorData::new(vec![0.0f32, 0.5, 0.5, 0.0, 0.5, 0.5], [6]), device)
            .reshape([1, 2, 3]);
        let penalty = Tensor::<TestBackend, 1>::from_data(
            TensorData::new(vec![PAD_PENALTY, 0.0, 0.0, PAD_PENALTY, 0.0, 0.0], [6]),
            device,
        )
        .reshape([1, 2, 3]);
        (words, weights, penalty)
    }

    #[test]
    fn test_every_context_produces_sentence_vectors() {
        let device = Default::default();
        for context in [AttentionContext::Word, AttentionContext::Clause, AttentionContext::LstmClause] {
            let att = WordAttentionConfig::new(4, context)
                .with_proj_dim(5)
                .with_rec_hid_dim(3)
                .init::<TestBackend>(&device);
            let (w, m, p) = inputs(&device);
            assert_eq!(att.forward(w, m, p).dims(), [1, 2, 4], "context {context}");
        }
    }

    #[test]
    fn test_identical_words_average_to_themselves() {
        // Attention weights sum to one, so identical word vectors come out unchanged.
        let device = Default::default();
        let att    = WordAttentionConfig::new(4, AttentionContext::Word).init::<TestBackend>(&device);
        let (w, m, p) = inputs(&device);
        let out = att.forward(w, m, p).into_data().to_vec::<f32>().unwrap();
        assert!(out.iter().all(|v| (v - 1.0).abs() < 1e-4));
    }
}
