use burn::{
    nn::{
        BiLstm, BiLstmConfig,
        Dropout, DropoutConfig,
        Linear, LinearConfig,
        Lstm, LstmConfig,
    },
    prelude::*,
    tensor::activation::softmax,
};

use crate::data::batcher::ChunkBatch;
use crate::domain::variant::{AttentionContext, ModelVariant};
use crate::ml::attention::{WordAttention, WordAttentionConfig};
use crate::ml::crf::{CrfConfig, CrfLayer};

// NOTE: #[derive(Config)] already generates Clone and Serialize/Deserialize
// internally — do NOT add them again or you get conflicting impls.
#[derive(Config, Debug)]
pub struct TaggerConfig {
    /// Width of one token representation
    pub input_size:     usize,
    pub num_labels:     usize,
    pub max_seq_len:    usize,
    /// Words per sentence; only read when attention is on
    pub max_clause_len: Option<usize>,
    pub variant:        ModelVariant,

    #[config(default = 225)]
    pub word_proj_dim:      usize,
    #[config(default = 200)]
    pub lstm_dim:           usize,
    #[config(default = 110)]
    pub att_proj_dim:       usize,
    #[config(default = 60)]
    pub rec_hid_dim:        usize,

    #[config(default = 0.4)]
    pub embedding_dropout:  f64,
    #[config(default = 0.4)]
    pub high_dense_dropout: f64,
    #[config(default = 0.6)]
    pub attention_dropout:  f64,
    #[config(default = 0.5)]
    pub lstm_dropout:       f64,
}

impl TaggerConfig {
    /// Clause length the encoder must pad to, `None` for averaged input.
    pub fn clause_len(&self) -> Option<usize> {
        if self.variant.use_attention { self.max_clause_len } else { None }
    }

    /// Width of the vectors reaching the output projection
    fn sequence_dim(&self) -> usize {
        if self.variant.bidirectional {
            2 * self.lstm_dim
        } else if self.variant.lstm {
            self.lstm_dim
        } else {
            self.word_proj_dim
        }
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> DiscourseTaggerModel<B> {
        let v = &self.variant;

        let word_projection = LinearConfig::new(self.input_size, self.word_proj_dim).init(device);

        let attention = v.use_attention.then(|| {
            WordAttentionConfig::new(self.word_proj_dim, v.att_context)
                .with_proj_dim(self.att_proj_dim)
                .with_rec_hid_dim(self.rec_hid_dim)
                .init(device)
        });

        // Bidirectional wins over the unidirectional switch.
        let bilstm = v.bidirectional.then(|| {
            BiLstmConfig::new(self.word_proj_dim, self.lstm_dim, true).init(device)
        });
        let lstm = (!v.bidirectional && v.lstm).then(|| {
            LstmConfig::new(self.word_proj_dim, self.lstm_dim, true).init(device)
        });

        let output = LinearConfig::new(self.sequence_dim(), self.num_labels).init(device);
        let crf    = v.crf.then(|| CrfConfig::new(self.num_labels).init(device));

        DiscourseTaggerModel {
            embedding_dropout:  DropoutConfig::new(self.embedding_dropout).init(),
            word_projection,
            projection_dropout: DropoutConfig::new(self.high_dense_dropout).init(),
            attention,
            attention_dropout:  DropoutConfig::new(self.attention_dropout).init(),
            bilstm,
            lstm,
            lstm_dropout:       DropoutConfig::new(self.lstm_dropout).init(),
            output,
            crf,
        }
    }
}

#[derive(Module, Debug)]
pub struct DiscourseTaggerModel<B: Backend> {
    pub embedding_dropout:  Dropout,
    pub word_projection:    Linear<B>,
    pub projection_dropout: Dropout,
    pub attention:          Option<WordAttention<B>>,
    pub attention_dropout:  Dropout,
    pub bilstm:             Option<BiLstm<B>>,
    pub lstm:               Option<Lstm<B>>,
    pub lstm_dropout:       Dropout,
    pub output:             Linear<B>,
    pub crf:                Option<CrfLayer<B>>,
}

impl<B: Backend> DiscourseTaggerModel<B> {
    /// batch → [chunks, max_seq_len, num_labels]
    ///
    /// Softmax probabilities without a CRF; raw emissions with one.
    pub fn forward(&self, batch: ChunkBatch<B>) -> Tensor<B, 3> {
        let x = match batch {
            ChunkBatch::Averaged { sentences } => {
                let x = self.embedding_dropout.forward(sentences);
                self.projection_dropout.forward(self.word_projection.forward(x))
            }
            ChunkBatch::Clauses { words, mean_weights, word_penalty } => {
                let [n, s, w, _] = words.dims();
                let x = self.embedding_dropout.forward(words);
                let x = self.projection_dropout.forward(self.word_projection.forward(x));
                let p = x.dims()[3];
                match &self.attention {
                    Some(att) => self.attention_dropout.forward(att.forward(x, mean_weights, word_penalty)),
                    // Without attention the words are simply averaged.
                    None => (x * mean_weights.reshape([n, s, w, 1])).sum_dim(2).reshape([n, s, p]),
                }
            }
        };

        let x = if let Some(bilstm) = &self.bilstm {
            let (out, _) = bilstm.forward(x, None);
            self.lstm_dropout.forward(out)
        } else if let Some(lstm) = &self.lstm {
            let (out, _) = lstm.forward(x, None);
            self.lstm_dropout.forward(out)
        } else {
            x
        };

        let logits = self.output.forward(x);
        match self.crf {
            Some(_) => logits,
            None    => softmax(logits, 2),
        }
    }
}

/// Attention context the model was built with, if any.
pub fn attention_context(config: &TaggerConfig) -> Option<AttentionContext> {
    config.variant.use_attention.then_some(config.variant.att_context)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::batcher::ChunkBatcher;
    use crate::data::encoder::EncodedChunk;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn tiny(variant: ModelVariant) -> TaggerConfig {
        let mut cfg = TaggerConfig::new(4, 3, 5, variant)
            .with_word_proj_dim(6)
            .with_lstm_dim(5)
            .with_att_proj_dim(4)
            .with_rec_hid_dim(3);
        cfg.max_clause_len = Some(2);
        cfg
    }

    fn encoded(cfg: &TaggerConfig) -> EncodedChunk {
        let words = cfg.clause_len().unwrap_or(1);
        let cells = cfg.max_seq_len * words;
        EncodedChunk {
            sentence_count:    cfg.max_seq_len,
            kept:              cfg.max_seq_len,
            max_seq_len:       cfg.max_seq_len,
            max_clause_len:    cfg.clause_len(),
            rep_dim:           cfg.input_size,
            features:          (0..cells * cfg.input_size).map(|i| (i % 7) as f32 / 7.0).collect(),
            word_weights:      if cfg.clause_len().is_some() { vec![1.0 / words as f32; cells] } else { Vec::new() },
            word_penalty:      if cfg.clause_len().is_some() { vec![0.0; cells] } else { Vec::new() },
            vocabulary_misses: 0,
        }
    }

    fn run(variant: ModelVariant) -> (Vec<usize>, Vec<f32>, bool) {
        let device  = Default::default();
        let cfg     = tiny(variant);
        let model   = cfg.init::<TestBackend>(&device);
        let batch   = ChunkBatcher::<TestBackend>::new(device).batch(&[encoded(&cfg), encoded(&cfg)]).unwrap();
        let out     = model.forward(batch);
        let dims    = out.dims().to_vec();
        (dims, out.into_data().to_vec::<f32>().unwrap(), model.crf.is_none())
    }

    #[test]
    fn test_default_variant_outputs_distributions() {
        let (dims, values, probs) = run(ModelVariant::default());
        assert_eq!(dims, vec![2, 5, 3]);
        assert!(probs);
        for row in values.chunks(3) {
            let sum: f32 = row.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_every_topology_builds_and_runs() {
        let contexts = [AttentionContext::Word, AttentionContext::Clause, AttentionContext::LstmClause];
        for use_attention in [false, true] {
            for att_context in contexts {
                for (lstm, bidirectional) in [(false, false), (true, false), (false, true)] {
                    for crf in [false, true] {
                        let variant = ModelVariant { use_attention, att_context, lstm, bidirectional, crf };
                        let (dims, _, probs) = run(variant);
                        assert_eq!(dims, vec![2, 5, 3], "{variant}");
                        assert_eq!(probs, !crf);
                    }
                }
            }
        }
    }

    #[test]
    fn test_clause_len_ignored_without_attention() {
        let cfg = tiny(ModelVariant::default());
        assert_eq!(cfg.clause_len(), None);
        assert_eq!(attention_context(&cfg), None);
    }

    #[test]
    fn test_config_json_roundtrip_keeps_variant() {
        let variant = ModelVariant { use_attention: true, crf: true, ..ModelVariant::default() };
        let cfg     = tiny(variant);
        let json    = serde_json::to_string(&cfg).unwrap();
        let back: TaggerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.variant, variant);
        assert_eq!(back.max_clause_len, Some(2));
        assert_eq!(back.clause_len(), Some(2));
    }
}
