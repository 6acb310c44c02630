// ============================================================
// Layer 5 — CRF Layer
// ============================================================
// Learned label-transition scores that sit on top of the output
// projection when a tagger was trained with a CRF.
//
//   transitions  [L, L]  score of moving from label i to label j
//   start        [L]     score of starting a sequence with label j
//   end          [L]     score of ending a sequence with label j
//
// The network itself only produces emissions; decoding (Viterbi
// and marginals) runs on the host in ml::decoder::CrfDecoder.

use burn::{
    module::Param,
    nn::Initializer,
    prelude::*,
};

#[derive(Config, Debug)]
pub struct CrfConfig {
    pub num_labels: usize,
    #[config(default = 0.05)]
    pub init_std:   f64,
}

impl CrfConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> CrfLayer<B> {
        let init = Initializer::Normal { mean: 0.0, std: self.init_std };
        CrfLayer {
            transitions: init.init([self.num_labels, self.num_labels], device),
            start:       init.init([self.num_labels], device),
            end:         init.init([self.num_labels], device),
        }
    }
}

#[derive(Module, Debug)]
pub struct CrfLayer<B: Backend> {
    pub transitions: Param<Tensor<B, 2>>,
    pub start:       Param<Tensor<B, 1>>,
    pub end:         Param<Tensor<B, 1>>,
}

impl<B: Backend> CrfLayer<B> {
    pub fn num_labels(&self) -> usize {
        self.start.val().dims()[0]
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::decoder::{CrfDecoder, LabelDecoder, ScoreMatrix};
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_parameter_shapes() {
        let crf = CrfConfig::new(4).init::<TestBackend>(&Default::default());
        assert_eq!(crf.transitions.val().dims(), [4, 4]);
        assert_eq!(crf.end.val().dims(), [4]);
        assert_eq!(crf.num_labels(), 4);
    }

    #[test]
    fn test_decoder_reads_layer_parameters() {
        let crf     = CrfConfig::new(3).init::<TestBackend>(&Default::default());
        let decoder = CrfDecoder::from_layer(&crf).unwrap();
        let path    = decoder.decode(&ScoreMatrix::new(2, 3, vec![0.0, 5.0, 0.0, 0.0, 0.0, 5.0]));
        assert_eq!(path.label_ids, vec![1, 2]);
    }
}
