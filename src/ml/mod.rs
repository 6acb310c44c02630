// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All network code lives here.
//
//   model.rs      — TaggerConfig (topology) and the tagger network:
//                   word projection, optional word attention,
//                   optional (Bi)LSTM over sentences, output
//                   projection, optional CRF parameters
//
//   attention.rs  — word attention with word / clause /
//                   LSTM_clause contexts
//
//   crf.rs        — learned transition scores
//
//   decoder.rs    — argmax and CRF (Viterbi + marginals) decoding
//                   of per-position scores on the host
//
//   tagger.rs     — the inference service: encode, batch, run,
//                   decode, collapse BIO labels
//
// Reference: Burn Book §3 (Building Blocks)
//            Lafferty et al. (2001) Conditional Random Fields

/// Tagger topology and network
pub mod model;

/// Word-level attention
pub mod attention;

/// CRF transition parameters
pub mod crf;

/// Label decoding strategies
pub mod decoder;

/// Inference service
pub mod tagger;

/// Backend used for inference. CPU by default; the `wgpu` feature
/// moves the tagger onto the GPU.
#[cfg(not(feature = "wgpu"))]
pub type InferBackend = burn::backend::NdArray;

#[cfg(feature = "wgpu")]
pub type InferBackend = burn::backend::Wgpu;
