// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Concrete providers for things the other layers only describe:
//
//   artifacts.rs       — Trained tagger artifacts
//                        Topology JSON, CompactRecorder weights
//                        and label index, one set per
//                        ModelVariant key.
//
//   embeddings.rs      — Word vectors (RepresentationSource)
//                        GloVe / word2vec text files with an
//                        unknown-token fallback.
//
//   tokenizer_store.rs — Optional HuggingFace tokenizer for
//                        sub-word tokenisation.
//
//   parser.rs          — RuleBasedParser (LinguisticParser)
//                        Finds the main verb and its tense.
//
//   report.rs          — CSV / JSON export of the tagged
//                        document table.
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Records)

/// Tagger artifact saving, loading and discovery
pub mod artifacts;

/// Pre-trained word vectors
pub mod embeddings;

/// Optional sub-word tokenizer loading
pub mod tokenizer_store;

/// Heuristic dependency/tense parser
pub mod parser;

/// Tagged-table export
pub mod report;
