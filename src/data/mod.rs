// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// This layer handles everything from raw pasted text all the
// way to tensor batches the tagger can run on.
//
// The pipeline flows in this order:
//
//   raw text
//       │
//       ▼
//   Preprocessor      → newlines to spaces, non-ASCII dropped
//       │
//       ▼
//   SentenceSegmenter → ordered, numbered sentences
//       │
//       ▼
//   BatchChunker      → consecutive chunks of at most 30 sentences
//       │
//       ▼
//   SequenceEncoder   → left-padded word vectors per chunk
//       │
//       ▼
//   ChunkBatcher      → stacks encoded chunks into tensors
//
// TenseClassifier sits beside the pipeline: it labels single
// sentences for the tagged table.
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Batcher)
//            Rust Book §13 (Iterators and Closures)

/// Cleans and normalises raw input text
pub mod preprocessor;

/// Splits text into sentences
pub mod segmenter;

/// Groups sentences into bounded chunks
pub mod chunker;

/// Turns chunks into fixed-shape vectors
pub mod encoder;

/// Stacks encoded chunks into tensor batches
pub mod batcher;

/// Root-verb tense of a sentence
pub mod tense;
