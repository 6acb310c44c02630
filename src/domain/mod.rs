// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types that describe a tagged paper:
//   sentences, chunks of sentences, discourse labels, tagged
//   records and the final highlight set.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only structs, enums, traits and the domain error type
//
// The external NLP collaborators (sentence boundary detector,
// representation source, linguistic parser) are traits here so
// the data and ml layers never depend on a concrete provider.

/// Sentences and bounded groups of sentences
pub mod sentence;

/// Discourse labels, BIO collapsing and the label index
pub mod label;

/// Tagged rows, highlight output and tense labels
pub mod record;

/// Model variant key (attention / context / lstm / bi / crf)
pub mod variant;

/// Domain error taxonomy
pub mod error;

/// Collaborator abstractions implemented by other layers
pub mod traits;
