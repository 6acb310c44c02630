// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The pipeline leans on three external NLP collaborators. Each
// is a pure function from text to structure, so each is a trait
// here and the concrete provider lives in data/ or infra/:
//
//   SentenceBoundaryDetector → UnicodeSentenceDetector (data)
//   RepresentationSource     → EmbeddingTable          (infra)
//   LinguisticParser         → RuleBasedParser         (infra)

use std::collections::BTreeMap;

// ─── SentenceBoundaryDetector ─────────────────────────────────────────────────
/// Splits normalised text into sentence strings, in order.
///
/// Implementations must not split on abbreviation periods
/// ("et al.", "Fig.", "e.g.") where they can tell.
pub trait SentenceBoundaryDetector {
    fn sentences(&self, text: &str) -> Vec<String>;
}

// ─── RepresentationSource ─────────────────────────────────────────────────────
/// Maps a token to a fixed-dimension vector.
pub trait RepresentationSource {
    /// Dimension of every vector this source returns
    fn dim(&self) -> usize;

    /// Vector for a known token, `None` on a vocabulary miss
    fn lookup(&self, token: &str) -> Option<&[f32]>;

    /// Vector used for every vocabulary miss
    fn unknown(&self) -> &[f32];
}

// ─── LinguisticParser ─────────────────────────────────────────────────────────
/// One token of a dependency parse.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedToken {
    pub text:  String,
    /// Dependency relation to the head; "ROOT" for the syntactic root
    pub dep:   String,
    /// Morphological features, e.g. {"Tense": "Past", "VerbForm": "Fin"}
    pub morph: BTreeMap<String, String>,
}

impl ParsedToken {
    pub fn is_root(&self) -> bool {
        self.dep == "ROOT"
    }

    pub fn feature(&self, name: &str) -> Option<&str> {
        self.morph.get(name).map(String::as_str)
    }
}

/// Parses one sentence; `None` when it cannot be parsed at all.
pub trait LinguisticParser {
    fn parse(&self, sentence: &str) -> Option<Vec<ParsedToken>>;
}
