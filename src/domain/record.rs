// ============================================================
// Layer 3 — Tagged Records and Highlights
// ============================================================
// One TaggedRecord per sentence: the text, its collapsed
// discourse label, the tagger's confidence and the tense of the
// root verb. A document's records form the table the selector
// ranks; the HighlightSet is what the user finally sees.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::label::DiscourseLabel;

/// Grammatical tense of a sentence's root verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tense {
    Past,
    Pres,
    Fut,
    #[serde(rename = "UNK")]
    Unknown,
}

impl Tense {
    /// Parse a morphological `Tense=` feature value.
    pub fn from_feature(value: &str) -> Self {
        match value {
            "Past" => Tense::Past,
            "Pres" => Tense::Pres,
            "Fut"  => Tense::Fut,
            _      => Tense::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tense::Past    => "Past",
            Tense::Pres    => "Pres",
            Tense::Fut     => "Fut",
            Tense::Unknown => "UNK",
        }
    }
}

impl fmt::Display for Tense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the document table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaggedRecord {
    pub sentence:    String,

    /// Zero-based document position of the sentence
    pub position:    usize,

    pub tag:         DiscourseLabel,

    /// Confidence of `tag`, always within [0, 1]
    pub probability: f32,

    pub tense:       Tense,
}

impl TaggedRecord {
    pub fn new(
        sentence:    impl Into<String>,
        position:    usize,
        tag:         DiscourseLabel,
        probability: f32,
        tense:       Tense,
    ) -> Self {
        Self {
            sentence: sentence.into(),
            position,
            tag,
            probability: clamp_probability(probability),
            tense,
        }
    }

    /// Sentence length in characters
    pub fn char_len(&self) -> usize {
        self.sentence.chars().count()
    }
}

/// NaN becomes 0; everything else is clipped into [0, 1].
fn clamp_probability(p: f32) -> f32 {
    if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) }
}

/// The final ordered list of highlight sentences.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighlightSet {
    sentences: Vec<String>,
}

impl HighlightSet {
    pub fn new(sentences: Vec<String>) -> Self {
        Self { sentences }
    }

    pub fn into_sentences(self) -> Vec<String> {
        self.sentences
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }

    /// Apply a rewrite to every highlight in place.
    pub fn map_sentences<F: FnMut(&str) -> String>(self, f: F) -> Self {
        Self { sentences: self.sentences.iter().map(|s| s.as_str()).map(f).collect() }
    }
}

impl fmt::Display for HighlightSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.sentences {
            writeln!(f, "\u{2022} {s}")?;
        }
        Ok(())
    }
}
