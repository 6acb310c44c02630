// ============================================================
// Layer 3 — Sentence and Chunk
// ============================================================
// A Sentence is one unit of segmented text plus its position
// in the document. A Chunk is a bounded, ordered run of
// consecutive sentences that the tagger processes together.
//
// Chunks partition the document: concatenating every chunk's
// sentences in chunk order gives back the document order.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// The sentence text exactly as the segmenter produced it
    pub text: String,

    /// Zero-based position within the document
    pub index: usize,
}

impl Sentence {
    pub fn new(text: impl Into<String>, index: usize) -> Self {
        Self { text: text.into(), index }
    }
}

/// A group of consecutive sentences sent to the tagger in one sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chunk {
    sentences: Vec<Sentence>,
}

impl Chunk {
    pub fn new(sentences: Vec<Sentence>) -> Self {
        Self { sentences }
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn len(&self) -> usize {
        self.sentences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sentences.is_empty()
    }
}

impl From<Vec<Sentence>> for Chunk {
    fn from(sentences: Vec<Sentence>) -> Self {
        Self::new(sentences)
    }
}

/// Build a chunk from plain strings, numbering sentences from zero.
impl<S: Into<String>> FromIterator<S> for Chunk {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let sentences = iter
            .into_iter()
            .enumerate()
            .map(|(i, s)| Sentence::new(s, i))
            .collect();
        Self { sentences }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_from_strings_numbers_sentences() {
        let chunk: Chunk = ["a.", "b.", "c."].into_iter().collect();
        assert_eq!(chunk.len(), 3);
        assert_eq!(chunk.sentences()[2].index, 2);
        let texts: Vec<&str> = chunk.sentences().iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["a.", "b.", "c."]);
    }

    #[test]
    fn test_empty_chunk() {
        let chunk = Chunk::default();
        assert!(chunk.is_empty());
        assert_eq!(chunk.len(), 0);
    }
}
