// ============================================================
// Layer 4 — Batch Chunker
// ============================================================
// Groups a document's sentences into consecutive chunks the
// tagger can take in one sequence.
//
// The tagger was trained on sequences of at most 40 sentences.
// Chunks default to 30 so that a few extra boundaries invented by
// the segmenter (abbreviations it did not know) still keep a chunk
// under the trained maximum once the tagger re-reads it.
//
// Chunks never overlap and never reorder: flattening them gives
// back the input sentence order. An empty input produces no
// chunks at all, so an empty chunk can never reach the tagger.
//
// Example with chunk_size=3:
//   Sentences: s0 s1 s2 s3 s4 s5 s6
//   Chunk 1:   s0 s1 s2
//   Chunk 2:   s3 s4 s5
//   Chunk 3:   s6

use crate::domain::sentence::{Chunk, Sentence};

/// Sentences per chunk unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 30;

#[derive(Debug, Clone)]
pub struct BatchChunker {
    chunk_size: usize,
    /// Optional cap on chunks per document; sentences past it are dropped
    max_chunks: Option<usize>,
}

impl BatchChunker {
    /// # Panics
    /// Panics if `chunk_size` is zero.
    pub fn new(chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be greater than zero");
        Self { chunk_size, max_chunks: None }
    }

    pub fn with_max_chunks(mut self, max_chunks: Option<usize>) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Split sentences into ordered chunks of at most `chunk_size`.
    pub fn chunk(&self, sentences: &[Sentence]) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = sentences
            .chunks(self.chunk_size)
            .map(|c| Chunk::new(c.to_vec()))
            .collect();

        if let Some(max) = self.max_chunks {
            if chunks.len() > max {
                let dropped: usize = chunks[max..].iter().map(Chunk::len).sum();
                tracing::warn!(
                    "Document has {} chunks but only {} are tagged; dropping the last {} sentences",
                    chunks.len(),
                    max,
                    dropped
                );
                chunks.truncate(max);
            }
        }

        chunks
    }
}

impl Default for BatchChunker {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::segmenter::SentenceSegmenter;

    fn numbered(n: usize) -> Vec<Sentence> {
        (0..n).map(|i| Sentence::new(format!("Sentence {i}."), i)).collect()
    }

    #[test]
    fn test_default_chunk_size() {
        let chunks = BatchChunker::default().chunk(&numbered(31));
        assert_eq!(chunks[0].len(), DEFAULT_CHUNK_SIZE);
        assert_eq!(chunks[1].len(), 1);
    }

    #[test]
    fn test_basic_chunking() {
        let chunks = BatchChunker::new(3).chunk(&numbered(7));
        let sizes: Vec<usize> = chunks.iter().map(Chunk::len).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
        assert_eq!(chunks[1].sentences()[0].index, 3);
    }

    #[test]
    fn test_flattening_restores_order() {
        let text: String = (0..75).map(|i| format!("This is sentence number {i}. ")).collect();
        let seg       = SentenceSegmenter::new();
        let sentences = seg.segment(&text);
        let chunks    = BatchChunker::default().chunk(&sentences);

        assert_eq!(chunks.len(), 3);
        let flat: Vec<Sentence> = chunks.iter().flat_map(|c| c.sentences().to_vec()).collect();
        assert_eq!(flat, sentences);
    }

    #[test]
    fn test_empty_input_gives_no_chunks() {
        assert!(BatchChunker::default().chunk(&[]).is_empty());
    }

    #[test]
    fn test_max_chunks_drops_trailing_sentences() {
        let chunks = BatchChunker::new(2).with_max_chunks(Some(2)).chunk(&numbered(7));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[1].sentences()[1].index, 3);
    }

    #[test]
    fn test_exact_multiple_has_no_tail_chunk() {
        assert_eq!(BatchChunker::new(3).chunk(&numbered(6)).len(), 2);
        assert_eq!(BatchChunker::new(3).chunk(&numbered(7)).len(), 3);
    }

    #[test]
    #[should_panic]
    fn test_zero_chunk_size_panics() {
        let _ = BatchChunker::new(0);
    }
}
