// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Normalises pasted paper text before sentence segmentation.
//
// Cleaning steps (applied in order):
//   1. Newlines and carriage returns become spaces
//   2. Every non-ASCII character is dropped
//   3. Remaining control characters become spaces
//   4. Runs of whitespace collapse to one space
//   5. Leading/trailing whitespace is trimmed
//
// Line breaks in copied PDFs fall mid-sentence far more often
// than at sentence ends, so they never act as boundaries.

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean raw input text; returns an owned, single-line String.
    pub fn clean(&self, text: &str) -> String {
        // ── Steps 1–3: per-character mapping ──────────────────────────────────
        let mapped = text.chars().filter(char::is_ascii).map(|c| match c {
            '\n' | '\r' | '\t'       => ' ',
            c if c.is_ascii_control() => ' ',
            c                         => c,
        });

        // ── Steps 4–5: collapse whitespace and trim ───────────────────────────
        let mut out        = String::with_capacity(text.len());
        let mut last_space = true; // swallows leading spaces
        for c in mapped {
            if c == ' ' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }
        if out.ends_with(' ') {
            out.pop();
        }
        out
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newlines_become_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("first line\nsecond\r\nthird"), "first line second third");
    }

    #[test]
    fn test_drops_non_ascii() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("naïve résumé — done"), "nave rsum done");
    }

    #[test]
    fn test_collapses_and_trims() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("   hello \t\t  world  "), "hello world");
    }

    #[test]
    fn test_empty_string() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(""), "");
        assert_eq!(p.clean(" \n\r "), "");
    }
}
