// ============================================================
// Layer 6 — Rule-Based Parser
// ============================================================
// A small LinguisticParser for English scientific prose. It does
// not build a full dependency tree: it only finds the main verb,
// marks it ROOT and attaches a Tense feature when one can be read
// off the surface form.
//
// Rules, first match wins:
//   1. Modal "will"/"shall" + verb        → verb is ROOT, Tense=Fut
//   2. Finite auxiliary (is, was, has ..) → the participle after it
//                                           (or the auxiliary itself)
//                                           is ROOT, tense of the aux
//   3. Past form (-ed or irregular) not
//      at the start of the sentence       → ROOT, Tense=Past
//   4. Verb after a subject pronoun        → ROOT, Tense=Pres
//   5. Otherwise the first token is ROOT with no Tense
//
// Tokens other than the root get dep "dep".

use std::collections::BTreeMap;

use crate::domain::traits::{LinguisticParser, ParsedToken};

const PRESENT_AUX: &[&str] = &["am", "is", "are", "has", "have", "does", "do"];
const PAST_AUX:    &[&str] = &["was", "were", "had", "did"];
const MODALS:      &[&str] = &["will", "shall", "won't"];
const PRONOUNS:    &[&str] = &["we", "i", "they", "you", "it", "he", "she", "this", "these", "which"];

const IRREGULAR_PAST: &[&str] = &[
    "found", "made", "took", "gave", "saw", "got", "led", "began", "became", "ran",
    "wrote", "built", "chose", "drew", "fell", "felt", "grew", "held", "kept", "knew",
    "left", "lost", "met", "paid", "put", "rose", "said", "sent", "set", "showed",
    "shown", "sought", "spent", "stood", "taught", "thought", "told", "understood", "won",
];

#[derive(Debug, Clone, Default)]
pub struct RuleBasedParser;

impl RuleBasedParser {
    pub fn new() -> Self {
        Self
    }

    fn words(sentence: &str) -> Vec<String> {
        sentence
            .split_whitespace()
            .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric() && c != '\''))
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn is_past_form(word: &str) -> bool {
        (word.len() > 3 && word.ends_with("ed")) || IRREGULAR_PAST.contains(&word)
    }

    fn is_participle(word: &str) -> bool {
        Self::is_past_form(word) || (word.len() > 4 && word.ends_with("ing")) || word == "been"
    }

    /// Index of the root word and its tense feature, if any.
    fn find_root(lower: &[String]) -> (usize, Option<&'static str>) {
        // 1. modal + verb
        if let Some(i) = lower.iter().position(|w| MODALS.contains(&w.as_str())) {
            let verb = (i + 1..lower.len().min(i + 3))
                .find(|&j| lower[j] != "not" && lower[j] != "also")
                .unwrap_or(i);
            return (verb, Some("Fut"));
        }

        // 2. finite auxiliary
        for (i, w) in lower.iter().enumerate() {
            let tense = if PRESENT_AUX.contains(&w.as_str()) {
                "Pres"
            } else if PAST_AUX.contains(&w.as_str()) {
                "Past"
            } else {
                continue;
            };
            let root = (i + 1..lower.len().min(i + 4))
                .find(|&j| Self::is_participle(&lower[j]))
                .unwrap_or(i);
            return (root, Some(tense));
        }

        // 3. simple past
        if let Some(i) = lower.iter().skip(1).position(|w| Self::is_past_form(w)) {
            return (i + 1, Some("Past"));
        }

        // 4. present after a pronoun subject
        if let Some(i) = lower
            .windows(2)
            .position(|pair| PRONOUNS.contains(&pair[0].as_str()) && pair[1].chars().all(char::is_alphabetic))
        {
            return (i + 1, Some("Pres"));
        }

        (0, None)
    }
}

impl LinguisticParser for RuleBasedParser {
    fn parse(&self, sentence: &str) -> Option<Vec<ParsedToken>> {
        let words = Self::words(sentence);
        if words.is_empty() {
            return None;
        }
        let lower: Vec<String>  = words.iter().map(|w| w.to_lowercase()).collect();
        let (root, tense)       = Self::find_root(&lower);

        let tokens = words
            .into_iter()
            .enumerate()
            .map(|(i, text)| {
                let mut morph = BTreeMap::new();
                let dep = if i == root {
                    if let Some(t) = tense {
                        morph.insert("Tense".to_string(), t.to_string());
                    }
                    "ROOT"
                } else {
                    "dep"
                };
                ParsedToken { text, dep: dep.to_string(), morph }
            })
            .collect();
        Some(tokens)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn root_of(sentence: &str) -> (String, Option<String>) {
        let tokens = RuleBasedParser::new().parse(sentence).unwrap();
        let root   = tokens.into_iter().find(|t| t.is_root()).unwrap();
        let tense  = root.feature("Tense").map(str::to_string);
        (root.text, tense)
    }

    #[test]
    fn test_future_modal() {
        assert_eq!(root_of("This will not change the outcome."), ("change".into(), Some("Fut".into())));
    }

    #[test]
    fn test_auxiliary_with_participle() {
        assert_eq!(root_of("The data were collected in 2019."), ("collected".into(), Some("Past".into())));
        assert_eq!(root_of("We have shown that it holds."), ("shown".into(), Some("Pres".into())));
    }

    #[test]
    fn test_adjectival_participle_does_not_win_over_auxiliary() {
        assert_eq!(root_of("The proposed method is fast."), ("is".into(), Some("Pres".into())));
    }

    #[test]
    fn test_simple_past_and_present() {
        assert_eq!(root_of("We observed a strong effect."), ("observed".into(), Some("Past".into())));
        assert_eq!(root_of("We propose a new tagger."), ("propose".into(), Some("Pres".into())));
    }

    #[test]
    fn test_no_verb_has_no_tense() {
        assert_eq!(root_of("Results and discussion."), ("Results".into(), None));
    }

    #[test]
    fn test_empty_sentence_does_not_parse() {
        assert!(RuleBasedParser::new().parse("  ...  ").is_none());
    }
}
