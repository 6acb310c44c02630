// ============================================================
// Layer 4 — Tense Classifier
// ============================================================
// Labels a sentence with the grammatical tense of its main verb.
//
// The sentence is parsed and the token whose dependency relation
// is ROOT is inspected. Its "Tense" morphological feature decides
// the result:
//
//   Past → PAST    Pres → PRES    Fut → FUT
//
// Anything else resolves to UNK: no parse, no ROOT token, a ROOT
// token without the feature, or a feature value not listed above.

use crate::domain::record::Tense;
use crate::domain::traits::LinguisticParser;
use crate::infra::parser::RuleBasedParser;

pub struct TenseClassifier {
    parser: Box<dyn LinguisticParser + Send + Sync>,
}

impl TenseClassifier {
    /// Classifier backed by the built-in rule-based parser.
    pub fn new() -> Self {
        Self::with_parser(RuleBasedParser::new())
    }

    pub fn with_parser(parser: impl LinguisticParser + Send + Sync + 'static) -> Self {
        Self { parser: Box::new(parser) }
    }

    pub fn tense(&self, sentence: &str) -> Tense {
        let Some(tokens) = self.parser.parse(sentence) else {
            return Tense::Unknown;
        };
        tokens
            .iter()
            .find(|t| t.is_root())
            .and_then(|root| root.feature("Tense"))
            .map(Tense::from_feature)
            .unwrap_or(Tense::Unknown)
    }
}

impl Default for TenseClassifier {
    fn default() -> Self {
        Self::new()
    }
}
