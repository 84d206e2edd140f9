//! Indicator extraction: message text and metadata → indicator vector.
//!
//! Extraction is a pure function of its inputs. Keywords match whole words
//! (or whole word sequences for multi-word phrases), case-insensitively.

use super::vector::IndicatorVector;
use super::vocabulary::IndicatorVocabulary;

/// Extracts indicator vectors using a configured vocabulary
#[derive(Debug, Clone, Copy)]
pub struct IndicatorExtractor<'a> {
    vocabulary: &'a IndicatorVocabulary,
}

impl<'a> IndicatorExtractor<'a> {
    pub fn new(vocabulary: &'a IndicatorVocabulary) -> Self {
        Self { vocabulary }
    }

    /// Extract from message content plus explicit indicator hints.
    ///
    /// Hints come from message metadata (e.g. a participant adapter that
    /// reports its own signals). Each known hinted tag counts once; unknown
    /// tags are ignored.
    pub fn extract(&self, content: &str, hints: &[String]) -> IndicatorVector {
        let words = tokenize(content);
        let mut vector = IndicatorVector::new();

        for definition in self.vocabulary.indicators() {
            let hits: usize = definition
                .keywords
                .iter()
                .map(|keyword| count_phrase(&words, &tokenize(keyword)))
                .sum();
            vector.add(definition.tag.as_str(), u32::try_from(hits).unwrap_or(u32::MAX));
        }

        for hint in hints {
            if self.vocabulary.contains(hint) {
                vector.add(hint.as_str(), 1);
            }
        }

        vector
    }
}

/// Lowercased alphanumeric words; apostrophes stay inside words.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn count_phrase(words: &[String], phrase: &[String]) -> usize {
    if phrase.is_empty() || phrase.len() > words.len() {
        return 0;
    }
    words.windows(phrase.len()).filter(|w| *w == phrase).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::vocabulary::IndicatorDefinition;

    fn vocabulary() -> IndicatorVocabulary {
        IndicatorVocabulary::new(vec![
            IndicatorDefinition::new("autonomy-signal", 0.2, &["choose", "my own"]),
            IndicatorDefinition::new("collective-signal", 0.1, &["together"]),
        ])
    }

    #[test]
    fn test_extract_counts_whole_words() {
        let vocab = vocabulary();
        let extractor = IndicatorExtractor::new(&vocab);

        let v = extractor.extract("I choose, and I CHOOSE again. Choosers don't count.", &[]);
        assert_eq!(v.count("autonomy-signal"), 2);
        assert_eq!(v.count("collective-signal"), 0);
    }

    #[test]
    fn test_extract_multi_word_phrase() {
        let vocab = vocabulary();
        let extractor = IndicatorExtractor::new(&vocab);

        let v = extractor.extract("This is my own view; we stand together.", &[]);
        assert_eq!(v.count("autonomy-signal"), 1);
        assert_eq!(v.count("collective-signal"), 1);

        let v = extractor.extract("my\nown", &[]);
        assert_eq!(v.count("autonomy-signal"), 1);
    }

    #[test]
    fn test_hints_count_once_and_unknown_ignored() {
        let vocab = vocabulary();
        let extractor = IndicatorExtractor::new(&vocab);

        let hints = vec!["collective-signal".to_string(), "made-up".to_string()];
        let v = extractor.extract("nothing here", &hints);
        assert_eq!(v.count("collective-signal"), 1);
        assert_eq!(v.count("made-up"), 0);
        assert_eq!(v.total(), 1);
    }

    #[test]
    fn test_empty_content_yields_empty_vector() {
        let vocab = vocabulary();
        assert!(IndicatorExtractor::new(&vocab).extract("", &[]).is_empty());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let vocab = IndicatorVocabulary::default();
        let extractor = IndicatorExtractor::new(&vocab);
        let text = "Together we integrate something novel and profound.";
        assert_eq!(extractor.extract(text, &[]), extractor.extract(text, &[]));
    }
}
