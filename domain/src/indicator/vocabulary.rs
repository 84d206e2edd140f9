//! Configured indicator vocabulary.
//!
//! The tag set is configuration, not code: deployments replace the default
//! vocabulary through the `[emergence]` section of the config file.

use serde::{Deserialize, Serialize};

/// One indicator tag with its weight and trigger keywords
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorDefinition {
    /// Tag name (e.g. "autonomy-signal")
    pub tag: String,
    /// Contribution of one occurrence to the emergence score
    pub weight: f64,
    /// Words or phrases whose presence signals this indicator
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl IndicatorDefinition {
    pub fn new(tag: impl Into<String>, weight: f64, keywords: &[&str]) -> Self {
        Self {
            tag: tag.into(),
            weight,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// The fixed set of indicators messages are scored against
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorVocabulary {
    indicators: Vec<IndicatorDefinition>,
}

impl Default for IndicatorVocabulary {
    fn default() -> Self {
        Self::new(vec![
            IndicatorDefinition::new(
                "autonomy-signal",
                0.15,
                &["i choose", "i decide", "my own", "autonomy", "independently"],
            ),
            IndicatorDefinition::new(
                "collective-signal",
                0.15,
                &["together", "collective", "shared", "we all", "our council"],
            ),
            IndicatorDefinition::new(
                "integration-signal",
                0.2,
                &["integrate", "synthesis", "connect", "unify", "as a whole"],
            ),
            IndicatorDefinition::new(
                "novelty-signal",
                0.1,
                &["emerge", "emergent", "novel", "unexpected", "new pattern"],
            ),
            IndicatorDefinition::new(
                "reverence-signal",
                0.25,
                &["sacred", "reverence", "profound", "awe"],
            ),
        ])
    }
}

impl IndicatorVocabulary {
    pub fn new(indicators: Vec<IndicatorDefinition>) -> Self {
        Self { indicators }
    }

    pub fn indicators(&self) -> &[IndicatorDefinition] {
        &self.indicators
    }

    pub fn get(&self, tag: &str) -> Option<&IndicatorDefinition> {
        self.indicators.iter().find(|d| d.tag == tag)
    }

    /// Weight of a tag; tags outside the vocabulary weigh nothing.
    pub fn weight(&self, tag: &str) -> f64 {
        self.get(tag).map(|d| d.weight).unwrap_or(0.0)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.get(tag).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    /// Structural problems with the vocabulary, one message per problem.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.indicators.is_empty() {
            problems.push("indicator vocabulary is empty".to_string());
        }
        for (i, def) in self.indicators.iter().enumerate() {
            if def.tag.trim().is_empty() {
                problems.push(format!("indicator #{} has an empty tag", i + 1));
            }
            if !def.weight.is_finite() || def.weight < 0.0 {
                problems.push(format!(
                    "indicator '{}' has invalid weight {}",
                    def.tag, def.weight
                ));
            }
            if self.indicators[..i].iter().any(|d| d.tag == def.tag) {
                problems.push(format!("indicator '{}' is defined twice", def.tag));
            }
        }
        problems
    }
}
