use famgraph_graph::CatalogQuery;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Classified intent type for a natural-language question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentType {
    Anticipation,
    Monitoring,
    Burnout,
    Bottleneck,
    Fairness,
    Temporal,
    Research,
    General,
}

impl IntentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentType::Anticipation => "anticipation",
            IntentType::Monitoring => "monitoring",
            IntentType::Burnout => "burnout",
            IntentType::Bottleneck => "bottleneck",
            IntentType::Fairness => "fairness",
            IntentType::Temporal => "temporal",
            IntentType::Research => "research",
            IntentType::General => "general",
        }
    }
}

/// Result of classifying a question. The description is carried into the
/// response envelope so callers can show what the question was read as.
#[derive(Debug, Clone)]
pub struct Intent {
    pub intent_type: IntentType,
    pub queries: Vec<CatalogQuery>,
    pub description: &'static str,
    pub confidence: f64,
}

struct IntentPattern {
    intent_type: IntentType,
    pattern: &'static str,
    queries: &'static [CatalogQuery],
    description: &'static str,
    confidence: f64,
}

/// Rule table for intent classification. Order matters: the first matching
/// entry wins, so broader patterns sit later in the table.
static INTENT_PATTERNS: &[IntentPattern] = &[
    IntentPattern {
        intent_type: IntentType::Anticipation,
        pattern: r"(?i)notice|see|think ahead|plan|mental load|invisible|remember",
        queries: &[CatalogQuery::AnticipationBurden],
        description: "Questions about noticing and planning tasks",
        confidence: 0.9,
    },
    IntentPattern {
        intent_type: IntentType::Monitoring,
        pattern: r"(?i)check|follow up|nag|remind|chase|monitor|track",
        queries: &[CatalogQuery::MonitoringOverhead],
        description: "Questions about following up on tasks",
        confidence: 0.9,
    },
    IntentPattern {
        intent_type: IntentType::Burnout,
        pattern: r"(?i)tired|exhaust|overwhelm|too much|stress|burnout|worn out",
        queries: &[
            CatalogQuery::AnticipationBurden,
            CatalogQuery::MonitoringOverhead,
            CatalogQuery::TaskCreationVsExecution,
        ],
        description: "Questions about feeling overwhelmed",
        confidence: 0.85,
    },
    IntentPattern {
        intent_type: IntentType::Bottleneck,
        pattern: r"(?i)stuck|waiting|depend|block|bottleneck|critical",
        queries: &[
            CatalogQuery::CoordinationBottleneck,
            CatalogQuery::RippleEffect,
        ],
        description: "Questions about coordination and dependencies",
        confidence: 0.85,
    },
    IntentPattern {
        intent_type: IntentType::Fairness,
        pattern: r"(?i)fair|equal|balance|share|split|equitable",
        queries: &[
            CatalogQuery::PhaseDistribution,
            CatalogQuery::TaskCreationVsExecution,
        ],
        description: "Questions about workload distribution",
        confidence: 0.9,
    },
    IntentPattern {
        intent_type: IntentType::Temporal,
        pattern: r"(?i)when|time|pattern|schedule|routine|sunday|weekend",
        queries: &[CatalogQuery::TemporalTaskCreation],
        description: "Questions about timing patterns",
        confidence: 0.8,
    },
    IntentPattern {
        intent_type: IntentType::Research,
        pattern: r"(?i)research|decide|decision|option|choice",
        queries: &[CatalogQuery::DecisionResearchGap],
        description: "Questions about decision-making burden",
        confidence: 0.85,
    },
];

static COMPILED_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    INTENT_PATTERNS
        .iter()
        .map(|p| Regex::new(p.pattern).unwrap())
        .collect()
});

/// Classify a question against the rule table. First match wins; questions
/// matching nothing fall through to a low-confidence general intent.
pub fn classify_intent(question: &str) -> Intent {
    let lower = question.to_lowercase();

    for (pattern, regex) in INTENT_PATTERNS.iter().zip(COMPILED_PATTERNS.iter()) {
        if regex.is_match(&lower) {
            return Intent {
                intent_type: pattern.intent_type,
                queries: pattern.queries.to_vec(),
                description: pattern.description,
                confidence: pattern.confidence,
            };
        }
    }

    Intent {
        intent_type: IntentType::General,
        queries: vec![
            CatalogQuery::AnticipationBurden,
            CatalogQuery::TaskCreationVsExecution,
        ],
        description: "General family insights",
        confidence: 0.5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burnout_intent() {
        let intent = classify_intent("Why am I so tired all the time?");
        assert_eq!(intent.intent_type, IntentType::Burnout);
        assert_eq!(intent.queries.len(), 3);
        assert!(intent.confidence >= 0.85);
    }

    #[test]
    fn test_monitoring_intent() {
        let intent = classify_intent("Who has to nag everyone about chores?");
        assert_eq!(intent.intent_type, IntentType::Monitoring);
        assert_eq!(intent.queries, vec![CatalogQuery::MonitoringOverhead]);
    }

    #[test]
    fn test_fairness_intent() {
        let intent = classify_intent("Is the workload split fair between us?");
        assert_eq!(intent.intent_type, IntentType::Fairness);
        assert_eq!(intent.confidence, 0.9);
    }

    #[test]
    fn test_first_match_wins_in_table_order() {
        // Matches both anticipation ("plan") and temporal ("when"), and the
        // anticipation entry comes first in the table.
        let intent = classify_intent("When do we plan the week?");
        assert_eq!(intent.intent_type, IntentType::Anticipation);
    }

    #[test]
    fn test_general_fallback() {
        let intent = classify_intent("Tell me something interesting");
        assert_eq!(intent.intent_type, IntentType::General);
        assert_eq!(intent.confidence, 0.5);
        assert_eq!(intent.description, "General family insights");
        assert_eq!(intent.queries.len(), 2);
    }

    #[test]
    fn test_classification_is_case_insensitive() {
        let intent = classify_intent("WHO MONITORS the homework?");
        assert_eq!(intent.intent_type, IntentType::Monitoring);
    }
}
