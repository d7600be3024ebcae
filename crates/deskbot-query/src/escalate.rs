//! Human-handoff decision cascade.
//!
//! Evaluated in order, first match wins. Policy-driven steps (explicit
//! request, critical topic) come before quality-driven ones: a billing
//! question escalates even when retrieval found a plausible billing chunk.

use tracing::debug;

use deskbot_core::{EscalationConfig, EscalationDecision, EscalationReason, RetrievalCandidate};

use crate::keywords::extract_keywords;

/// Decides whether to hand a query to a human rather than auto-answer.
pub struct EscalationEvaluator {
    config: EscalationConfig,
}

impl EscalationEvaluator {
    /// Create an evaluator.
    pub fn new(config: EscalationConfig) -> Self {
        Self { config }
    }

    /// Run the decision cascade for a query and its retrieved candidates.
    pub fn evaluate(
        &self,
        query_text: &str,
        candidates: &[RetrievalCandidate],
        category: Option<&str>,
    ) -> EscalationDecision {
        let query_lower = query_text.to_lowercase();

        if self
            .config
            .handoff_phrases
            .iter()
            .any(|phrase| query_lower.contains(phrase.as_str()))
        {
            return EscalationDecision::escalate(EscalationReason::ExplicitRequest);
        }

        if self
            .config
            .critical_keywords
            .iter()
            .any(|keyword| query_lower.contains(keyword.as_str()))
        {
            return EscalationDecision::escalate(EscalationReason::CriticalTopic);
        }

        if candidates.is_empty() {
            return EscalationDecision::escalate(EscalationReason::NoRelevantInformation);
        }

        let top_score = candidates[0].combined_score;
        if top_score < self.config.low_confidence_floor {
            return EscalationDecision::escalate(EscalationReason::LowConfidence(top_score));
        }

        let keyword_count = extract_keywords(query_text).len();
        if keyword_count > self.config.complexity_threshold {
            return EscalationDecision::escalate(EscalationReason::ComplexQuery);
        }

        debug!(
            category = category.unwrap_or("general"),
            top_score, keyword_count, "no escalation"
        );
        EscalationDecision::answer()
    }
}
