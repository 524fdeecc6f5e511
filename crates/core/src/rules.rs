use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ContentUnit, QuizCompletionRule, UnitContent, UnitType};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RuleError {
    #[error("unsupported content type: {0}")]
    UnsupportedContentType(String),
}

//
// ─── COMPLETION RULES ──────────────────────────────────────────────────────────
//

/// How a unit earns completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionMethod {
    /// Rendered long enough (dwell or watch threshold).
    Viewed,
    /// Any full attempt counts.
    Answered,
    /// Score must reach the unit's pass mark.
    Passed,
    /// Submitted permutation must match the canonical order.
    CorrectOrder,
    /// Any non-empty free response.
    Submitted,
    /// Never blocks anything.
    NotCounted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRule {
    pub method: CompletionMethod,
    pub counts_towards_completion: bool,
    pub supports_pass_mark: bool,
}

impl CompletionRule {
    const fn new(method: CompletionMethod, supports_pass_mark: bool) -> Self {
        Self {
            method,
            counts_towards_completion: !matches!(method, CompletionMethod::NotCounted),
            supports_pass_mark,
        }
    }
}

/// Static completion rule for a unit type.
#[must_use]
pub const fn rule_for(unit_type: UnitType) -> CompletionRule {
    match unit_type {
        UnitType::Text | UnitType::Video | UnitType::Image | UnitType::Resource => {
            CompletionRule::new(CompletionMethod::Viewed, false)
        }
        UnitType::MicroQuiz => CompletionRule::new(CompletionMethod::Passed, true),
        UnitType::Reorder => CompletionRule::new(CompletionMethod::CorrectOrder, false),
        UnitType::Whiteboard | UnitType::Reflection => {
            CompletionRule::new(CompletionMethod::Submitted, false)
        }
        UnitType::Divider | UnitType::DiscussionThread => {
            CompletionRule::new(CompletionMethod::NotCounted, false)
        }
    }
}

/// Look up a rule from a raw type name, as found in authored documents.
///
/// # Errors
///
/// Returns `RuleError::UnsupportedContentType` for names outside the known set.
pub fn rule_for_name(name: &str) -> Result<CompletionRule, RuleError> {
    name.parse::<UnitType>().map(rule_for)
}

/// The method that applies to this particular unit.
///
/// Quizzes configured with the `attempted` rule complete on any full attempt.
#[must_use]
pub fn effective_method(unit: &ContentUnit) -> CompletionMethod {
    match &unit.content {
        UnitContent::MicroQuiz(quiz) if quiz.completion_rule == QuizCompletionRule::Attempted => {
            CompletionMethod::Answered
        }
        content => rule_for(content.unit_type()).method,
    }
}

#[must_use]
pub fn counts_towards_completion(unit: &ContentUnit) -> bool {
    rule_for(unit.unit_type()).counts_towards_completion
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
