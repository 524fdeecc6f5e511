//! Pure graders turning a learner attempt into a completion outcome.

mod free_response;
mod ordering;
mod quiz;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{Attempt, CompletionSettings, ContentError, ContentUnit, UnitContent, UnitType};

pub use free_response::{
    is_dwell_satisfied, is_reflection_submitted, is_watch_satisfied, is_whiteboard_submitted,
};
pub use ordering::{OrderGrade, grade_order};
pub use quiz::{QuestionResult, QuizGrade, grade_question, grade_quiz};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GradingError {
    #[error("malformed content: {0}")]
    MalformedContent(#[from] ContentError),

    #[error("submitted order is not a permutation of the {expected} canonical items (got {got})")]
    NotAPermutation { expected: usize, got: usize },

    #[error("a {attempt} attempt cannot be graded against a {unit_type} unit")]
    AttemptMismatch {
        unit_type: UnitType,
        attempt: &'static str,
    },
}

//
// ─── OUTCOME ───────────────────────────────────────────────────────────────────
//

/// Grader-specific detail, kept for presenting feedback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GradeDetail {
    Quiz(QuizGrade),
    Order(OrderGrade),
}

/// What one attempt means for the unit's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptOutcome {
    pub completed: bool,
    pub score: Option<u8>,
    pub max_score: Option<u8>,
    pub detail: Option<GradeDetail>,
}

impl AttemptOutcome {
    /// Outcome of a scored attempt on the 0-100 scale.
    #[must_use]
    pub fn graded(completed: bool, score: u8) -> Self {
        Self {
            completed,
            score: Some(score),
            max_score: Some(100),
            detail: None,
        }
    }

    /// Outcome of an attempt that carries no score.
    #[must_use]
    pub fn ungraded(completed: bool) -> Self {
        Self {
            completed,
            score: None,
            max_score: None,
            detail: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: GradeDetail) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// `round(100 * part / whole)`, with an empty whole counting as complete.
#[must_use]
pub fn percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 100;
    }
    let part = part.min(whole);
    let rounded = (part * 200 + whole) / (whole * 2);
    u8::try_from(rounded).unwrap_or(100)
}

//
// ─── DISPATCH ──────────────────────────────────────────────────────────────────
//

fn mismatch(unit: &ContentUnit, attempt: &Attempt) -> GradingError {
    GradingError::AttemptMismatch {
        unit_type: unit.unit_type(),
        attempt: attempt.kind(),
    }
}

/// Grade an attempt against the unit it targets.
///
/// Non-counting units accept any attempt as complete.
///
/// # Errors
///
/// Returns `GradingError::AttemptMismatch` when the attempt shape does not
/// fit the unit, and propagates grader errors for malformed content or
/// invalid permutations.
pub fn evaluate_attempt(
    unit: &ContentUnit,
    attempt: &Attempt,
    settings: &CompletionSettings,
) -> Result<AttemptOutcome, GradingError> {
    match &unit.content {
        UnitContent::Text { .. } | UnitContent::Image { .. } | UnitContent::Resource { .. } => {
            match attempt {
                Attempt::View { dwell_secs, .. } => Ok(AttemptOutcome::ungraded(
                    is_dwell_satisfied(*dwell_secs, settings),
                )),
                other => Err(mismatch(unit, other)),
            }
        }
        UnitContent::Video { .. } => match attempt {
            Attempt::View {
                watched_percentage, ..
            } => Ok(AttemptOutcome::ungraded(is_watch_satisfied(
                *watched_percentage,
                settings,
            ))),
            other => Err(mismatch(unit, other)),
        },
        UnitContent::MicroQuiz(quiz) => match attempt {
            Attempt::Quiz { answers } => {
                let grade = grade_quiz(quiz, answers)?;
                Ok(AttemptOutcome::graded(grade.passed, grade.score)
                    .with_detail(GradeDetail::Quiz(grade)))
            }
            other => Err(mismatch(unit, other)),
        },
        UnitContent::Reorder(reorder) => match attempt {
            Attempt::Reorder { order } => {
                reorder.validate()?;
                let grade = grade_order(&reorder.correct_order, order, reorder.scoring)?;
                Ok(AttemptOutcome::graded(grade.correct, grade.score)
                    .with_detail(GradeDetail::Order(grade)))
            }
            other => Err(mismatch(unit, other)),
        },
        UnitContent::Whiteboard { .. } => match attempt {
            Attempt::Whiteboard { payload } => {
                Ok(AttemptOutcome::ungraded(is_whiteboard_submitted(payload)))
            }
            other => Err(mismatch(unit, other)),
        },
        UnitContent::Reflection(content) => match attempt {
            Attempt::Reflection { text } => Ok(AttemptOutcome::ungraded(
                is_reflection_submitted(content, text),
            )),
            other => Err(mismatch(unit, other)),
        },
        UnitContent::Divider | UnitContent::DiscussionThread { .. } => {
            Ok(AttemptOutcome::ungraded(true))
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
