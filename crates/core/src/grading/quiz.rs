use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::grading::{GradingError, percentage};
use crate::model::{Question, QuestionId, QuestionKind, QuizAnswer, QuizCompletionRule, QuizContent};

/// Correctness of one question within an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: QuestionId,
    pub answered: bool,
    pub correct: bool,
}

/// Aggregate result of grading a quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizGrade {
    pub passed: bool,
    /// Normalized to 0-100 regardless of question count.
    pub score: u8,
    pub correct_count: usize,
    pub total_questions: usize,
    pub results: Vec<QuestionResult>,
}

impl QuizGrade {
    #[must_use]
    pub fn all_answered(&self) -> bool {
        self.results.iter().all(|r| r.answered)
    }
}

fn normalize(text: &str, case_sensitive: bool) -> String {
    let trimmed = text.trim();
    if case_sensitive {
        trimmed.to_owned()
    } else {
        trimmed.to_lowercase()
    }
}

/// Whether the learner gave a usable answer of the kind the question asks for.
fn is_answered(question: &Question, answer: Option<&QuizAnswer>) -> bool {
    match (&question.kind, answer) {
        (
            QuestionKind::SingleChoice { .. } | QuestionKind::TrueFalse { .. },
            Some(QuizAnswer::Choice(_)),
        ) => true,
        (QuestionKind::MultiSelect { .. }, Some(QuizAnswer::Choices(indices))) => {
            !indices.is_empty()
        }
        (QuestionKind::ShortAnswer { .. }, Some(QuizAnswer::Text(text))) => {
            !text.trim().is_empty()
        }
        _ => false,
    }
}

/// Correctness of a single answer.
///
/// Missing answers and answers of the wrong shape (text for a choice
/// question, a lone index for a multi-select) are incorrect.
#[must_use]
pub fn grade_question(question: &Question, answer: Option<&QuizAnswer>) -> bool {
    let Some(answer) = answer else {
        return false;
    };

    match (&question.kind, answer) {
        (QuestionKind::SingleChoice { correct, .. }, QuizAnswer::Choice(selected))
        | (QuestionKind::TrueFalse { correct }, QuizAnswer::Choice(selected)) => {
            selected == correct
        }
        (QuestionKind::MultiSelect { correct, .. }, QuizAnswer::Choices(selected)) => {
            let selected: BTreeSet<usize> = selected.iter().copied().collect();
            let expected: BTreeSet<usize> = correct.iter().copied().collect();
            selected == expected
        }
        (
            QuestionKind::ShortAnswer {
                accepted_answers,
                case_sensitive,
            },
            QuizAnswer::Text(text),
        ) => {
            let given = normalize(text, *case_sensitive);
            !given.is_empty()
                && accepted_answers
                    .iter()
                    .any(|accepted| normalize(accepted, *case_sensitive) == given)
        }
        _ => false,
    }
}

/// Grade a full quiz attempt.
///
/// With the `attempted` rule the quiz passes once every question has an
/// answer; with `passed` the score must reach the pass mark.
///
/// # Errors
///
/// Returns `GradingError::MalformedContent` if the quiz fails validation
/// (including a quiz without questions).
pub fn grade_quiz(
    quiz: &QuizContent,
    answers: &BTreeMap<QuestionId, QuizAnswer>,
) -> Result<QuizGrade, GradingError> {
    quiz.validate()?;

    let results: Vec<QuestionResult> = quiz
        .questions
        .iter()
        .map(|question| {
            let answer = answers.get(&question.id);
            QuestionResult {
                question_id: question.id,
                answered: is_answered(question, answer),
                correct: grade_question(question, answer),
            }
        })
        .collect();

    let total_questions = results.len();
    let correct_count = results.iter().filter(|r| r.correct).count();
    let score = percentage(correct_count, total_questions);

    let passed = match quiz.completion_rule {
        QuizCompletionRule::Attempted => results.iter().all(|r| r.answered),
        QuizCompletionRule::Passed => score >= quiz.pass_mark,
    };

    Ok(QuizGrade {
        passed,
        score,
        correct_count,
        total_questions,
        results,
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
