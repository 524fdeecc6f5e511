use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::unit::ContentError;

/// Default minimum score for quizzes that do not configure one.
pub const DEFAULT_PASS_MARK: u8 = 70;

fn default_pass_mark() -> u8 {
    DEFAULT_PASS_MARK
}

//
// ─── QUESTIONS ─────────────────────────────────────────────────────────────────
//

/// Correct-answer data for one question.
///
/// True/false questions use index `0` for "true" and `1` for "false".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum QuestionKind {
    SingleChoice {
        options: Vec<String>,
        correct: usize,
    },
    MultiSelect {
        options: Vec<String>,
        correct: Vec<usize>,
    },
    TrueFalse {
        correct: usize,
    },
    ShortAnswer {
        accepted_answers: Vec<String>,
        #[serde(default)]
        case_sensitive: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(default)]
    pub prompt: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl Question {
    #[must_use]
    pub fn new(id: QuestionId, prompt: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            kind,
        }
    }

    fn validate(&self) -> Result<(), ContentError> {
        let check_index = |index: usize, len: usize| {
            if index < len {
                Ok(())
            } else {
                Err(ContentError::CorrectIndexOutOfRange {
                    question: self.id,
                    index,
                    len,
                })
            }
        };

        match &self.kind {
            QuestionKind::SingleChoice { options, correct } => {
                if options.is_empty() {
                    return Err(ContentError::NoOptions(self.id));
                }
                check_index(*correct, options.len())
            }
            QuestionKind::MultiSelect { options, correct } => {
                if options.is_empty() {
                    return Err(ContentError::NoOptions(self.id));
                }
                if correct.is_empty() {
                    return Err(ContentError::NoCorrectAnswers(self.id));
                }
                correct
                    .iter()
                    .try_for_each(|index| check_index(*index, options.len()))
            }
            QuestionKind::TrueFalse { correct } => check_index(*correct, 2),
            QuestionKind::ShortAnswer {
                accepted_answers, ..
            } => {
                if accepted_answers.iter().all(|a| a.trim().is_empty()) {
                    return Err(ContentError::NoAcceptedAnswers(self.id));
                }
                Ok(())
            }
        }
    }
}

//
// ─── QUIZ CONTENT ──────────────────────────────────────────────────────────────
//

/// How a quiz attempt turns into completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizCompletionRule {
    /// Answering every question completes the unit, whatever the score.
    Attempted,
    /// The score must reach the pass mark.
    #[default]
    Passed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizContent {
    pub questions: Vec<Question>,
    #[serde(default)]
    pub completion_rule: QuizCompletionRule,
    #[serde(default = "default_pass_mark")]
    pub pass_mark: u8,
}

impl QuizContent {
    #[must_use]
    pub fn new(questions: Vec<Question>) -> Self {
        Self {
            questions,
            completion_rule: QuizCompletionRule::Passed,
            pass_mark: DEFAULT_PASS_MARK,
        }
    }

    #[must_use]
    pub fn with_pass_mark(mut self, pass_mark: u8) -> Self {
        self.pass_mark = pass_mark;
        self
    }

    #[must_use]
    pub fn with_completion_rule(mut self, rule: QuizCompletionRule) -> Self {
        self.completion_rule = rule;
        self
    }

    /// # Errors
    ///
    /// Returns `ContentError` for an empty quiz, an out-of-range pass mark,
    /// duplicate question ids, or a question with malformed answer data.
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.questions.is_empty() {
            return Err(ContentError::EmptyQuiz);
        }
        if self.pass_mark > 100 {
            return Err(ContentError::InvalidPassMark(self.pass_mark));
        }

        let mut seen = HashSet::with_capacity(self.questions.len());
        for question in &self.questions {
            if !seen.insert(question.id) {
                return Err(ContentError::DuplicateQuestion(question.id));
            }
            question.validate()?;
        }
        Ok(())
    }
}

//
// ─── ANSWERS ───────────────────────────────────────────────────────────────────
//

/// A learner's answer to one question.
///
/// Serialized untagged: a number, an array of numbers, or a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuizAnswer {
    Choice(usize),
    Choices(Vec<usize>),
    Text(String),
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn single(id: u64, correct: usize) -> Question {
        Question::new(
            QuestionId::new(id),
            "Pick one",
            QuestionKind::SingleChoice {
                options: vec!["a".into(), "b".into(), "c".into()],
                correct,
            },
        )
    }

    #[test]
    fn valid_quiz_passes_validation() {
        let quiz = QuizContent::new(vec![single(1, 2)]);
        assert_eq!(quiz.pass_mark, DEFAULT_PASS_MARK);
        assert!(quiz.validate().is_ok());
    }

    #[test]
    fn empty_quiz_is_malformed() {
        let err = QuizContent::new(Vec::new()).validate().unwrap_err();
        assert_eq!(err, ContentError::EmptyQuiz);
    }

    #[test]
    fn out_of_range_correct_index_is_malformed() {
        let err = QuizContent::new(vec![single(1, 3)]).validate().unwrap_err();
        assert_eq!(
            err,
            ContentError::CorrectIndexOutOfRange {
                question: QuestionId::new(1),
                index: 3,
                len: 3,
            }
        );
    }

    #[test]
    fn duplicate_question_ids_are_malformed() {
        let err = QuizContent::new(vec![single(4, 0), single(4, 1)])
            .validate()
            .unwrap_err();
        assert_eq!(err, ContentError::DuplicateQuestion(QuestionId::new(4)));
    }

    #[test]
    fn pass_mark_above_hundred_is_malformed() {
        let err = QuizContent::new(vec![single(1, 0)])
            .with_pass_mark(101)
            .validate()
            .unwrap_err();
        assert_eq!(err, ContentError::InvalidPassMark(101));
    }

    #[test]
    fn short_answer_needs_an_accepted_answer() {
        let q = Question::new(
            QuestionId::new(2),
            "Capital of France?",
            QuestionKind::ShortAnswer {
                accepted_answers: vec!["   ".into()],
                case_sensitive: false,
            },
        );
        let err = QuizContent::new(vec![q]).validate().unwrap_err();
        assert_eq!(err, ContentError::NoAcceptedAnswers(QuestionId::new(2)));
    }

    #[test]
    fn multi_select_with_scalar_answer_fails_to_parse() {
        let json = r#"{
            "id": 1,
            "kind": "multi-select",
            "options": ["a", "b"],
            "correct": 1
        }"#;
        assert!(serde_json::from_str::<Question>(json).is_err());
    }

    #[test]
    fn question_parses_flattened_kind() {
        let json = r#"{
            "id": 5,
            "prompt": "Name the river",
            "kind": "short-answer",
            "accepted_answers": ["Nile"]
        }"#;
        let q: Question = serde_json::from_str(json).unwrap();
        assert_eq!(
            q.kind,
            QuestionKind::ShortAnswer {
                accepted_answers: vec!["Nile".into()],
                case_sensitive: false,
            }
        );
    }

    #[test]
    fn answers_parse_untagged() {
        let answers: Vec<QuizAnswer> = serde_json::from_str(r#"[1, [0, 2], "paris"]"#).unwrap();
        assert_eq!(
            answers,
            vec![
                QuizAnswer::Choice(1),
                QuizAnswer::Choices(vec![0, 2]),
                QuizAnswer::Text("paris".into()),
            ]
        );
    }
}
