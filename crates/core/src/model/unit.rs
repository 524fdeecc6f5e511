use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{PageId, QuestionId, UnitId};
use crate::model::quiz::QuizContent;
use crate::model::reorder::ReorderContent;
use crate::rules::RuleError;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Authoring-time defects in unit content.
///
/// Graders refuse to score content that fails these checks; aggregate
/// calculators skip it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentError {
    #[error("quiz has no questions")]
    EmptyQuiz,

    #[error("question {0} appears more than once")]
    DuplicateQuestion(QuestionId),

    #[error("question {0} has no options")]
    NoOptions(QuestionId),

    #[error("question {question}: correct index {index} is out of range for {len} options")]
    CorrectIndexOutOfRange {
        question: QuestionId,
        index: usize,
        len: usize,
    },

    #[error("question {0} has no correct answers")]
    NoCorrectAnswers(QuestionId),

    #[error("question {0} has no accepted answers")]
    NoAcceptedAnswers(QuestionId),

    #[error("pass mark must be between 0 and 100, got {0}")]
    InvalidPassMark(u8),

    #[error("reorder unit has no items")]
    EmptyReorder,

    #[error("correct order must be a permutation of 0..{len}")]
    InvalidCorrectOrder { len: usize },

    #[error("unit {0} appears more than once")]
    DuplicateUnit(UnitId),

    #[error("page {0} appears more than once")]
    DuplicatePage(PageId),
}

//
// ─── UNIT TYPE ─────────────────────────────────────────────────────────────────
//

/// Closed set of content unit kinds.
///
/// Grouped as passive views (`Text`, `Video`, `Image`, `Resource`), graded
/// interactions (`MicroQuiz`, `Reorder`), free responses (`Whiteboard`,
/// `Reflection`) and non-counting blocks (`Divider`, `DiscussionThread`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnitType {
    Text,
    Video,
    Image,
    Resource,
    MicroQuiz,
    Reorder,
    Whiteboard,
    Reflection,
    Divider,
    DiscussionThread,
}

impl UnitType {
    pub const ALL: [UnitType; 10] = [
        UnitType::Text,
        UnitType::Video,
        UnitType::Image,
        UnitType::Resource,
        UnitType::MicroQuiz,
        UnitType::Reorder,
        UnitType::Whiteboard,
        UnitType::Reflection,
        UnitType::Divider,
        UnitType::DiscussionThread,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            UnitType::Text => "text",
            UnitType::Video => "video",
            UnitType::Image => "image",
            UnitType::Resource => "resource",
            UnitType::MicroQuiz => "micro-quiz",
            UnitType::Reorder => "reorder",
            UnitType::Whiteboard => "whiteboard",
            UnitType::Reflection => "reflection",
            UnitType::Divider => "divider",
            UnitType::DiscussionThread => "discussion-thread",
        }
    }
}

impl fmt::Display for UnitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UnitType {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        UnitType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == needle)
            .ok_or_else(|| RuleError::UnsupportedContentType(needle.to_owned()))
    }
}

//
// ─── CONTENT PAYLOADS ──────────────────────────────────────────────────────────
//

/// Prompt shown above a reflection text box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionContent {
    pub prompt: String,
    /// Minimum character count of the trimmed response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
}

/// Type-specific payload of a unit. The variant decides the unit's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum UnitContent {
    Text {
        body: String,
    },
    Video {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        duration_secs: Option<u32>,
    },
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
    },
    Resource {
        url: String,
        title: String,
    },
    MicroQuiz(QuizContent),
    Reorder(ReorderContent),
    Whiteboard {
        prompt: String,
    },
    Reflection(ReflectionContent),
    Divider,
    DiscussionThread {
        topic: String,
    },
}

impl UnitContent {
    #[must_use]
    pub fn unit_type(&self) -> UnitType {
        match self {
            UnitContent::Text { .. } => UnitType::Text,
            UnitContent::Video { .. } => UnitType::Video,
            UnitContent::Image { .. } => UnitType::Image,
            UnitContent::Resource { .. } => UnitType::Resource,
            UnitContent::MicroQuiz(_) => UnitType::MicroQuiz,
            UnitContent::Reorder(_) => UnitType::Reorder,
            UnitContent::Whiteboard { .. } => UnitType::Whiteboard,
            UnitContent::Reflection(_) => UnitType::Reflection,
            UnitContent::Divider => UnitType::Divider,
            UnitContent::DiscussionThread { .. } => UnitType::DiscussionThread,
        }
    }

    /// Check authoring-time constraints of graded payloads.
    ///
    /// # Errors
    ///
    /// Returns the first `ContentError` found in quiz or reorder content.
    pub fn validate(&self) -> Result<(), ContentError> {
        match self {
            UnitContent::MicroQuiz(quiz) => quiz.validate(),
            UnitContent::Reorder(reorder) => reorder.validate(),
            UnitContent::Text { .. }
            | UnitContent::Video { .. }
            | UnitContent::Image { .. }
            | UnitContent::Resource { .. }
            | UnitContent::Whiteboard { .. }
            | UnitContent::Reflection(_)
            | UnitContent::Divider
            | UnitContent::DiscussionThread { .. } => Ok(()),
        }
    }
}

//
// ─── CONTENT UNIT ──────────────────────────────────────────────────────────────
//

fn default_required() -> bool {
    true
}

/// Atomic piece of learning content owned by a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentUnit {
    pub id: UnitId,
    #[serde(default = "default_required")]
    pub is_required: bool,
    pub content: UnitContent,
}

impl ContentUnit {
    #[must_use]
    pub fn new(id: UnitId, content: UnitContent) -> Self {
        Self {
            id,
            is_required: true,
            content,
        }
    }

    #[must_use]
    pub fn optional(mut self) -> Self {
        self.is_required = false;
        self
    }

    #[must_use]
    pub fn unit_type(&self) -> UnitType {
        self.content.unit_type()
    }

    /// # Errors
    ///
    /// Returns `ContentError` if the unit's graded payload is malformed.
    pub fn validate(&self) -> Result<(), ContentError> {
        self.content.validate()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
