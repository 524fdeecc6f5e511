use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::quiz::QuizAnswer;

/// One learner submission against a unit. The shape depends on the unit type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attempt {
    Quiz {
        answers: BTreeMap<QuestionId, QuizAnswer>,
    },
    Reorder {
        order: Vec<usize>,
    },
    Reflection {
        text: String,
    },
    /// Drawing captured by the whiteboard widget; never inspected beyond emptiness.
    Whiteboard {
        payload: serde_json::Value,
    },
    /// Passive tracking event emitted by the viewer of text, media or resources.
    View {
        dwell_secs: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        watched_percentage: Option<u8>,
    },
}

impl Attempt {
    #[must_use]
    pub fn quiz(answers: impl IntoIterator<Item = (QuestionId, QuizAnswer)>) -> Self {
        Attempt::Quiz {
            answers: answers.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Attempt::Quiz { .. } => "quiz",
            Attempt::Reorder { .. } => "reorder",
            Attempt::Reflection { .. } => "reflection",
            Attempt::Whiteboard { .. } => "whiteboard",
            Attempt::View { .. } => "view",
        }
    }

    /// View events are tracking signals, not answers worth keeping.
    #[must_use]
    pub fn is_response(&self) -> bool {
        !matches!(self, Attempt::View { .. })
    }
}
