use serde::{Deserialize, Serialize};

use crate::model::unit::ContentError;

/// Scoring mode for ordering exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderingScoring {
    /// 100 for the exact sequence, 0 otherwise.
    #[default]
    AllOrNothing,
    /// One share of the score for every item in its canonical position.
    PartialCredit,
}

/// Items to arrange plus the canonical permutation of their indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderContent {
    pub items: Vec<String>,
    pub correct_order: Vec<usize>,
    #[serde(default)]
    pub scoring: OrderingScoring,
}

impl ReorderContent {
    /// Build content whose canonical order is the items' authored order.
    #[must_use]
    pub fn in_authored_order(items: Vec<String>, scoring: OrderingScoring) -> Self {
        let correct_order = (0..items.len()).collect();
        Self {
            items,
            correct_order,
            scoring,
        }
    }

    /// # Errors
    ///
    /// Returns `ContentError::EmptyReorder` with no items, and
    /// `ContentError::InvalidCorrectOrder` unless `correct_order` is a
    /// permutation of `0..items.len()`.
    pub fn validate(&self) -> Result<(), ContentError> {
        let len = self.items.len();
        if len == 0 {
            return Err(ContentError::EmptyReorder);
        }
        if self.correct_order.len() != len {
            return Err(ContentError::InvalidCorrectOrder { len });
        }

        let mut seen = vec![false; len];
        for &index in &self.correct_order {
            match seen.get_mut(index) {
                Some(slot) if !*slot => *slot = true,
                _ => return Err(ContentError::InvalidCorrectOrder { len }),
            }
        }
        Ok(())
    }
}
