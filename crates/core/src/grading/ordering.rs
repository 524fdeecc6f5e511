use serde::{Deserialize, Serialize};

use crate::grading::{GradingError, percentage};
use crate::model::{ContentError, OrderingScoring};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderGrade {
    /// Only true for the exact canonical sequence.
    pub correct: bool,
    pub score: u8,
    pub matched_positions: usize,
}

fn is_permutation_of(canonical: &[usize], submitted: &[usize]) -> bool {
    if canonical.len() != submitted.len() {
        return false;
    }
    let mut expected = canonical.to_vec();
    let mut given = submitted.to_vec();
    expected.sort_unstable();
    given.sort_unstable();
    expected == given
}

/// Grade a submitted permutation against the canonical one.
///
/// Partial credit counts positions where the submission matches the
/// canonical sequence; neighbouring swaps earn nothing extra.
///
/// # Errors
///
/// Returns `GradingError::MalformedContent` for an empty canonical order and
/// `GradingError::NotAPermutation` when the submission does not rearrange
/// the same indices.
pub fn grade_order(
    correct_order: &[usize],
    submitted: &[usize],
    scoring: OrderingScoring,
) -> Result<OrderGrade, GradingError> {
    if correct_order.is_empty() {
        return Err(ContentError::EmptyReorder.into());
    }
    if !is_permutation_of(correct_order, submitted) {
        return Err(GradingError::NotAPermutation {
            expected: correct_order.len(),
            got: submitted.len(),
        });
    }

    let matched_positions = correct_order
        .iter()
        .zip(submitted)
        .filter(|(expected, given)| expected == given)
        .count();
    let correct = matched_positions == correct_order.len();

    let score = match scoring {
        OrderingScoring::AllOrNothing => {
            if correct {
                100
            } else {
                0
            }
        }
        OrderingScoring::PartialCredit => percentage(matched_positions, correct_order.len()),
    };

    Ok(OrderGrade {
        correct,
        score,
        matched_positions,
    })
}
