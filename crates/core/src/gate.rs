//! Sequential page gating.
//!
//! A page marked `is_locked` holds back every page after it until it is
//! complete. All earlier pages are scanned, so finishing a later, ungated
//! page never bypasses an unmet gate further up.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::completion::{ProgressLookup, page_completion};
use crate::model::{Course, Page, PageId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GateError {
    #[error("page index {index} is out of range for {len} pages")]
    PageOutOfRange { index: usize, len: usize },

    #[error("page {0} does not belong to this course")]
    UnknownPage(PageId),
}

/// Navigation verdict for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    pub page_id: PageId,
    pub locked: bool,
    /// Earliest gating page that is still incomplete.
    pub blocked_by: Option<PageId>,
}

fn is_unmet_gate<P>(page: &Page, progress: &P) -> bool
where
    P: ProgressLookup + ?Sized,
{
    page.is_locked && !page_completion(page, progress).is_complete
}

/// Whether the page at `index` is locked by an earlier incomplete gate.
///
/// # Errors
///
/// Returns `GateError::PageOutOfRange` if `index` is past the end of `pages`.
pub fn is_page_locked<P>(pages: &[Page], index: usize, progress: &P) -> Result<bool, GateError>
where
    P: ProgressLookup + ?Sized,
{
    if index >= pages.len() {
        return Err(GateError::PageOutOfRange {
            index,
            len: pages.len(),
        });
    }
    Ok(pages[..index].iter().any(|page| is_unmet_gate(page, progress)))
}

/// Gate decisions for an ordered run of pages, in the same order.
pub fn gate_decisions<'a, I, P>(pages: I, progress: &P) -> Vec<GateDecision>
where
    I: IntoIterator<Item = &'a Page>,
    P: ProgressLookup + ?Sized,
{
    let mut blocker: Option<PageId> = None;
    pages
        .into_iter()
        .map(|page| {
            let decision = GateDecision {
                page_id: page.id,
                locked: blocker.is_some(),
                blocked_by: blocker,
            };
            if blocker.is_none() && is_unmet_gate(page, progress) {
                blocker = Some(page.id);
            }
            decision
        })
        .collect()
}

/// Gate decisions across a whole course; gates carry over chapter boundaries.
pub fn course_gate_decisions<P>(course: &Course, progress: &P) -> Vec<GateDecision>
where
    P: ProgressLookup + ?Sized,
{
    gate_decisions(course.pages(), progress)
}

/// Whether a learner may open `page_id` right now.
///
/// # Errors
///
/// Returns `GateError::UnknownPage` if the page is not part of the course.
pub fn is_page_accessible<P>(course: &Course, page_id: PageId, progress: &P) -> Result<bool, GateError>
where
    P: ProgressLookup + ?Sized,
{
    let mut open = true;
    for page in course.pages() {
        if page.id == page_id {
            return Ok(open);
        }
        if open && is_unmet_gate(page, progress) {
            open = false;
        }
    }
    Err(GateError::UnknownPage(page_id))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Chapter, ChapterId, ContentUnit, CourseId, LearnerId, ProgressRecord, ProgressStatus,
        UnitContent, UnitId,
    };
    use crate::time::fixed_now;
    use std::collections::HashMap;

    fn page(id: u64, gated: bool) -> Page {
        let unit = ContentUnit::new(UnitId::new(id * 10), UnitContent::Text { body: "x".into() });
        let page = Page::new(PageId::new(id), format!("P{id}"), vec![unit]);
        if gated { page.gated() } else { page }
    }

    fn complete(pages: &[u64]) -> HashMap<UnitId, ProgressRecord> {
        pages
            .iter()
            .map(|id| {
                let unit_id = UnitId::new(id * 10);
                let mut record = ProgressRecord::start(LearnerId::new(1), unit_id, fixed_now());
                record.status = ProgressStatus::Completed;
                (unit_id, record)
            })
            .collect()
    }

    /// P1 gated, P2 plain, P3 gated, P4 plain.
    fn chain() -> Vec<Page> {
        vec![page(1, true), page(2, false), page(3, true), page(4, false)]
    }

    #[test]
    fn incomplete_first_gate_locks_everything_after_it() {
        let pages = chain();
        let progress = complete(&[]);

        assert!(!is_page_locked(&pages, 0, &progress).unwrap());
        assert!(is_page_locked(&pages, 1, &progress).unwrap());
        assert!(is_page_locked(&pages, 2, &progress).unwrap());
        assert!(is_page_locked(&pages, 3, &progress).unwrap());
    }

    #[test]
    fn completing_a_later_page_does_not_bypass_an_earlier_gate() {
        let pages = chain();
        let progress = complete(&[2, 3]);
        assert!(is_page_locked(&pages, 3, &progress).unwrap());
    }

    #[test]
    fn completing_first_gate_unlocks_up_to_next_gate() {
        let pages = chain();
        let progress = complete(&[1]);

        assert!(!is_page_locked(&pages, 1, &progress).unwrap());
        assert!(!is_page_locked(&pages, 2, &progress).unwrap());
        assert!(is_page_locked(&pages, 3, &progress).unwrap());

        let progress = complete(&[1, 3]);
        assert!(!is_page_locked(&pages, 3, &progress).unwrap());
    }

    #[test]
    fn gates_never_lock_backwards() {
        let pages = vec![page(1, false), page(2, true)];
        let progress = complete(&[]);
        assert!(!is_page_locked(&pages, 0, &progress).unwrap());
        assert!(!is_page_locked(&pages, 1, &progress).unwrap());
    }

    #[test]
    fn out_of_range_index_is_an_error() {
        let err = is_page_locked(&chain(), 4, &complete(&[])).unwrap_err();
        assert_eq!(err, GateError::PageOutOfRange { index: 4, len: 4 });
    }

    #[test]
    fn decisions_name_the_earliest_blocker() {
        let pages = chain();
        let decisions = gate_decisions(&pages, &complete(&[]));
        let blockers: Vec<_> = decisions.iter().map(|d| d.blocked_by).collect();
        assert_eq!(
            blockers,
            vec![None, Some(PageId::new(1)), Some(PageId::new(1)), Some(PageId::new(1))]
        );

        let decisions = gate_decisions(&pages, &complete(&[1]));
        let locked: Vec<_> = decisions.iter().map(|d| d.locked).collect();
        assert_eq!(locked, vec![false, false, false, true]);
        assert_eq!(decisions[3].blocked_by, Some(PageId::new(3)));
    }

    #[test]
    fn decisions_agree_with_index_queries() {
        let pages = chain();
        for done in [vec![], vec![1], vec![3], vec![1, 3], vec![1, 2, 3, 4]] {
            let progress = complete(&done);
            let decisions = gate_decisions(&pages, &progress);
            for (index, decision) in decisions.iter().enumerate() {
                assert_eq!(
                    decision.locked,
                    is_page_locked(&pages, index, &progress).unwrap()
                );
            }
        }
    }

    fn course() -> Course {
        Course::new(
            CourseId::new(1),
            "Gated",
            vec![
                Chapter::new(ChapterId::new(1), "One", vec![page(1, false), page(2, true)]),
                Chapter::new(ChapterId::new(2), "Two", vec![page(3, false)]),
            ],
        )
    }

    #[test]
    fn gates_carry_across_chapters() {
        let course = course();
        let decisions = course_gate_decisions(&course, &complete(&[]));
        assert_eq!(decisions.len(), 3);
        assert!(decisions[2].locked);
        assert_eq!(decisions[2].blocked_by, Some(PageId::new(2)));

        assert!(!is_page_accessible(&course, PageId::new(3), &complete(&[])).unwrap_or(true));
        assert!(is_page_accessible(&course, PageId::new(3), &complete(&[2])).unwrap());
        assert!(is_page_accessible(&course, PageId::new(2), &complete(&[])).unwrap());
    }

    #[test]
    fn unknown_page_is_reported() {
        let err = is_page_accessible(&course(), PageId::new(99), &complete(&[])).unwrap_err();
        assert_eq!(err, GateError::UnknownPage(PageId::new(99)));
    }
}
