//! Unit completion and the page/chapter/course folds built on it.
//!
//! Every calculator is a pure function of the content tree and the learner's
//! progress records. Nothing is cached, so calling twice on the same inputs
//! always yields the same summary.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::grading::percentage;
use crate::model::{Chapter, ContentUnit, Course, Page, ProgressRecord, UnitId};
use crate::rules::{CompletionMethod, counts_towards_completion, effective_method};

//
// ─── PROGRESS LOOKUP ───────────────────────────────────────────────────────────
//

/// Source of one learner's progress records, keyed by unit.
pub trait ProgressLookup {
    fn progress_for(&self, unit_id: UnitId) -> Option<&ProgressRecord>;
}

impl<S: BuildHasher> ProgressLookup for HashMap<UnitId, ProgressRecord, S> {
    fn progress_for(&self, unit_id: UnitId) -> Option<&ProgressRecord> {
        self.get(&unit_id)
    }
}

impl ProgressLookup for BTreeMap<UnitId, ProgressRecord> {
    fn progress_for(&self, unit_id: UnitId) -> Option<&ProgressRecord> {
        self.get(&unit_id)
    }
}

impl ProgressLookup for [ProgressRecord] {
    fn progress_for(&self, unit_id: UnitId) -> Option<&ProgressRecord> {
        self.iter().find(|record| record.unit_id == unit_id)
    }
}

impl ProgressLookup for Vec<ProgressRecord> {
    fn progress_for(&self, unit_id: UnitId) -> Option<&ProgressRecord> {
        self.as_slice().progress_for(unit_id)
    }
}

//
// ─── UNIT ──────────────────────────────────────────────────────────────────────
//

/// Binary completion of a single unit.
///
/// Non-counting units are always complete. Everything else reads the status
/// a grader or viewer already wrote; a missing record means incomplete.
#[must_use]
pub fn is_unit_complete(unit: &ContentUnit, progress: Option<&ProgressRecord>) -> bool {
    if effective_method(unit) == CompletionMethod::NotCounted {
        return true;
    }
    progress.is_some_and(ProgressRecord::is_completed)
}

//
// ─── SUMMARIES ─────────────────────────────────────────────────────────────────
//

/// Rolled-up completion of a page, chapter or course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub completed_count: usize,
    pub required_count: usize,
    pub total_count: usize,
    pub percentage: u8,
    pub is_complete: bool,
}

impl CompletionSummary {
    fn new(completed_count: usize, required_count: usize, total_count: usize, is_complete: bool) -> Self {
        Self {
            completed_count,
            required_count,
            total_count,
            percentage: percentage(completed_count, total_count),
            is_complete,
        }
    }
}

fn record_for<'a, P>(unit: &ContentUnit, progress: &'a P) -> Option<&'a ProgressRecord>
where
    P: ProgressLookup + ?Sized,
{
    let record = progress.progress_for(unit.id)?;
    if record.unit_id != unit.id {
        warn!(
            unit_id = %unit.id,
            record_unit_id = %record.unit_id,
            "ignoring progress record filed under the wrong unit"
        );
        return None;
    }
    Some(record)
}

/// Completion of a page from its counting units.
///
/// Non-required units move the percentage but never hold the page back.
/// Units whose content is malformed are left out of every count.
pub fn page_completion<P>(page: &Page, progress: &P) -> CompletionSummary
where
    P: ProgressLookup + ?Sized,
{
    let mut total = 0_usize;
    let mut required = 0_usize;
    let mut completed = 0_usize;
    let mut required_completed = 0_usize;

    for unit in page.units.iter().filter(|unit| counts_towards_completion(unit)) {
        if let Err(err) = unit.validate() {
            warn!(
                page_id = %page.id,
                unit_id = %unit.id,
                error = %err,
                "excluding malformed unit from page completion"
            );
            continue;
        }

        let done = is_unit_complete(unit, record_for(unit, progress));
        total += 1;
        if done {
            completed += 1;
        }
        if unit.is_required {
            required += 1;
            if done {
                required_completed += 1;
            }
        }
    }

    CompletionSummary::new(completed, required, total, required_completed == required)
}

/// Completion of a chapter from its pages' `is_complete`.
pub fn chapter_completion<P>(chapter: &Chapter, progress: &P) -> CompletionSummary
where
    P: ProgressLookup + ?Sized,
{
    let total = chapter.pages.len();
    let required = chapter.pages.iter().filter(|page| page.is_required).count();
    let completed = chapter
        .pages
        .iter()
        .filter(|page| page_completion(*page, progress).is_complete)
        .count();

    CompletionSummary::new(completed, required, total, completed == total)
}

/// Completion of a course from its chapters' `is_complete`.
pub fn course_completion<P>(course: &Course, progress: &P) -> CompletionSummary
where
    P: ProgressLookup + ?Sized,
{
    let total = course.chapters.len();
    let completed = course
        .chapters
        .iter()
        .filter(|chapter| chapter_completion(*chapter, progress).is_complete)
        .count();

    CompletionSummary::new(completed, total, total, completed == total)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Attempt, ChapterId, CourseId, LearnerId, PageId, ProgressStatus, QuizContent,
        UnitContent,
    };
    use crate::grading::AttemptOutcome;
    use crate::time::fixed_now;

    fn text(id: u64) -> ContentUnit {
        ContentUnit::new(UnitId::new(id), UnitContent::Text { body: "body".into() })
    }

    fn divider(id: u64) -> ContentUnit {
        ContentUnit::new(UnitId::new(id), UnitContent::Divider)
    }

    fn record(unit: u64, status: ProgressStatus) -> ProgressRecord {
        let mut record = ProgressRecord::start(LearnerId::new(1), UnitId::new(unit), fixed_now());
        record.status = status;
        record
    }

    fn done(units: &[u64]) -> HashMap<UnitId, ProgressRecord> {
        units
            .iter()
            .map(|id| (UnitId::new(*id), record(*id, ProgressStatus::Completed)))
            .collect()
    }

    #[test]
    fn non_counting_unit_is_complete_without_progress() {
        let unit = divider(1);
        assert!(is_unit_complete(&unit, None));
        assert!(is_unit_complete(&unit, Some(&record(1, ProgressStatus::NotStarted))));

        let thread = ContentUnit::new(
            UnitId::new(2),
            UnitContent::DiscussionThread { topic: "Q&A".into() },
        );
        assert!(is_unit_complete(&thread, None));
    }

    #[test]
    fn counting_unit_needs_completed_status() {
        let unit = text(1);
        assert!(!is_unit_complete(&unit, None));
        assert!(!is_unit_complete(&unit, Some(&record(1, ProgressStatus::InProgress))));
        assert!(is_unit_complete(&unit, Some(&record(1, ProgressStatus::Completed))));
    }

    #[test]
    fn page_without_counting_units_is_vacuously_complete() {
        let page = Page::new(PageId::new(1), "Break", vec![divider(1), divider(2)]).optional();
        let summary = page_completion(&page, &HashMap::<UnitId, ProgressRecord>::new());
        assert!(summary.is_complete);
        assert_eq!(summary.total_count, 0);
        assert_eq!(summary.percentage, 100);
    }

    #[test]
    fn page_with_only_optional_units_is_complete() {
        let page = Page::new(PageId::new(1), "Extras", vec![text(1).optional(), text(2).optional()]);
        let summary = page_completion(&page, &done(&[1]));
        assert!(summary.is_complete);
        assert_eq!(summary.required_count, 0);
        assert_eq!(summary.completed_count, 1);
        assert_eq!(summary.percentage, 50);
    }

    #[test]
    fn one_incomplete_required_unit_blocks_the_page() {
        let page = Page::new(
            PageId::new(1),
            "Lesson",
            vec![text(1), text(2), text(3).optional(), divider(4)],
        );

        let partial = page_completion(&page, &done(&[1, 3]));
        assert!(!partial.is_complete);
        assert_eq!(partial.total_count, 3);
        assert_eq!(partial.required_count, 2);
        assert_eq!(partial.completed_count, 2);
        assert_eq!(partial.percentage, 67);

        let full = page_completion(&page, &done(&[1, 2]));
        assert!(full.is_complete);
        assert_eq!(full.percentage, 67);
    }

    #[test]
    fn malformed_units_are_excluded_not_fatal() {
        let broken = ContentUnit::new(UnitId::new(9), UnitContent::MicroQuiz(QuizContent::new(Vec::new())));
        let page = Page::new(PageId::new(1), "Lesson", vec![text(1), broken]);

        let summary = page_completion(&page, &done(&[1]));
        assert_eq!(summary.total_count, 1);
        assert!(summary.is_complete);
    }

    #[test]
    fn misfiled_progress_is_ignored() {
        let mut lookup = HashMap::new();
        lookup.insert(UnitId::new(1), record(2, ProgressStatus::Completed));
        let page = Page::new(PageId::new(1), "Lesson", vec![text(1)]);
        assert!(!page_completion(&page, &lookup).is_complete);
    }

    #[test]
    fn progress_slices_work_as_lookups() {
        let page = Page::new(PageId::new(1), "Lesson", vec![text(1), text(2)]);
        let records = vec![
            record(1, ProgressStatus::Completed),
            record(2, ProgressStatus::Completed),
        ];
        assert!(page_completion(&page, records.as_slice()).is_complete);
    }

    fn course() -> Course {
        Course::new(
            CourseId::new(1),
            "Course",
            vec![
                Chapter::new(
                    ChapterId::new(1),
                    "One",
                    vec![
                        Page::new(PageId::new(1), "a", vec![text(1)]),
                        Page::new(PageId::new(2), "b", vec![text(2), text(3).optional()]),
                    ],
                ),
                Chapter::new(
                    ChapterId::new(2),
                    "Two",
                    vec![Page::new(PageId::new(3), "c", vec![text(4)]).optional()],
                ),
            ],
        )
    }

    #[test]
    fn chapter_is_strict_and_over_pages() {
        let course = course();
        let chapter = &course.chapters[0];

        let half = chapter_completion(chapter, &done(&[1]));
        assert!(!half.is_complete);
        assert_eq!(half.completed_count, 1);
        assert_eq!(half.total_count, 2);
        assert_eq!(half.percentage, 50);

        let full = chapter_completion(chapter, &done(&[1, 2]));
        assert!(full.is_complete);
        assert_eq!(full.percentage, 100);
    }

    #[test]
    fn course_requires_every_chapter() {
        let course = course();
        let summary = course_completion(&course, &done(&[1, 2, 3]));
        assert!(!summary.is_complete);
        assert_eq!(summary.completed_count, 1);
        assert_eq!(summary.percentage, 50);

        assert!(course_completion(&course, &done(&[1, 2, 4])).is_complete);
    }

    #[test]
    fn empty_course_is_vacuously_complete() {
        let course = Course::new(CourseId::new(1), "Empty", Vec::new());
        let summary = course_completion(&course, &HashMap::<UnitId, ProgressRecord>::new());
        assert!(summary.is_complete);
        assert_eq!(summary.percentage, 100);
    }

    #[test]
    fn course_calculation_is_idempotent() {
        let course = course();
        let progress = done(&[1, 2]);
        let first = course_completion(&course, &progress);
        let second = course_completion(&course, &progress);
        assert_eq!(first, second);
    }

    #[test]
    fn recorded_attempts_drive_completion() {
        let page = Page::new(PageId::new(1), "Lesson", vec![text(1)]);
        let mut progress = BTreeMap::new();
        let mut record = ProgressRecord::start(LearnerId::new(1), UnitId::new(1), fixed_now());
        record.record_attempt(
            Attempt::View {
                dwell_secs: 10,
                watched_percentage: None,
            },
            &AttemptOutcome::ungraded(true),
            fixed_now(),
        );
        progress.insert(UnitId::new(1), record);
        assert!(page_completion(&page, &progress).is_complete);
    }
}
