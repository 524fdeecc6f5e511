use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use course_core::{
    CompletionSummary, GateDecision, chapter_completion, course_completion, course_gate_decisions,
    is_page_accessible,
    model::{ChapterId, Course, CourseId, LearnerId, PageId, ProgressRecord, UnitId},
    page_completion,
};
use storage::repository::{CourseRepository, ProgressRepository};

use crate::error::NavigationError;

//
// ─── OUTLINE ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOutline {
    pub page_id: PageId,
    pub title: String,
    pub completion: CompletionSummary,
    pub gate: GateDecision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterOutline {
    pub chapter_id: ChapterId,
    pub title: String,
    pub completion: CompletionSummary,
    pub pages: Vec<PageOutline>,
}

/// A learner's view of a course: completion at every level plus page locks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOutline {
    pub course_id: CourseId,
    pub title: String,
    pub completion: CompletionSummary,
    pub chapters: Vec<ChapterOutline>,
}

impl CourseOutline {
    /// Build the outline from a course and the learner's progress.
    #[must_use]
    pub fn build(course: &Course, progress: &HashMap<UnitId, ProgressRecord>) -> Self {
        let mut gates = course_gate_decisions(course, progress).into_iter();

        let chapters = course
            .chapters
            .iter()
            .map(|chapter| ChapterOutline {
                chapter_id: chapter.id,
                title: chapter.title.clone(),
                completion: chapter_completion(chapter, progress),
                pages: chapter
                    .pages
                    .iter()
                    .zip(gates.by_ref())
                    .map(|(page, gate)| PageOutline {
                        page_id: page.id,
                        title: page.title.clone(),
                        completion: page_completion(page, progress),
                        gate,
                    })
                    .collect(),
            })
            .collect();

        Self {
            course_id: course.id,
            title: course.title.clone(),
            completion: course_completion(course, progress),
            chapters,
        }
    }

    pub fn pages(&self) -> impl Iterator<Item = &PageOutline> {
        self.chapters.iter().flat_map(|chapter| chapter.pages.iter())
    }
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Read-side queries for course navigation.
#[derive(Clone)]
pub struct NavigationService {
    courses: Arc<dyn CourseRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl NavigationService {
    #[must_use]
    pub fn new(courses: Arc<dyn CourseRepository>, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { courses, progress }
    }

    async fn load(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
    ) -> Result<(Course, HashMap<UnitId, ProgressRecord>), NavigationError> {
        let course = self.courses.get_course(course_id).await?;
        let records = self
            .progress
            .list_progress(learner_id, &course.unit_ids())
            .await?;
        let progress = records
            .into_iter()
            .map(|record| (record.unit_id, record))
            .collect();
        Ok((course, progress))
    }

    /// Completion and gate state for every chapter and page of a course.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Storage` if the course or progress cannot be loaded.
    pub async fn course_outline(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
    ) -> Result<CourseOutline, NavigationError> {
        let (course, progress) = self.load(learner_id, course_id).await?;
        Ok(CourseOutline::build(&course, &progress))
    }

    /// Whether the learner may open `page_id` now.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Gate` for a page outside the course, or
    /// `NavigationError::Storage` if loading fails.
    pub async fn can_open_page(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
        page_id: PageId,
    ) -> Result<bool, NavigationError> {
        let (course, progress) = self.load(learner_id, course_id).await?;
        Ok(is_page_accessible(&course, page_id, &progress)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_core::model::{Chapter, ContentUnit, Page, UnitContent};
    use course_core::time::fixed_now;

    fn page(id: u64, gated: bool) -> Page {
        let unit = ContentUnit::new(UnitId::new(id), UnitContent::Text { body: "x".into() });
        let page = Page::new(PageId::new(id), format!("Page {id}"), vec![unit]);
        if gated { page.gated() } else { page }
    }

    fn course() -> Course {
        Course::new(
            CourseId::new(1),
            "Outline",
            vec![
                Chapter::new(ChapterId::new(1), "One", vec![page(1, true), page(2, false)]),
                Chapter::new(ChapterId::new(2), "Two", vec![page(3, false)]),
            ],
        )
    }

    #[test]
    fn outline_lines_gates_up_with_pages() {
        let outline = CourseOutline::build(&course(), &HashMap::new());
        let locked: Vec<_> = outline.pages().map(|p| (p.page_id, p.gate.locked)).collect();
        assert_eq!(
            locked,
            vec![
                (PageId::new(1), false),
                (PageId::new(2), true),
                (PageId::new(3), true),
            ]
        );
        for page in outline.pages() {
            assert_eq!(page.gate.page_id, page.page_id);
        }
        assert_eq!(outline.completion.completed_count, 0);
        assert_eq!(outline.completion.total_count, 2);
    }

    #[test]
    fn outline_reflects_completed_units() {
        let mut record = ProgressRecord::start(LearnerId::new(1), UnitId::new(1), fixed_now());
        record.status = course_core::model::ProgressStatus::Completed;
        let progress = HashMap::from([(UnitId::new(1), record)]);

        let outline = CourseOutline::build(&course(), &progress);
        assert!(outline.pages().all(|p| !p.gate.locked));
        assert!(outline.chapters[0].pages[0].completion.is_complete);
        assert!(!outline.chapters[0].completion.is_complete);
        assert_eq!(outline.chapters[0].completion.percentage, 50);
    }
}
