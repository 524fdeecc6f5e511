use std::sync::Arc;

use tracing::{debug, warn};

use course_core::{
    evaluate_attempt,
    grading::AttemptOutcome,
    model::{Attempt, CompletionSettings, CourseId, LearnerId, ProgressRecord, UnitId},
    time::Clock,
};
use storage::repository::{CourseRepository, ProgressRepository, StorageError};

use crate::error::ProgressServiceError;

/// What a submission did: the grader's verdict and the stored record.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionResult {
    pub outcome: AttemptOutcome,
    pub progress: ProgressRecord,
}

/// Grades learner attempts and folds them into stored progress.
pub struct ProgressService {
    clock: Clock,
    settings: CompletionSettings,
    courses: Arc<dyn CourseRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            settings: CompletionSettings::default(),
            courses,
            progress,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: CompletionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Grade `attempt` against the unit and persist the resulting progress.
    ///
    /// The write is a compare-and-swap on the record's version. On a
    /// conflict the record is reloaded and the attempt is applied again, up
    /// to `max_write_retries` tries in total.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::UnknownUnit` if the unit is not in the
    /// course, `Grading` if the attempt cannot be graded, `WriteConflict` if
    /// every try lost the race, and `Storage` for backend failures.
    pub async fn submit_attempt(
        &self,
        learner_id: LearnerId,
        course_id: CourseId,
        unit_id: UnitId,
        attempt: Attempt,
    ) -> Result<SubmissionResult, ProgressServiceError> {
        let course = self.courses.get_course(course_id).await?;
        let unit = course
            .find_unit(unit_id)
            .ok_or(ProgressServiceError::UnknownUnit {
                course: course_id,
                unit: unit_id,
            })?;

        let outcome = evaluate_attempt(unit, &attempt, &self.settings)?;
        debug!(
            learner_id = %learner_id,
            unit_id = %unit_id,
            completed = outcome.completed,
            score = ?outcome.score,
            "graded attempt"
        );

        let max_tries = self.settings.max_write_retries();
        for attempt_no in 1..=max_tries {
            let now = self.clock.now();
            let existing = self.progress.get_progress(learner_id, unit_id).await?;
            let expected = existing.as_ref().map(|record| record.version);
            let mut record =
                existing.unwrap_or_else(|| ProgressRecord::start(learner_id, unit_id, now));
            record.record_attempt(attempt.clone(), &outcome, now);

            match self.progress.save_progress(&record, expected).await {
                Ok(()) => {
                    return Ok(SubmissionResult {
                        outcome,
                        progress: record,
                    });
                }
                Err(StorageError::Conflict { expected, found }) => {
                    warn!(
                        learner_id = %learner_id,
                        unit_id = %unit_id,
                        attempt_no,
                        ?expected,
                        ?found,
                        "progress write conflicted, retrying"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(ProgressServiceError::WriteConflict {
            attempts: max_tries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use course_core::model::{
        Chapter, ChapterId, ContentUnit, Course, CompletionSettingsDraft, Page, PageId,
        ProgressStatus, UnitContent,
    };
    use course_core::time::fixed_now;
    use std::sync::Mutex;
    use storage::repository::InMemoryRepository;

    fn course() -> Course {
        Course::new(
            CourseId::new(1),
            "Course",
            vec![Chapter::new(
                ChapterId::new(1),
                "Chapter",
                vec![Page::new(
                    PageId::new(1),
                    "Page",
                    vec![ContentUnit::new(
                        UnitId::new(1),
                        UnitContent::Text { body: "Read".into() },
                    )],
                )],
            )],
        )
    }

    fn view(dwell_secs: u32) -> Attempt {
        Attempt::View {
            dwell_secs,
            watched_percentage: None,
        }
    }

    /// Progress store that reports a conflict for the first `remaining` saves.
    struct Contended {
        inner: InMemoryRepository,
        remaining: Mutex<u32>,
    }

    #[async_trait]
    impl ProgressRepository for Contended {
        async fn get_progress(
            &self,
            learner_id: LearnerId,
            unit_id: UnitId,
        ) -> Result<Option<ProgressRecord>, StorageError> {
            self.inner.get_progress(learner_id, unit_id).await
        }

        async fn list_progress(
            &self,
            learner_id: LearnerId,
            unit_ids: &[UnitId],
        ) -> Result<Vec<ProgressRecord>, StorageError> {
            self.inner.list_progress(learner_id, unit_ids).await
        }

        async fn save_progress(
            &self,
            record: &ProgressRecord,
            expected_version: Option<u64>,
        ) -> Result<(), StorageError> {
            {
                let mut remaining = self.remaining.lock().unwrap();
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(StorageError::Conflict {
                        expected: expected_version,
                        found: Some(99),
                    });
                }
            }
            self.inner.save_progress(record, expected_version).await
        }
    }

    async fn service_with(progress: Arc<dyn ProgressRepository>) -> ProgressService {
        let courses = InMemoryRepository::new();
        courses.upsert_course(&course()).await.unwrap();
        ProgressService::new(Clock::fixed(fixed_now()), Arc::new(courses), progress)
    }

    #[tokio::test]
    async fn short_dwell_is_recorded_but_incomplete() {
        let service = service_with(Arc::new(InMemoryRepository::new())).await;
        let result = service
            .submit_attempt(LearnerId::new(1), CourseId::new(1), UnitId::new(1), view(1))
            .await
            .unwrap();
        assert!(!result.outcome.completed);
        assert_eq!(result.progress.status, ProgressStatus::InProgress);
        assert_eq!(result.progress.version, 1);
    }

    #[tokio::test]
    async fn retries_after_conflict() {
        let repo = Arc::new(Contended {
            inner: InMemoryRepository::new(),
            remaining: Mutex::new(2),
        });
        let service = service_with(repo.clone()).await;
        let result = service
            .submit_attempt(LearnerId::new(1), CourseId::new(1), UnitId::new(1), view(30))
            .await
            .unwrap();
        assert_eq!(result.progress.status, ProgressStatus::Completed);
        assert_eq!(result.progress.completed_at, Some(fixed_now()));
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let repo = Arc::new(Contended {
            inner: InMemoryRepository::new(),
            remaining: Mutex::new(10),
        });
        let settings = CompletionSettingsDraft {
            max_write_retries: Some(2),
            ..CompletionSettingsDraft::default()
        }
        .validate()
        .unwrap();
        let service = service_with(repo).await.with_settings(settings);
        let err = service
            .submit_attempt(LearnerId::new(1), CourseId::new(1), UnitId::new(1), view(30))
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressServiceError::WriteConflict { attempts: 2 }));
    }

    #[tokio::test]
    async fn unknown_unit_is_rejected() {
        let service = service_with(Arc::new(InMemoryRepository::new())).await;
        let err = service
            .submit_attempt(LearnerId::new(1), CourseId::new(1), UnitId::new(9), view(30))
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressServiceError::UnknownUnit { .. }));
    }
}
