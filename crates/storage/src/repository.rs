use async_trait::async_trait;
use course_core::model::{Course, CourseId, LearnerId, ProgressRecord, UnitId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    /// The stored progress version did not match the caller's expectation.
    #[error("version conflict: expected {expected:?}, found {found:?}")]
    Conflict {
        expected: Option<u64>,
        found: Option<u64>,
    },

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Repository contract for authored course documents.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Persist or replace a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Fetch a course by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_course(&self, id: CourseId) -> Result<Course, StorageError>;
}

/// Repository contract for per-learner unit progress.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Fetch the record for one learner and unit, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn get_progress(
        &self,
        learner_id: LearnerId,
        unit_id: UnitId,
    ) -> Result<Option<ProgressRecord>, StorageError>;

    /// Fetch every stored record for a learner among `unit_ids`.
    ///
    /// Units without a record are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_progress(
        &self,
        learner_id: LearnerId,
        unit_ids: &[UnitId],
    ) -> Result<Vec<ProgressRecord>, StorageError>;

    /// Compare-and-swap write of a progress record.
    ///
    /// `expected_version` is the version the caller loaded, or `None` when
    /// the caller believes no record exists yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the stored version differs from
    /// `expected_version`, or other storage errors.
    async fn save_progress(
        &self,
        record: &ProgressRecord,
        expected_version: Option<u64>,
    ) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
    progress: Arc<Mutex<HashMap<(LearnerId, UnitId), ProgressRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let mut guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(course.id, course.clone());
        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Course, StorageError> {
        let guard = self
            .courses
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.get(&id).cloned().ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn get_progress(
        &self,
        learner_id: LearnerId,
        unit_id: UnitId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&(learner_id, unit_id)).cloned())
    }

    async fn list_progress(
        &self,
        learner_id: LearnerId,
        unit_ids: &[UnitId],
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(unit_ids
            .iter()
            .filter_map(|unit_id| guard.get(&(learner_id, *unit_id)).cloned())
            .collect())
    }

    async fn save_progress(
        &self,
        record: &ProgressRecord,
        expected_version: Option<u64>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let key = (record.learner_id, record.unit_id);
        let found = guard.get(&key).map(|existing| existing.version);
        if found != expected_version {
            return Err(StorageError::Conflict {
                expected: expected_version,
                found,
            });
        }
        guard.insert(key, record.clone());
        Ok(())
    }
}

/// Aggregates course and progress repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub courses: Arc<dyn CourseRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let courses: Arc<dyn CourseRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self { courses, progress }
    }
}
