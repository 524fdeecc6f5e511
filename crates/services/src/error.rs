//! Shared error types for the services crate.

use thiserror::Error;

use course_core::gate::GateError;
use course_core::grading::GradingError;
use course_core::model::{CourseId, UnitId};
use storage::repository::StorageError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("unit {unit} is not part of course {course}")]
    UnknownUnit { course: CourseId, unit: UnitId },
    #[error("progress write kept conflicting after {attempts} attempts")]
    WriteConflict { attempts: u32 },
    #[error(transparent)]
    Grading(#[from] GradingError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `NavigationService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NavigationError {
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
