#![forbid(unsafe_code)]

pub mod error;
pub mod navigation_service;
pub mod progress_service;

pub use course_core::Clock;

pub use error::{NavigationError, ProgressServiceError};
pub use navigation_service::{ChapterOutline, CourseOutline, NavigationService, PageOutline};
pub use progress_service::{ProgressService, SubmissionResult};
