mod attempt;
mod ids;
mod progress;
mod quiz;
mod reorder;
mod settings;
mod structure;
mod unit;

pub use attempt::Attempt;
pub use ids::{ChapterId, CourseId, LearnerId, PageId, ParseIdError, QuestionId, UnitId};
pub use progress::{ProgressRecord, ProgressStatus};
pub use quiz::{DEFAULT_PASS_MARK, Question, QuestionKind, QuizAnswer, QuizCompletionRule, QuizContent};
pub use reorder::{OrderingScoring, ReorderContent};
pub use settings::{CompletionSettings, CompletionSettingsDraft, SettingsError};
pub use structure::{Chapter, Course, Page};
pub use unit::{ContentError, ContentUnit, ReflectionContent, UnitContent, UnitType};
