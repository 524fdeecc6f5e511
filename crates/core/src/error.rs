use thiserror::Error;

use crate::gate::GateError;
use crate::grading::GradingError;
use crate::model::{ContentError, SettingsError};
use crate::rules::RuleError;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Grading(#[from] GradingError),
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
