#![forbid(unsafe_code)]

pub mod completion;
pub mod error;
pub mod gate;
pub mod grading;
pub mod model;
pub mod rules;
pub mod time;

pub use completion::{
    CompletionSummary, ProgressLookup, chapter_completion, course_completion, is_unit_complete,
    page_completion,
};
pub use error::Error;
pub use gate::{GateDecision, GateError, course_gate_decisions, gate_decisions, is_page_accessible, is_page_locked};
pub use grading::{AttemptOutcome, GradingError, evaluate_attempt};
pub use rules::{CompletionMethod, CompletionRule, RuleError, rule_for};
pub use time::Clock;
