use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::grading::AttemptOutcome;
use crate::model::attempt::Attempt;
use crate::model::ids::{LearnerId, UnitId};

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl ProgressStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProgressStatus::NotStarted => "not_started",
            ProgressStatus::InProgress => "in_progress",
            ProgressStatus::Completed => "completed",
        }
    }
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Per-(learner, unit) state derived from attempts.
///
/// This is the only source of truth for completion. `version` increases on
/// every write and is the compare-and-swap token used by repositories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub learner_id: LearnerId,
    pub unit_id: UnitId,
    pub status: ProgressStatus,
    pub attempts: u32,
    #[serde(default)]
    pub score: Option<u8>,
    #[serde(default)]
    pub max_score: Option<u8>,
    #[serde(default)]
    pub watched_percentage: Option<u8>,
    #[serde(default)]
    pub responses: Option<Attempt>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub version: u64,
}

impl ProgressRecord {
    /// Fresh record for a learner's first interaction with a unit.
    #[must_use]
    pub fn start(learner_id: LearnerId, unit_id: UnitId, now: DateTime<Utc>) -> Self {
        Self {
            learner_id,
            unit_id,
            status: ProgressStatus::NotStarted,
            attempts: 0,
            score: None,
            max_score: None,
            watched_percentage: None,
            responses: None,
            started_at: now,
            updated_at: now,
            completed_at: None,
            version: 0,
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == ProgressStatus::Completed
    }

    /// Fold one graded attempt into the record.
    ///
    /// The attempt counter and version always advance. A completed record
    /// stays completed; later attempts still refresh score and responses.
    pub fn record_attempt(&mut self, attempt: Attempt, outcome: &AttemptOutcome, now: DateTime<Utc>) {
        self.attempts = self.attempts.saturating_add(1);
        self.version = self.version.saturating_add(1);
        self.updated_at = now;

        if let Some(score) = outcome.score {
            self.score = Some(score.min(100));
            self.max_score = outcome.max_score;
        }

        if let Attempt::View {
            watched_percentage: Some(watched),
            ..
        } = &attempt
        {
            let watched = (*watched).min(100);
            self.watched_percentage = Some(self.watched_percentage.map_or(watched, |w| w.max(watched)));
        }

        if attempt.is_response() {
            self.responses = Some(attempt);
        }

        if outcome.completed && !self.is_completed() {
            self.status = ProgressStatus::Completed;
            self.completed_at = Some(now);
        } else if self.status == ProgressStatus::NotStarted {
            self.status = ProgressStatus::InProgress;
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn record() -> ProgressRecord {
        ProgressRecord::start(LearnerId::new(1), UnitId::new(10), fixed_now())
    }

    #[test]
    fn failed_attempt_moves_to_in_progress() {
        let mut progress = record();
        progress.record_attempt(
            Attempt::Reorder { order: vec![1, 0] },
            &AttemptOutcome::graded(false, 0),
            fixed_now(),
        );

        assert_eq!(progress.status, ProgressStatus::InProgress);
        assert_eq!(progress.attempts, 1);
        assert_eq!(progress.version, 1);
        assert_eq!(progress.score, Some(0));
        assert_eq!(progress.max_score, Some(100));
        assert!(progress.completed_at.is_none());
    }

    #[test]
    fn completion_is_sticky_across_later_attempts() {
        let mut progress = record();
        let done_at = fixed_now();
        progress.record_attempt(
            Attempt::Reorder { order: vec![0, 1] },
            &AttemptOutcome::graded(true, 100),
            done_at,
        );
        progress.record_attempt(
            Attempt::Reorder { order: vec![1, 0] },
            &AttemptOutcome::graded(false, 0),
            done_at + Duration::minutes(5),
        );

        assert_eq!(progress.status, ProgressStatus::Completed);
        assert_eq!(progress.completed_at, Some(done_at));
        assert_eq!(progress.attempts, 2);
        assert_eq!(progress.score, Some(0));
        assert_eq!(
            progress.responses,
            Some(Attempt::Reorder { order: vec![1, 0] })
        );
    }

    #[test]
    fn view_events_track_highest_watch_without_storing_responses() {
        let mut progress = record();
        for watched in [40, 85, 60] {
            progress.record_attempt(
                Attempt::View {
                    dwell_secs: 30,
                    watched_percentage: Some(watched),
                },
                &AttemptOutcome::ungraded(false),
                fixed_now(),
            );
        }

        assert_eq!(progress.watched_percentage, Some(85));
        assert!(progress.responses.is_none());
        assert!(progress.score.is_none());
        assert_eq!(progress.attempts, 3);
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&ProgressStatus::NotStarted).unwrap();
        assert_eq!(json, "\"not_started\"");
        assert_eq!(ProgressStatus::InProgress.as_str(), "in_progress");
    }
}
