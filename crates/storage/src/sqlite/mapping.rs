use course_core::model::{Attempt, LearnerId, ProgressRecord, ProgressStatus, UnitId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn percent_from_i64(field: &'static str, v: Option<i64>) -> Result<Option<u8>, StorageError> {
    v.map(|raw| {
        u8::try_from(raw)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| StorageError::Serialization(format!("invalid {field}: {raw}")))
    })
    .transpose()
}

pub(crate) fn parse_status(s: &str) -> Result<ProgressStatus, StorageError> {
    match s {
        "not_started" => Ok(ProgressStatus::NotStarted),
        "in_progress" => Ok(ProgressStatus::InProgress),
        "completed" => Ok(ProgressStatus::Completed),
        _ => Err(StorageError::Serialization(format!("invalid status: {s}"))),
    }
}

pub(crate) fn responses_to_json(responses: Option<&Attempt>) -> Result<Option<String>, StorageError> {
    responses.map(serde_json::to_string).transpose().map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<ProgressRecord, StorageError> {
    let status: String = row.try_get("status").map_err(ser)?;
    let attempts: i64 = row.try_get("attempts").map_err(ser)?;
    let responses = row
        .try_get::<Option<String>, _>("responses")
        .map_err(ser)?
        .map(|raw| serde_json::from_str::<Attempt>(&raw))
        .transpose()
        .map_err(ser)?;

    Ok(ProgressRecord {
        learner_id: LearnerId::new(i64_to_u64(
            "learner_id",
            row.try_get("learner_id").map_err(ser)?,
        )?),
        unit_id: UnitId::new(i64_to_u64("unit_id", row.try_get("unit_id").map_err(ser)?)?),
        status: parse_status(&status)?,
        attempts: u32::try_from(attempts)
            .map_err(|_| StorageError::Serialization(format!("invalid attempts: {attempts}")))?,
        score: percent_from_i64("score", row.try_get("score").map_err(ser)?)?,
        max_score: percent_from_i64("max_score", row.try_get("max_score").map_err(ser)?)?,
        watched_percentage: percent_from_i64(
            "watched_percentage",
            row.try_get("watched_percentage").map_err(ser)?,
        )?,
        responses,
        started_at: row.try_get("started_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
        completed_at: row.try_get("completed_at").map_err(ser)?,
        version: i64_to_u64("version", row.try_get("version").map_err(ser)?)?,
    })
}
