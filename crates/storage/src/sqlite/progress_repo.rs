use course_core::model::{LearnerId, ProgressRecord, UnitId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, map_progress_row, responses_to_json, ser, u64_to_i64};
use crate::repository::{ProgressRepository, StorageError};

const PROGRESS_COLUMNS: &str = "learner_id, unit_id, status, attempts, score, max_score, \
     watched_percentage, responses, started_at, updated_at, completed_at, version";

impl SqliteRepository {
    async fn stored_version(
        &self,
        learner_id: LearnerId,
        unit_id: UnitId,
    ) -> Result<Option<u64>, StorageError> {
        let row = sqlx::query(
            "SELECT version FROM unit_progress WHERE learner_id = ?1 AND unit_id = ?2",
        )
        .bind(u64_to_i64("learner_id", learner_id.value())?)
        .bind(u64_to_i64("unit_id", unit_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.map(|row| {
            let version: i64 = row.try_get("version").map_err(ser)?;
            u64::try_from(version)
                .map_err(|_| StorageError::Serialization("version sign overflow".into()))
        })
        .transpose()
    }
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn get_progress(
        &self,
        learner_id: LearnerId,
        unit_id: UnitId,
    ) -> Result<Option<ProgressRecord>, StorageError> {
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM unit_progress WHERE learner_id = ?1 AND unit_id = ?2"
        );
        let row = sqlx::query(&sql)
            .bind(u64_to_i64("learner_id", learner_id.value())?)
            .bind(u64_to_i64("unit_id", unit_id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.as_ref().map(map_progress_row).transpose()
    }

    async fn list_progress(
        &self,
        learner_id: LearnerId,
        unit_ids: &[UnitId],
    ) -> Result<Vec<ProgressRecord>, StorageError> {
        if unit_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Bound parameters: ?1 is the learner, the unit ids follow.
        let placeholders = (2..=unit_ids.len() + 1)
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT {PROGRESS_COLUMNS} FROM unit_progress \
             WHERE learner_id = ?1 AND unit_id IN ({placeholders}) \
             ORDER BY unit_id ASC"
        );

        let mut query = sqlx::query(&sql).bind(u64_to_i64("learner_id", learner_id.value())?);
        for unit_id in unit_ids {
            query = query.bind(u64_to_i64("unit_id", unit_id.value())?);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(conn)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(map_progress_row(&row)?);
        }
        Ok(records)
    }

    async fn save_progress(
        &self,
        record: &ProgressRecord,
        expected_version: Option<u64>,
    ) -> Result<(), StorageError> {
        let learner_id = u64_to_i64("learner_id", record.learner_id.value())?;
        let unit_id = u64_to_i64("unit_id", record.unit_id.value())?;
        let attempts = i64::from(record.attempts);
        let score = record.score.map(i64::from);
        let max_score = record.max_score.map(i64::from);
        let watched = record.watched_percentage.map(i64::from);
        let responses = responses_to_json(record.responses.as_ref())?;
        let version = u64_to_i64("version", record.version)?;

        let result = match expected_version {
            None => {
                sqlx::query(
                    r"
                    INSERT INTO unit_progress (learner_id, unit_id, status, attempts, score, max_score,
                        watched_percentage, responses, started_at, updated_at, completed_at, version)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                    ON CONFLICT(learner_id, unit_id) DO NOTHING
                    ",
                )
                .bind(learner_id)
                .bind(unit_id)
                .bind(record.status.as_str())
                .bind(attempts)
                .bind(score)
                .bind(max_score)
                .bind(watched)
                .bind(responses)
                .bind(record.started_at)
                .bind(record.updated_at)
                .bind(record.completed_at)
                .bind(version)
                .execute(&self.pool)
                .await
            }
            Some(expected) => {
                sqlx::query(
                    r"
                    UPDATE unit_progress SET
                        status = ?3,
                        attempts = ?4,
                        score = ?5,
                        max_score = ?6,
                        watched_percentage = ?7,
                        responses = ?8,
                        started_at = ?9,
                        updated_at = ?10,
                        completed_at = ?11,
                        version = ?12
                    WHERE learner_id = ?1 AND unit_id = ?2 AND version = ?13
                    ",
                )
                .bind(learner_id)
                .bind(unit_id)
                .bind(record.status.as_str())
                .bind(attempts)
                .bind(score)
                .bind(max_score)
                .bind(watched)
                .bind(responses)
                .bind(record.started_at)
                .bind(record.updated_at)
                .bind(record.completed_at)
                .bind(version)
                .bind(u64_to_i64("expected_version", expected)?)
                .execute(&self.pool)
                .await
            }
        }
        .map_err(conn)?;

        if result.rows_affected() == 0 {
            let found = self.stored_version(record.learner_id, record.unit_id).await?;
            return Err(StorageError::Conflict {
                expected: expected_version,
                found,
            });
        }
        Ok(())
    }
}
