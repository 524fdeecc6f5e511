use chrono::Utc;
use course_core::model::{Course, CourseId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser, u64_to_i64};
use crate::repository::{CourseRepository, StorageError};

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let document = serde_json::to_string(course).map_err(ser)?;

        sqlx::query(
            r"
            INSERT INTO courses (id, title, document, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                document = excluded.document,
                updated_at = excluded.updated_at
            ",
        )
        .bind(u64_to_i64("course_id", course.id.value())?)
        .bind(course.title.as_str())
        .bind(document)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_course(&self, id: CourseId) -> Result<Course, StorageError> {
        let row = sqlx::query("SELECT document FROM courses WHERE id = ?1")
            .bind(u64_to_i64("course_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;

        let document: String = row.try_get("document").map_err(ser)?;
        serde_json::from_str(&document).map_err(ser)
    }
}
