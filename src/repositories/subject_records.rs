use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::time::primitive_now_utc;
use crate::db::models::{SubjectRecord, SubjectStudentRow};
use crate::services::grading::{StoreError, SubjectGradeUpdate, SubjectGrades};

const COLUMNS: &str =
    "id, student_id, subject_id, exam_grade, coursework_grade, created_at, updated_at";

pub(crate) struct PgSubjectGrades {
    pool: PgPool,
}

impl PgSubjectGrades {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubjectGrades for PgSubjectGrades {
    async fn list_students(&self, subject_id: i64) -> Result<Vec<SubjectStudentRow>, StoreError> {
        let rows = sqlx::query_as::<_, SubjectStudentRow>(
            "SELECT ss.id, ss.student_id, s.first_name, s.last_name,
                    ss.subject_id, ss.exam_grade, ss.coursework_grade
             FROM student_subjects ss
             JOIN students s ON s.id = ss.student_id
             WHERE ss.subject_id = $1
             ORDER BY s.last_name, s.first_name",
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list students by subject")?;

        Ok(rows)
    }

    async fn update_grades(
        &self,
        record_id: i64,
        exam_grade: f64,
        coursework_grade: f64,
    ) -> Result<SubjectRecord, StoreError> {
        let updated = sqlx::query_as::<_, SubjectRecord>(&format!(
            "UPDATE student_subjects
             SET exam_grade = $1, coursework_grade = $2, updated_at = $3
             WHERE id = $4
             RETURNING {COLUMNS}"
        ))
        .bind(exam_grade)
        .bind(coursework_grade)
        .bind(primitive_now_utc())
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update subject grades")?;

        updated.ok_or(StoreError::NotFound)
    }

    async fn apply_grades(&self, updates: &[SubjectGradeUpdate]) -> Result<u64, StoreError> {
        let mut tx =
            self.pool.begin().await.context("failed to begin grade import transaction")?;
        let now = primitive_now_utc();

        for update in updates {
            let result = sqlx::query(
                "UPDATE student_subjects
                 SET exam_grade = $1, coursework_grade = $2, updated_at = $3
                 WHERE id = $4",
            )
            .bind(update.exam_grade)
            .bind(update.coursework_grade)
            .bind(now)
            .bind(update.record_id)
            .execute(&mut *tx)
            .await
            .context("failed to apply imported subject grades")?;

            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound);
            }
        }

        tx.commit().await.context("failed to commit grade import transaction")?;
        Ok(updates.len() as u64)
    }

    async fn subject_exists(&self, subject_id: i64) -> Result<bool, StoreError> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM subjects WHERE id = $1")
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await
            .context("failed to resolve subject")?;

        Ok(found.is_some())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("database ping failed")?;
        Ok(())
    }
}
