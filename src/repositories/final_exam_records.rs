use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::time::primitive_now_utc;
use crate::db::models::{FinalExamRecord, FinalExamStudentRow};
use crate::services::grading::{FinalExamGradeUpdate, FinalExamGrades, StoreError};

const COLUMNS: &str = "id, student_id, final_exam_id, grade, created_at, updated_at";

pub(crate) struct PgFinalExamGrades {
    pool: PgPool,
}

impl PgFinalExamGrades {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FinalExamGrades for PgFinalExamGrades {
    async fn list_students(
        &self,
        subject_id: i64,
    ) -> Result<Vec<FinalExamStudentRow>, StoreError> {
        let rows = sqlx::query_as::<_, FinalExamStudentRow>(
            "SELECT sfe.id, sfe.student_id, s.first_name, s.last_name,
                    sfe.final_exam_id, sfe.grade
             FROM student_final_exams sfe
             JOIN students s ON s.id = sfe.student_id
             JOIN final_exams fe ON fe.id = sfe.final_exam_id
             WHERE fe.subject_id = $1
             ORDER BY s.last_name, s.first_name",
        )
        .bind(subject_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list students by final exam")?;

        Ok(rows)
    }

    async fn update_grade(
        &self,
        record_id: i64,
        grade: f64,
    ) -> Result<FinalExamRecord, StoreError> {
        let updated = sqlx::query_as::<_, FinalExamRecord>(&format!(
            "UPDATE student_final_exams
             SET grade = $1, updated_at = $2
             WHERE id = $3
             RETURNING {COLUMNS}"
        ))
        .bind(grade)
        .bind(primitive_now_utc())
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update final exam grade")?;

        updated.ok_or(StoreError::NotFound)
    }

    async fn apply_grades(&self, updates: &[FinalExamGradeUpdate]) -> Result<u64, StoreError> {
        let mut tx =
            self.pool.begin().await.context("failed to begin grade import transaction")?;
        let now = primitive_now_utc();

        for update in updates {
            let result = sqlx::query(
                "UPDATE student_final_exams SET grade = $1, updated_at = $2 WHERE id = $3",
            )
            .bind(update.grade)
            .bind(now)
            .bind(update.record_id)
            .execute(&mut *tx)
            .await
            .context("failed to apply imported final exam grade")?;

            // Dropping the transaction without commit rolls back every
            // update applied so far.
            if result.rows_affected() == 0 {
                return Err(StoreError::NotFound);
            }
        }

        tx.commit().await.context("failed to commit grade import transaction")?;
        Ok(updates.len() as u64)
    }

    async fn find_exam_for_subject(&self, subject_id: i64) -> Result<Option<i64>, StoreError> {
        let exam_id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM final_exams WHERE subject_id = $1 LIMIT 1")
                .bind(subject_id)
                .fetch_optional(&self.pool)
                .await
                .context("failed to resolve final exam for subject")?;

        Ok(exam_id)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("database ping failed")?;
        Ok(())
    }
}
