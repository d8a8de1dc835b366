use async_trait::async_trait;
use thiserror::Error;

use crate::db::models::{FinalExamRecord, FinalExamStudentRow, SubjectRecord, SubjectStudentRow};

#[derive(Debug, Error)]
pub(crate) enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct FinalExamGradeUpdate {
    pub(crate) record_id: i64,
    pub(crate) grade: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SubjectGradeUpdate {
    pub(crate) record_id: i64,
    pub(crate) exam_grade: f64,
    pub(crate) coursework_grade: f64,
}

/// Store backing the final-exam grading component. The batch operation is
/// all-or-nothing: either every referenced record is updated or none is.
#[async_trait]
pub(crate) trait FinalExamGrades: Send + Sync {
    async fn list_students(&self, subject_id: i64)
        -> Result<Vec<FinalExamStudentRow>, StoreError>;

    async fn update_grade(&self, record_id: i64, grade: f64)
        -> Result<FinalExamRecord, StoreError>;

    async fn apply_grades(&self, updates: &[FinalExamGradeUpdate]) -> Result<u64, StoreError>;

    async fn find_exam_for_subject(&self, subject_id: i64) -> Result<Option<i64>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Store backing the subject grading component.
#[async_trait]
pub(crate) trait SubjectGrades: Send + Sync {
    async fn list_students(&self, subject_id: i64) -> Result<Vec<SubjectStudentRow>, StoreError>;

    async fn update_grades(
        &self,
        record_id: i64,
        exam_grade: f64,
        coursework_grade: f64,
    ) -> Result<SubjectRecord, StoreError>;

    async fn apply_grades(&self, updates: &[SubjectGradeUpdate]) -> Result<u64, StoreError>;

    async fn subject_exists(&self, subject_id: i64) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}
