use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::PrimitiveDateTime;

/// A student's final exam attempt for one subject's final exam.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct FinalExamRecord {
    pub(crate) id: i64,
    pub(crate) student_id: i64,
    pub(crate) final_exam_id: i64,
    pub(crate) grade: Option<f64>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// A student's enrollment in a subject, carrying the two coursework-period
/// grade fields.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SubjectRecord {
    pub(crate) id: i64,
    pub(crate) student_id: i64,
    pub(crate) subject_id: i64,
    pub(crate) exam_grade: Option<f64>,
    pub(crate) coursework_grade: Option<f64>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// Listing row: final exam record joined with the student it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct FinalExamStudentRow {
    pub(crate) id: i64,
    pub(crate) student_id: i64,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) final_exam_id: i64,
    pub(crate) grade: Option<f64>,
}

/// Listing row: subject record joined with the student it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct SubjectStudentRow {
    pub(crate) id: i64,
    pub(crate) student_id: i64,
    pub(crate) first_name: String,
    pub(crate) last_name: String,
    pub(crate) subject_id: i64,
    pub(crate) exam_grade: Option<f64>,
    pub(crate) coursework_grade: Option<f64>,
}
