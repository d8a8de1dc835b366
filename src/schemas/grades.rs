use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::db::models::{FinalExamRecord, FinalExamStudentRow, SubjectRecord, SubjectStudentRow};

// Wire field names stay aligned with the upstream Spanish API contract.

#[derive(Debug, Serialize)]
pub(crate) struct FinalExamStudentResponse {
    pub(crate) id: i64,
    #[serde(rename = "idAlumno")]
    pub(crate) student_id: i64,
    #[serde(rename = "nombre")]
    pub(crate) first_name: String,
    #[serde(rename = "apellido")]
    pub(crate) last_name: String,
    #[serde(rename = "calificacion")]
    pub(crate) grade: Option<f64>,
}

impl FinalExamStudentResponse {
    pub(crate) fn from_db(row: FinalExamStudentRow) -> Self {
        Self {
            id: row.id,
            student_id: row.student_id,
            first_name: row.first_name,
            last_name: row.last_name,
            grade: row.grade,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct FinalExamRecordResponse {
    pub(crate) id: i64,
    #[serde(rename = "idAlumno")]
    pub(crate) student_id: i64,
    #[serde(rename = "idExamenFinal")]
    pub(crate) final_exam_id: i64,
    #[serde(rename = "calificacion")]
    pub(crate) grade: Option<f64>,
}

impl FinalExamRecordResponse {
    pub(crate) fn from_db(record: FinalExamRecord) -> Self {
        Self {
            id: record.id,
            student_id: record.student_id,
            final_exam_id: record.final_exam_id,
            grade: record.grade,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectStudentResponse {
    pub(crate) id: i64,
    #[serde(rename = "idAlumno")]
    pub(crate) student_id: i64,
    #[serde(rename = "nombre")]
    pub(crate) first_name: String,
    #[serde(rename = "apellido")]
    pub(crate) last_name: String,
    #[serde(rename = "calificacionExamen")]
    pub(crate) exam_grade: Option<f64>,
    #[serde(rename = "calificacionTps")]
    pub(crate) coursework_grade: Option<f64>,
}

impl SubjectStudentResponse {
    pub(crate) fn from_db(row: SubjectStudentRow) -> Self {
        Self {
            id: row.id,
            student_id: row.student_id,
            first_name: row.first_name,
            last_name: row.last_name,
            exam_grade: row.exam_grade,
            coursework_grade: row.coursework_grade,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectRecordResponse {
    pub(crate) id: i64,
    #[serde(rename = "idAlumno")]
    pub(crate) student_id: i64,
    #[serde(rename = "idMateria")]
    pub(crate) subject_id: i64,
    #[serde(rename = "calificacionExamen")]
    pub(crate) exam_grade: Option<f64>,
    #[serde(rename = "calificacionTps")]
    pub(crate) coursework_grade: Option<f64>,
}

impl SubjectRecordResponse {
    pub(crate) fn from_db(record: SubjectRecord) -> Self {
        Self {
            id: record.id,
            student_id: record.student_id,
            subject_id: record.subject_id,
            exam_grade: record.exam_grade,
            coursework_grade: record.coursework_grade,
        }
    }
}

/// Import body: the spreadsheet bytes, base64 encoded.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SpreadsheetUpload {
    #[validate(length(min = 1, message = "excel must not be empty"))]
    pub(crate) excel: String,
}
