use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::Deserialize;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::validation;
use crate::core::state::AppState;
use crate::schemas::grades::{
    FinalExamRecordResponse, FinalExamStudentResponse, SpreadsheetUpload,
};
use crate::schemas::ApplicationResponse;
use crate::services::grading::FinalExamGradeUpdate;
use crate::services::spreadsheet;

pub(crate) const SHEET_ID_COLUMN: &str = "idUsuarioExamenFinal";
pub(crate) const SHEET_GRADE_COLUMN: &str = "calificacion";
const SHEET_COLUMNS: [&str; 3] = [SHEET_ID_COLUMN, "alumno", SHEET_GRADE_COLUMN];

#[derive(Debug, Deserialize)]
struct SubjectParams {
    #[serde(rename = "idMateria")]
    subject_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateParams {
    #[serde(rename = "idUsuarioExamenFinal")]
    record_id: Option<String>,
    #[serde(rename = "calificacion")]
    grade: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/alumnos", get(list_students))
        .route("/calificaciones", put(update_grade))
        .route("/notas-excel", get(export_grades).put(import_grades))
}

async fn list_students(
    Query(params): Query<SubjectParams>,
    State(state): State<AppState>,
) -> Result<Json<ApplicationResponse<Vec<FinalExamStudentResponse>>>, ApiError> {
    let subject_id = parse_subject_id(&params)?;

    let rows = state
        .final_exams()
        .list_students(subject_id)
        .await
        .map_err(|err| ApiError::internal(err, "Failed to list students by final exam"))?;

    let students = rows.into_iter().map(FinalExamStudentResponse::from_db).collect();
    Ok(Json(ApplicationResponse::ok(students)))
}

async fn update_grade(
    Query(params): Query<UpdateParams>,
    State(state): State<AppState>,
) -> Result<Json<ApplicationResponse<FinalExamRecordResponse>>, ApiError> {
    let record_id = validation::parse_id(
        "idUsuarioExamenFinal",
        validation::require_param("idUsuarioExamenFinal", params.record_id.as_ref())?,
    )?;
    let raw_grade = validation::require_param("calificacion", params.grade.as_ref())?;
    let grade =
        validation::parse_grade("calificacion", raw_grade).map_err(ApiError::BadRequest)?;

    let record = state.final_exams().update_grade(record_id, grade).await.map_err(|err| {
        ApiError::from_store(
            err,
            format!("final exam record {record_id} not found"),
            "Failed to update final exam grade",
        )
    })?;

    tracing::info!(record_id, grade, "Final exam grade updated");
    Ok(Json(ApplicationResponse::ok(FinalExamRecordResponse::from_db(record))))
}

async fn export_grades(
    Query(params): Query<SubjectParams>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let subject_id = parse_subject_id(&params)?;

    let exam_id = state
        .final_exams()
        .find_exam_for_subject(subject_id)
        .await
        .map_err(|err| ApiError::internal(err, "Failed to resolve final exam for subject"))?
        .ok_or_else(|| {
            ApiError::Decoding(format!("no final exam is linked to subject {subject_id}"))
        })?;

    let rows = state
        .final_exams()
        .list_students(subject_id)
        .await
        .map_err(|err| ApiError::internal(err, "Failed to list students by final exam"))?;

    let cells = rows.into_iter().map(|row| {
        vec![
            row.id.to_string(),
            format!("{}, {}", row.last_name, row.first_name),
            spreadsheet::grade_cell(row.grade),
        ]
    });
    let bytes = spreadsheet::write_sheet(&SHEET_COLUMNS, cells).map_err(ApiError::from_sheet)?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"notas-examen-final-{exam_id}.csv\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

async fn import_grades(
    State(state): State<AppState>,
    Json(payload): Json<SpreadsheetUpload>,
) -> Result<Json<ApplicationResponse<String>>, ApiError> {
    payload.validate().map_err(|err| ApiError::BadRequest(err.to_string()))?;

    let bytes = spreadsheet::decode_payload(&payload.excel).map_err(ApiError::from_sheet)?;
    let sheet_rows = spreadsheet::read_sheet(&bytes, SHEET_ID_COLUMN, &[SHEET_GRADE_COLUMN])
        .map_err(ApiError::from_sheet)?;

    let mut problems = Vec::new();
    let mut updates = Vec::new();
    for row in &sheet_rows {
        let raw_grade = row.grades[0].as_str();
        // Ungraded rows export with an empty grade cell; importing them
        // back leaves the record untouched.
        if raw_grade.is_empty() {
            continue;
        }

        let record_id = match row.record_id.parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                problems
                    .push(format!("row {}: {SHEET_ID_COLUMN} must be a valid identifier", row.row));
                None
            }
        };
        let grade = match validation::parse_grade(SHEET_GRADE_COLUMN, raw_grade) {
            Ok(value) => Some(value),
            Err(message) => {
                problems.push(format!("row {}: {message}", row.row));
                None
            }
        };

        if let (Some(record_id), Some(grade)) = (record_id, grade) {
            updates.push(FinalExamGradeUpdate { record_id, grade });
        }
    }

    if !problems.is_empty() {
        return Err(ApiError::Validation(problems));
    }

    let applied = state.final_exams().apply_grades(&updates).await.map_err(|err| {
        ApiError::from_store(
            err,
            "spreadsheet references final exam records that do not exist".to_string(),
            "Failed to apply imported final exam grades",
        )
    })?;

    tracing::info!(applied, "Final exam grades imported");
    Ok(Json(ApplicationResponse::ok(format!("{applied} grades updated"))))
}

fn parse_subject_id(params: &SubjectParams) -> Result<i64, ApiError> {
    validation::parse_id(
        "idMateria",
        validation::require_param("idMateria", params.subject_id.as_ref())?,
    )
}
