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
use crate::schemas::grades::{SpreadsheetUpload, SubjectRecordResponse, SubjectStudentResponse};
use crate::schemas::ApplicationResponse;
use crate::services::grading::SubjectGradeUpdate;
use crate::services::spreadsheet;

pub(crate) const SHEET_ID_COLUMN: &str = "idUsuarioMateria";
pub(crate) const SHEET_EXAM_COLUMN: &str = "calificacionExamen";
pub(crate) const SHEET_COURSEWORK_COLUMN: &str = "calificacionTps";
const SHEET_COLUMNS: [&str; 4] =
    [SHEET_ID_COLUMN, "alumno", SHEET_EXAM_COLUMN, SHEET_COURSEWORK_COLUMN];

#[derive(Debug, Deserialize)]
struct SubjectParams {
    #[serde(rename = "idMateria")]
    subject_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateParams {
    #[serde(rename = "idUsuarioMateria")]
    record_id: Option<String>,
    #[serde(rename = "calificacionExamen")]
    exam_grade: Option<String>,
    #[serde(rename = "calificacionTps")]
    coursework_grade: Option<String>,
}

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/alumnos", get(list_students))
        .route("/calificaciones", put(update_grades))
        .route("/notas-excel", get(export_grades).put(import_grades))
}

async fn list_students(
    Query(params): Query<SubjectParams>,
    State(state): State<AppState>,
) -> Result<Json<ApplicationResponse<Vec<SubjectStudentResponse>>>, ApiError> {
    let subject_id = parse_subject_id(&params)?;

    let rows = state
        .subjects()
        .list_students(subject_id)
        .await
        .map_err(|err| ApiError::internal(err, "Failed to list students by subject"))?;

    let students = rows.into_iter().map(SubjectStudentResponse::from_db).collect();
    Ok(Json(ApplicationResponse::ok(students)))
}

/// Both grade fields are validated before the store is touched; every
/// violated field is reported, not just the first one.
async fn update_grades(
    Query(params): Query<UpdateParams>,
    State(state): State<AppState>,
) -> Result<Json<ApplicationResponse<SubjectRecordResponse>>, ApiError> {
    let record_id = validation::parse_id(
        "idUsuarioMateria",
        validation::require_param("idUsuarioMateria", params.record_id.as_ref())?,
    )?;

    let mut problems = Vec::new();
    let exam_grade = parse_grade_param(
        "calificacionExamen",
        params.exam_grade.as_ref(),
        &mut problems,
    );
    let coursework_grade = parse_grade_param(
        "calificacionTps",
        params.coursework_grade.as_ref(),
        &mut problems,
    );

    let (Some(exam_grade), Some(coursework_grade)) = (exam_grade, coursework_grade) else {
        return Err(ApiError::Validation(problems));
    };

    let record = state
        .subjects()
        .update_grades(record_id, exam_grade, coursework_grade)
        .await
        .map_err(|err| {
            ApiError::from_store(
                err,
                format!("subject record {record_id} not found"),
                "Failed to update subject grades",
            )
        })?;

    tracing::info!(record_id, exam_grade, coursework_grade, "Subject grades updated");
    Ok(Json(ApplicationResponse::ok(SubjectRecordResponse::from_db(record))))
}

async fn export_grades(
    Query(params): Query<SubjectParams>,
    State(state): State<AppState>,
) -> Result<Response, ApiError> {
    let subject_id = parse_subject_id(&params)?;

    let known = state
        .subjects()
        .subject_exists(subject_id)
        .await
        .map_err(|err| ApiError::internal(err, "Failed to resolve subject"))?;
    if !known {
        return Err(ApiError::Decoding(format!("subject {subject_id} cannot be resolved")));
    }

    let rows = state
        .subjects()
        .list_students(subject_id)
        .await
        .map_err(|err| ApiError::internal(err, "Failed to list students by subject"))?;

    let cells = rows.into_iter().map(|row| {
        vec![
            row.id.to_string(),
            format!("{}, {}", row.last_name, row.first_name),
            spreadsheet::grade_cell(row.exam_grade),
            spreadsheet::grade_cell(row.coursework_grade),
        ]
    });
    let bytes = spreadsheet::write_sheet(&SHEET_COLUMNS, cells).map_err(ApiError::from_sheet)?;

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"notas-materia-{subject_id}.csv\""),
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
    let sheet_rows = spreadsheet::read_sheet(
        &bytes,
        SHEET_ID_COLUMN,
        &[SHEET_EXAM_COLUMN, SHEET_COURSEWORK_COLUMN],
    )
    .map_err(ApiError::from_sheet)?;

    let mut problems = Vec::new();
    let mut updates = Vec::new();
    for row in &sheet_rows {
        let raw_exam = row.grades[0].as_str();
        let raw_coursework = row.grades[1].as_str();
        // Fully ungraded rows round-trip untouched; a row with only one
        // grade filled in is ambiguous and rejected.
        if raw_exam.is_empty() && raw_coursework.is_empty() {
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
        let exam_grade = parse_grade_cell(row.row, SHEET_EXAM_COLUMN, raw_exam, &mut problems);
        let coursework_grade =
            parse_grade_cell(row.row, SHEET_COURSEWORK_COLUMN, raw_coursework, &mut problems);

        if let (Some(record_id), Some(exam_grade), Some(coursework_grade)) =
            (record_id, exam_grade, coursework_grade)
        {
            updates.push(SubjectGradeUpdate { record_id, exam_grade, coursework_grade });
        }
    }

    if !problems.is_empty() {
        return Err(ApiError::Validation(problems));
    }

    let applied = state.subjects().apply_grades(&updates).await.map_err(|err| {
        ApiError::from_store(
            err,
            "spreadsheet references subject records that do not exist".to_string(),
            "Failed to apply imported subject grades",
        )
    })?;

    tracing::info!(applied, "Subject grades imported");
    Ok(Json(ApplicationResponse::ok(format!("{applied} grades updated"))))
}

fn parse_subject_id(params: &SubjectParams) -> Result<i64, ApiError> {
    validation::parse_id(
        "idMateria",
        validation::require_param("idMateria", params.subject_id.as_ref())?,
    )
}

fn parse_grade_param(
    field: &str,
    raw: Option<&String>,
    problems: &mut Vec<String>,
) -> Option<f64> {
    let Some(raw) = raw.map(|value| value.trim()).filter(|value| !value.is_empty()) else {
        problems.push(format!("{field} parameter is required"));
        return None;
    };

    match validation::parse_grade(field, raw) {
        Ok(value) => Some(value),
        Err(message) => {
            problems.push(message);
            None
        }
    }
}

fn parse_grade_cell(
    row: usize,
    field: &str,
    raw: &str,
    problems: &mut Vec<String>,
) -> Option<f64> {
    if raw.is_empty() {
        problems.push(format!("row {row}: {field} is empty"));
        return None;
    }

    match validation::parse_grade(field, raw) {
        Ok(value) => Some(value),
        Err(message) => {
            problems.push(format!("row {row}: {message}"));
            None
        }
    }
}
