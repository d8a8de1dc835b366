use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, OnceLock};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request},
    Router,
};
use tokio::sync::{Mutex as EnvMutex, OwnedMutexGuard};

use crate::api;
use crate::core::{config::Settings, state::AppState, time::primitive_now_utc};
use crate::db::models::{FinalExamRecord, FinalExamStudentRow, SubjectRecord, SubjectStudentRow};
use crate::services::grading::{
    FinalExamGradeUpdate, FinalExamGrades, StoreError, SubjectGradeUpdate, SubjectGrades,
};

pub(crate) struct TestContext {
    pub(crate) app: Router,
    pub(crate) final_exams: Arc<InMemoryFinalExamGrades>,
    pub(crate) subjects: Arc<InMemorySubjectGrades>,
    _guard: OwnedMutexGuard<()>,
}

pub(crate) async fn env_lock() -> OwnedMutexGuard<()> {
    static LOCK: OnceLock<Arc<EnvMutex<()>>> = OnceLock::new();
    let lock = LOCK.get_or_init(|| Arc::new(EnvMutex::new(()))).clone();
    lock.lock_owned().await
}

pub(crate) fn set_test_env() {
    std::env::set_var("NOTAS_ENV", "test");
    std::env::set_var("NOTAS_STRICT_CONFIG", "0");
    std::env::set_var("PROJECT_NAME", "Notas API");
    std::env::set_var("PROMETHEUS_ENABLED", "0");
    std::env::remove_var("BACKEND_CORS_ORIGINS");
}

pub(crate) async fn setup_test_context() -> TestContext {
    let guard = env_lock().await;
    set_test_env();

    let settings = Settings::load().expect("settings");
    let final_exams = Arc::new(InMemoryFinalExamGrades::default());
    let subjects = Arc::new(InMemorySubjectGrades::default());

    let state = AppState::new(settings, final_exams.clone(), subjects.clone());
    let app = api::router::router(state);

    TestContext { app, final_exams, subjects, _guard: guard }
}

/// In-memory stand-in for the final-exam grade store.
#[derive(Default)]
pub(crate) struct InMemoryFinalExamGrades {
    exams: Mutex<HashMap<i64, i64>>,
    rows: Mutex<Vec<FinalExamStudentRow>>,
}

impl InMemoryFinalExamGrades {
    pub(crate) fn seed_exam(&self, subject_id: i64, exam_id: i64) {
        self.exams.lock().unwrap().insert(subject_id, exam_id);
    }

    pub(crate) fn seed_student(&self, row: FinalExamStudentRow) {
        self.rows.lock().unwrap().push(row);
    }

    pub(crate) fn grade_of(&self, record_id: i64) -> Option<Option<f64>> {
        self.rows.lock().unwrap().iter().find(|row| row.id == record_id).map(|row| row.grade)
    }
}

#[async_trait]
impl FinalExamGrades for InMemoryFinalExamGrades {
    async fn list_students(
        &self,
        subject_id: i64,
    ) -> Result<Vec<FinalExamStudentRow>, StoreError> {
        let Some(exam_id) = self.exams.lock().unwrap().get(&subject_id).copied() else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<FinalExamStudentRow> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.final_exam_id == exam_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (a.last_name.as_str(), a.first_name.as_str())
                .cmp(&(b.last_name.as_str(), b.first_name.as_str()))
        });
        Ok(rows)
    }

    async fn update_grade(
        &self,
        record_id: i64,
        grade: f64,
    ) -> Result<FinalExamRecord, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.iter_mut().find(|row| row.id == record_id).ok_or(StoreError::NotFound)?;
        row.grade = Some(grade);

        let now = primitive_now_utc();
        Ok(FinalExamRecord {
            id: row.id,
            student_id: row.student_id,
            final_exam_id: row.final_exam_id,
            grade: row.grade,
            created_at: now,
            updated_at: now,
        })
    }

    async fn apply_grades(&self, updates: &[FinalExamGradeUpdate]) -> Result<u64, StoreError> {
        let mut rows = self.rows.lock().unwrap();

        // All-or-nothing, like the transactional store.
        for update in updates {
            if !rows.iter().any(|row| row.id == update.record_id) {
                return Err(StoreError::NotFound);
            }
        }
        for update in updates {
            if let Some(row) = rows.iter_mut().find(|row| row.id == update.record_id) {
                row.grade = Some(update.grade);
            }
        }
        Ok(updates.len() as u64)
    }

    async fn find_exam_for_subject(&self, subject_id: i64) -> Result<Option<i64>, StoreError> {
        Ok(self.exams.lock().unwrap().get(&subject_id).copied())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-memory stand-in for the subject grade store.
#[derive(Default)]
pub(crate) struct InMemorySubjectGrades {
    subjects: Mutex<HashSet<i64>>,
    rows: Mutex<Vec<SubjectStudentRow>>,
}

impl InMemorySubjectGrades {
    pub(crate) fn seed_subject(&self, subject_id: i64) {
        self.subjects.lock().unwrap().insert(subject_id);
    }

    pub(crate) fn seed_student(&self, row: SubjectStudentRow) {
        self.rows.lock().unwrap().push(row);
    }

    pub(crate) fn grades_of(&self, record_id: i64) -> Option<(Option<f64>, Option<f64>)> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id == record_id)
            .map(|row| (row.exam_grade, row.coursework_grade))
    }
}

#[async_trait]
impl SubjectGrades for InMemorySubjectGrades {
    async fn list_students(&self, subject_id: i64) -> Result<Vec<SubjectStudentRow>, StoreError> {
        let mut rows: Vec<SubjectStudentRow> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.subject_id == subject_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            (a.last_name.as_str(), a.first_name.as_str())
                .cmp(&(b.last_name.as_str(), b.first_name.as_str()))
        });
        Ok(rows)
    }

    async fn update_grades(
        &self,
        record_id: i64,
        exam_grade: f64,
        coursework_grade: f64,
    ) -> Result<SubjectRecord, StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.iter_mut().find(|row| row.id == record_id).ok_or(StoreError::NotFound)?;
        row.exam_grade = Some(exam_grade);
        row.coursework_grade = Some(coursework_grade);

        let now = primitive_now_utc();
        Ok(SubjectRecord {
            id: row.id,
            student_id: row.student_id,
            subject_id: row.subject_id,
            exam_grade: row.exam_grade,
            coursework_grade: row.coursework_grade,
            created_at: now,
            updated_at: now,
        })
    }

    async fn apply_grades(&self, updates: &[SubjectGradeUpdate]) -> Result<u64, StoreError> {
        let mut rows = self.rows.lock().unwrap();

        for update in updates {
            if !rows.iter().any(|row| row.id == update.record_id) {
                return Err(StoreError::NotFound);
            }
        }
        for update in updates {
            if let Some(row) = rows.iter_mut().find(|row| row.id == update.record_id) {
                row.exam_grade = Some(update.exam_grade);
                row.coursework_grade = Some(update.coursework_grade);
            }
        }
        Ok(updates.len() as u64)
    }

    async fn subject_exists(&self, subject_id: i64) -> Result<bool, StoreError> {
        Ok(self.subjects.lock().unwrap().contains(&subject_id))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

pub(crate) fn final_exam_row(
    id: i64,
    student_id: i64,
    first_name: &str,
    last_name: &str,
    final_exam_id: i64,
    grade: Option<f64>,
) -> FinalExamStudentRow {
    FinalExamStudentRow {
        id,
        student_id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        final_exam_id,
        grade,
    }
}

pub(crate) fn subject_row(
    id: i64,
    student_id: i64,
    first_name: &str,
    last_name: &str,
    subject_id: i64,
    exam_grade: Option<f64>,
    coursework_grade: Option<f64>,
) -> SubjectStudentRow {
    SubjectStudentRow {
        id,
        student_id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        subject_id,
        exam_grade,
        coursework_grade,
    }
}

pub(crate) fn json_request(
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);

    if let Some(body) = body {
        let bytes = serde_json::to_vec(&body).expect("serialize body");
        builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(bytes))
            .expect("request body")
    } else {
        builder.body(Body::empty()).expect("request body")
    }
}

pub(crate) async fn read_json(response: axum::response::Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.expect("response body");
    serde_json::from_slice(&body).unwrap_or_else(|err| {
        let body_text = String::from_utf8_lossy(&body);
        panic!("json parse: {err}; body: {body_text}");
    })
}

pub(crate) async fn read_bytes(response: axum::response::Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX).await.expect("response body").to_vec()
}
