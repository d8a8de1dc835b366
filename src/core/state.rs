use std::sync::Arc;

use crate::core::config::Settings;
use crate::services::grading::{FinalExamGrades, SubjectGrades};

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    final_exams: Arc<dyn FinalExamGrades>,
    subjects: Arc<dyn SubjectGrades>,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        final_exams: Arc<dyn FinalExamGrades>,
        subjects: Arc<dyn SubjectGrades>,
    ) -> Self {
        Self { inner: Arc::new(InnerState { settings, final_exams, subjects }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn final_exams(&self) -> &dyn FinalExamGrades {
        self.inner.final_exams.as_ref()
    }

    pub(crate) fn subjects(&self) -> &dyn SubjectGrades {
        self.inner.subjects.as_ref()
    }
}
