use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod grades;

/// Uniform response envelope: `{data: T, error: null}` on success,
/// `{data: null, error: {...}}` on failure.
#[derive(Debug, Serialize)]
pub(crate) struct ApplicationResponse<T: Serialize> {
    pub(crate) data: Option<T>,
    pub(crate) error: Option<ErrorPayload>,
}

impl<T: Serialize> ApplicationResponse<T> {
    pub(crate) fn ok(data: T) -> Self {
        Self { data: Some(data), error: None }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorPayload {
    pub(crate) message: String,
    pub(crate) details: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
}
