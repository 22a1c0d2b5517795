use super::AppState;
use crate::dispatch;
use crate::models::{ErrorBody, FormState, GenerateBody};
use crate::Error;
use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

const INDEX_HTML: &str = include_str!("../../assets/index.html");

#[derive(Debug)]
pub struct ApiError {
    pub code: StatusCode,
    pub message: String,
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let code = match &e {
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Upstream { .. } => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            code,
            message: e.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            code: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code, Json(ErrorBody { error: self.message })).into_response()
    }
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<FormState>, ApiError> {
    let Json(body) = payload?;
    let prompt = body.prompt.unwrap_or_default();
    let artifact = state.generate(prompt.clone()).await?;

    Ok(Json(FormState {
        image: Some(artifact),
        prompt,
    }))
}

pub async fn reset() -> Json<FormState> {
    Json(dispatch::reset())
}
