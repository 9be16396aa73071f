//! Tagged `{"status", "data", "message"}` envelope used by the JSON endpoints.

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::application::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: Status,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: Status::Success,
            data: Some(data),
            message: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            data: None,
            message: Some(message.into()),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// [`AppError`] rendered as an error envelope.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.0.status_code();
        let mut response =
            (status, Json(ApiResponse::error(self.0.presentation_message()))).into_response();
        self.0.report().attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use serde_json::{Value, json};

    use super::*;
    use crate::application::error::ErrorReport;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn success_envelope_carries_data() {
        let response = ApiResponse::success(vec![1, 2]).into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"status": "success", "data": [1, 2], "message": null})
        );
    }

    #[tokio::test]
    async fn errors_keep_status_and_report() {
        let response = ApiError::from(AppError::not_found("post")).into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.extensions().get::<ErrorReport>().is_some());
        assert_eq!(
            body_json(response).await,
            json!({"status": "error", "data": null, "message": "No post found"})
        );
    }
}
