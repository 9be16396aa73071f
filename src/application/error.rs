use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    domain::{error::DomainError, types::UnsupportedFormat},
    infra::error::InfraError,
    render::RenderError,
    resilience::CallError,
};

/// Diagnostic chain attached to error responses for the logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Upstream(#[from] CallError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    UnsupportedFormat(#[from] UnsupportedFormat),
}

impl AppError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::Domain(DomainError::not_found(entity))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Domain(DomainError::validation(message))
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Domain(DomainError::NotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Domain(DomainError::Validation { .. }) | AppError::UnsupportedFormat(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Upstream(err) => match err.root() {
                CallError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                CallError::Upstream { status: 429, .. } => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            AppError::Render(_) | AppError::Infra(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn presentation_message(&self) -> String {
        match self {
            AppError::Domain(DomainError::NotFound { entity }) => format!("No {entity} found"),
            AppError::Domain(DomainError::Validation { message }) => message.clone(),
            AppError::UnsupportedFormat(err) => err.to_string(),
            AppError::Upstream(err) => match err.root() {
                CallError::Timeout { .. } => "Upstream service timed out".to_string(),
                CallError::Upstream { status: 429, .. } => {
                    "Upstream service is rate limiting requests".to_string()
                }
                _ => "Upstream service unavailable".to_string(),
            },
            AppError::Render(_) => "Document could not be rendered".to_string(),
            AppError::Infra(InfraError::Configuration { .. }) => "Service misconfigured".to_string(),
            AppError::Infra(_) => "Unexpected error occurred".to_string(),
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport::from_error("application::error::AppError", self.status_code(), self)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut response = (status, self.presentation_message()).into_response();
        self.report().attach(&mut response);
        response
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn maps_upstream_failures_to_gateway_statuses() {
        let timeout = AppError::from(CallError::Timeout {
            after: Duration::from_secs(120),
        });
        let limited = AppError::from(CallError::upstream(429, ""));
        let exhausted = AppError::from(CallError::RetriesExhausted {
            attempts: 4,
            last: Box::new(CallError::upstream(503, "")),
        });
        let refused = AppError::from(CallError::transport("refused"));

        assert_eq!(timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(limited.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(exhausted.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(refused.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn maps_request_errors_to_client_statuses() {
        let not_found = AppError::not_found("posts");
        let bad_format = AppError::from(UnsupportedFormat("odt".into()));

        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.presentation_message(), "No posts found");
        assert_eq!(bad_format.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(bad_format.presentation_message(), "unsupported format: odt");
    }

    #[test]
    fn report_captures_error_chain() {
        let err = AppError::from(CallError::RetriesExhausted {
            attempts: 2,
            last: Box::new(CallError::upstream(500, "")),
        });

        let report = err.report();

        assert_eq!(report.status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            report.messages[0],
            "gave up after 2 attempts: upstream answered with status 500"
        );
    }
}
