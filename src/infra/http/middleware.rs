use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::{Level, event};
use uuid::Uuid;

use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response.extensions_mut().insert(ctx);
    response
}

/// Logs every 4xx/5xx with the diagnostic chain an [`ErrorReport`] carries.
pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();
    let started_at = Instant::now();

    let mut response = next.run(request).await;
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let (source, chain) = response
        .extensions_mut()
        .remove::<ErrorReport>()
        .map_or(("unknown", Vec::new()), |report| {
            (report.source, report.messages)
        });
    let detail = chain
        .first()
        .map(String::as_str)
        .unwrap_or("no diagnostic available");

    macro_rules! failed {
        ($level:expr, $message:literal) => {
            event!(
                $level,
                target = "relaydoc::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                source,
                detail,
                chain = ?chain,
                request_id,
                $message,
            )
        };
    }

    if status.is_server_error() {
        failed!(Level::ERROR, "request failed");
    } else {
        failed!(Level::WARN, "client request error");
    }

    response
}
