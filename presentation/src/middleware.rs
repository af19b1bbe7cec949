use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use shared::telemetry::Telemetry;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

pub static X_REQUEST_ID: &str = "x-request-id";

/// Wraps each request in a span keyed by a request id and logs its outcome.
///
/// A valid UUID in `x-request-id` is reused; otherwise a new one is minted.
/// The id is echoed back on the response.
pub async fn trace_requests(req: Request, next: Next) -> Response {
    let telemetry = Telemetry::new();

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    let span = info_span!(
        "http_request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        let mut response = next.run(req).await;

        if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
            response.headers_mut().insert(X_REQUEST_ID, value);
        }

        info!(
            status = response.status().as_u16(),
            latency_ms = telemetry.elapsed_ms() as u64,
            "request finished"
        );
        response
    }
    .instrument(span)
    .await
}
