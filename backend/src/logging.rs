use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use log::{log, Level};

pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .format_module_path(true)
        .init();
}

/// Logs one line per request with its status and latency.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();
    let level = if status.is_server_error() {
        Level::Warn
    } else {
        Level::Info
    };
    log!(
        target: "luminar_notes::access",
        level,
        "{} {} -> {} ({} ms)",
        method,
        path,
        status.as_u16(),
        elapsed_ms
    );
    response
}
