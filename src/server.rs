use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::Result;
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use tracing::{info, warn};

use crate::parser::{self, Convention};

const RATE_LIMIT_MAX: u32 = 30;
const RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

struct AppState {
    limiter: RateLimiter,
}

/// Run the parse service until the process is stopped.
pub async fn serve(port: u16) -> Result<()> {
    let state = Arc::new(AppState {
        limiter: RateLimiter::new(RATE_LIMIT_MAX, RATE_LIMIT_WINDOW),
    });
    let app = Router::new()
        .route("/parse", post(parse_endpoint))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {addr}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

#[derive(Deserialize)]
struct ParseRequest {
    file: Option<String>,
    #[serde(default)]
    format: Convention,
}

/// `POST /parse` with `{"file": "<base64 docx>", "format": "auto|styled|marked"}`.
/// Answers 200 with the parsed record, 400 when the file field is absent,
/// 429 when the client is over its window, 500 on any processing failure.
async fn parse_endpoint(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<ParseRequest>,
) -> Response {
    if !state.limiter.allow(addr.ip()) {
        return error_response(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded.");
    }

    let Some(file) = request.file else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'file' in request body.");
    };

    let bytes = match BASE64.decode(file.as_bytes()) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Rejected upload from {}: bad base64 ({e})", addr.ip());
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string());
        }
    };

    match parser::parse_bytes(&bytes, request.format) {
        Ok(document) => Json(document).into_response(),
        Err(e) => {
            warn!("Failed to parse upload from {}: {e}", addr.ip());
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &format!("{e:#}"))
        }
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

/// Fixed-window request counter per client address.
struct RateLimiter {
    max: u32,
    window: Duration,
    hits: Mutex<HashMap<IpAddr, (Instant, u32)>>,
}

impl RateLimiter {
    fn new(max: u32, window: Duration) -> Self {
        RateLimiter {
            max,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    fn allow(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = hits.entry(ip).or_insert((now, 0));
        if now.duration_since(entry.0) >= self.window {
            *entry = (now, 0);
        }
        entry.1 += 1;
        entry.1 <= self.max
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn localhost() -> SocketAddr {
        "127.0.0.1:9999".parse().unwrap()
    }

    async fn call(state: Arc<AppState>, request: ParseRequest) -> Response {
        parse_endpoint(State(state), ConnectInfo(localhost()), Json(request)).await
    }

    fn fresh_state() -> Arc<AppState> {
        Arc::new(AppState {
            limiter: RateLimiter::new(RATE_LIMIT_MAX, RATE_LIMIT_WINDOW),
        })
    }

    #[test]
    fn limiter_blocks_after_window_budget() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        assert!(limiter.allow(ip));
        assert!(limiter.allow(ip));
        assert!(!limiter.allow(ip));
        // Other clients have their own window
        let other: IpAddr = "10.0.0.2".parse().unwrap();
        assert!(limiter.allow(other));
    }

    #[test]
    fn limiter_resets_after_window() {
        let limiter = RateLimiter::new(1, Duration::from_millis(0));
        let ip: IpAddr = "10.0.0.3".parse().unwrap();
        assert!(limiter.allow(ip));
        // Zero-length window: every call starts a fresh one
        assert!(limiter.allow(ip));
    }

    #[tokio::test]
    async fn missing_file_is_a_bad_request() {
        let response = call(
            fresh_state(),
            ParseRequest {
                file: None,
                format: Convention::Auto,
            },
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_base64_is_a_server_error() {
        let response = call(
            fresh_state(),
            ParseRequest {
                file: Some("%%% not base64 %%%".to_string()),
                format: Convention::Auto,
            },
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn corrupt_container_is_a_server_error() {
        let response = call(
            fresh_state(),
            ParseRequest {
                file: Some(BASE64.encode(b"definitely not a docx")),
                format: Convention::Auto,
            },
        )
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
