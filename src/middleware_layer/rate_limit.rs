use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::{error::AppError, state::AppState};

/// How many weekly-code guesses an IP gets per window.
const VERIFY_CODE_LIMIT: i32 = 10;
/// How many admin password attempts an IP gets per window.
const ADMIN_LIMIT: i32 = 5;
/// The counter window in seconds.
const WINDOW_SECONDS: i64 = 900;

/// Extracts the real IP address from the request extensions.
///
/// # Arguments
///
/// * `req` - The incoming request.
///
/// # Returns
///
/// The IP address as a string, or "unknown" if not found.
fn extract_real_ip(req: &Request<Body>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

async fn current_attempts(state: &AppState, key: &str) -> Option<i32> {
    redis::cmd("GET")
        .arg(key)
        .query_async(&mut state.redis.clone())
        .await
        .unwrap_or(None)
}

async fn window_ttl(state: &AppState, key: &str) -> i32 {
    let ttl: Option<i32> = redis::cmd("TTL")
        .arg(key)
        .query_async(&mut state.redis.clone())
        .await
        .unwrap_or(None);
    ttl.unwrap_or(0)
}

async fn record_attempt(state: &AppState, key: &str) {
    let _: () = redis::cmd("INCR")
        .arg(key)
        .query_async(&mut state.redis.clone())
        .await
        .unwrap_or(());

    let _: () = redis::cmd("EXPIRE")
        .arg(key)
        .arg(WINDOW_SECONDS)
        .query_async(&mut state.redis.clone())
        .await
        .unwrap_or(());
}

/// A middleware that rate limits weekly-code guesses per IP.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `req` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response` or an error `AppError`.
pub async fn rate_limit_verify_code(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = extract_real_ip(&req);
    let key = format!("rate_limit:verify_code:{}", ip);

    if let Some(attempts) = current_attempts(&state, &key).await {
        if attempts >= VERIFY_CODE_LIMIT {
            let ttl = window_ttl(&state, &key).await;
            return AppError::RateLimitExceeded(format!(
                "Too many code attempts. Try again in {} minutes",
                ttl / 60
            ))
            .into_response();
        }
    }

    record_attempt(&state, &key).await;

    next.run(req).await
}

/// A middleware that rate limits admin unlock attempts per IP.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `req` - The incoming request.
/// * `next` - The next middleware in the chain.
///
/// # Returns
///
/// A `Response` or an error `AppError`.
pub async fn rate_limit_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = extract_real_ip(&req);
    let key = format!("rate_limit:admin:{}", ip);

    if let Some(attempts) = current_attempts(&state, &key).await {
        if attempts >= ADMIN_LIMIT {
            let ttl = window_ttl(&state, &key).await;
            return AppError::Authentication(format!(
                "Too many failed admin attempts. Try again in {} minutes",
                ttl / 60
            ))
            .into_response();
        }
    }

    record_attempt(&state, &key).await;

    next.run(req).await
}
