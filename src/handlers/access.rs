use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{
    clients::admin::AdminAuth,
    error::{AppError, Result},
    repositories::weekly_code as weekly_code_repo,
    services::week,
    state::AppState,
    validation::access::*,
};

/// Cookie identifying the device's access-cache namespace.
const DEVICE_COOKIE: &str = "device_id";

/// The request payload for weekly-code verification.
#[derive(Deserialize, Debug)]
pub struct VerifyCodeRequest {
    pub code: String,
}

/// The request payload for the admin unlock.
#[derive(Deserialize)]
pub struct AdminUnlockRequest {
    pub password: String,
}

/// The request payload for a quiz consolation grant.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuizGrantRequest {
    pub email: String,
    pub phone: String,
    pub first_name: String,
    pub secret_code: String,
}

/// The request payload for setting the current week's code.
#[derive(Deserialize)]
pub struct WeeklyCodeRequest {
    pub password: String,
    pub code: String,
}

/// The response payload for unlock attempts.
#[derive(Serialize)]
pub struct UnlockResponse {
    pub success: bool,
    pub message: String,
}

/// The response payload for quiz consolation grants.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizGrantResponse {
    pub success: bool,
    pub message: String,
    pub access_token: Option<String>,
}

/// The response payload for the weekly-code upsert.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyCodeResponse {
    pub success: bool,
    pub week_start: String,
    pub secret_code: String,
}

/// Creates the long-lived device cookie.
fn create_device_cookie(value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(DEVICE_COOKIE, value);

    let is_production =
        std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()) == "production";

    cookie.set_http_only(true);
    if is_production {
        cookie.set_secure(true);
    }
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::days(365));
    cookie.set_path("/");

    cookie
}

/// Reads the device cookie, issuing a fresh one if absent or malformed.
fn ensure_device_cookie(cookies: &Cookies) -> String {
    if let Some(cookie) = cookies.get(DEVICE_COOKIE) {
        let value = cookie.value().to_string();
        if Uuid::parse_str(&value).is_ok() {
            return value;
        }
    }

    let device_id = Uuid::new_v4().to_string();
    cookies.add(create_device_cookie(device_id.clone()));
    device_id
}

/// Returns the current access state for this device.
#[axum::debug_handler]
pub async fn check_access(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<impl IntoResponse> {
    let device_id = ensure_device_cookie(&cookies);
    let controller = state.controllers.get_or_create(&device_id).await;

    let access = controller.check_access().await;
    Ok(Json(access))
}

/// Handles a weekly-code unlock attempt.
#[axum::debug_handler]
pub async fn verify_code(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<VerifyCodeRequest>,
) -> Result<impl IntoResponse> {
    validate_code(&payload.code)?;

    let device_id = ensure_device_cookie(&cookies);
    tracing::info!("🔑 Weekly code attempt from device {}", device_id);

    let controller = state.controllers.get_or_create(&device_id).await;
    let granted = controller.verify_code(&payload.code).await;

    let response = if granted {
        UnlockResponse {
            success: true,
            message: "Secret menu unlocked".to_string(),
        }
    } else {
        // Wrong code and backend failure share one message on purpose.
        UnlockResponse {
            success: false,
            message: "Invalid code or connection error".to_string(),
        }
    };

    Ok((StatusCode::OK, Json(response)))
}

/// Handles an admin password unlock attempt.
#[axum::debug_handler]
pub async fn admin_unlock(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<AdminUnlockRequest>,
) -> Result<impl IntoResponse> {
    let device_id = ensure_device_cookie(&cookies);
    tracing::info!("🔐 Admin unlock attempt from device {}", device_id);

    let controller = state.controllers.get_or_create(&device_id).await;
    let granted = controller.verify_admin_access(&payload.password).await;

    if granted {
        Ok((
            StatusCode::OK,
            Json(UnlockResponse {
                success: true,
                message: "Admin access granted".to_string(),
            }),
        ))
    } else {
        Ok((
            StatusCode::UNAUTHORIZED,
            Json(UnlockResponse {
                success: false,
                message: "Invalid password or connection error".to_string(),
            }),
        ))
    }
}

/// Handles a quiz consolation grant.
#[axum::debug_handler]
pub async fn quiz_grant(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<QuizGrantRequest>,
) -> Result<impl IntoResponse> {
    validate_email(&payload.email)?;
    validate_phone(&payload.phone)?;
    validate_first_name(&payload.first_name)?;
    validate_code(&payload.secret_code)?;

    let device_id = ensure_device_cookie(&cookies);
    tracing::info!("🎁 Quiz consolation grant for device {}", device_id);

    let controller = state.controllers.get_or_create(&device_id).await;
    let granted = controller
        .grant_access_from_quiz(
            &payload.email,
            &payload.phone,
            &payload.first_name,
            &payload.secret_code,
        )
        .await;

    match granted {
        Some(access_token) => Ok((
            StatusCode::CREATED,
            Json(QuizGrantResponse {
                success: true,
                message: "Consolation access granted".to_string(),
                access_token: Some(access_token),
            }),
        )),
        None => Ok((
            StatusCode::OK,
            Json(QuizGrantResponse {
                success: false,
                message: "Invalid code or connection error".to_string(),
                access_token: None,
            }),
        )),
    }
}

/// Revokes this device's secret-menu access.
#[axum::debug_handler]
pub async fn revoke(
    State(state): State<AppState>,
    cookies: Cookies,
) -> Result<impl IntoResponse> {
    let device_id = ensure_device_cookie(&cookies);
    let controller = state.controllers.get_or_create(&device_id).await;

    controller.revoke_access().await;
    tracing::info!("👋 Access revoked for device {}", device_id);

    Ok(Json(UnlockResponse {
        success: true,
        message: "Access revoked".to_string(),
    }))
}

/// Sets the current week's unlock code. Admin-gated; this is the service
/// face of the weekly "ensure" operation.
#[axum::debug_handler]
pub async fn upsert_weekly_code(
    State(state): State<AppState>,
    Json(payload): Json<WeeklyCodeRequest>,
) -> Result<impl IntoResponse> {
    validate_code(&payload.code)?;

    if !state.admin.verify(&payload.password).await.unwrap_or(false) {
        return Err(AppError::Authentication("Invalid admin password".to_string()));
    }

    let week_start = week::week_start(Local::now().date_naive());
    let code =
        weekly_code_repo::upsert(&state.db, week_start, &payload.code.trim().to_uppercase())
            .await?;

    tracing::info!("✅ Weekly code set for week {}", code.week_start);

    Ok((
        StatusCode::OK,
        Json(WeeklyCodeResponse {
            success: true,
            week_start: code.week_start.format("%Y-%m-%d").to_string(),
            secret_code: code.secret_code,
        }),
    ))
}
