use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use http::{Method, header};
use std::net::SocketAddr;
use std::time::Duration;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod error;
mod state;

mod cache {
    pub mod access;
    pub mod redis;
}

mod clients {
    pub mod admin;
}

mod models {
    pub mod session;
    pub mod weekly_code;
}

mod repositories {
    pub mod session;
    pub mod weekly_code;
}

mod services {
    pub mod access;
    pub mod store;
    pub mod token;
    pub mod week;
}

mod handlers {
    pub mod access;
}

mod middleware_layer {
    pub mod rate_limit;
}

mod validation {
    pub mod access;
}

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config).await?;
    tracing::info!("✅ AppState initialized");

    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:5173".parse().unwrap(),
            "http://127.0.0.1:5173".parse().unwrap(),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::COOKIE])
        .allow_credentials(true)
        .max_age(Duration::from_secs(86400));

    let verify_routes = Router::new()
        .route(
            "/api/secret-menu/verify-code",
            post(handlers::access::verify_code),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::rate_limit::rate_limit_verify_code,
        ))
        .with_state(state.clone());

    let admin_routes = Router::new()
        .route("/api/secret-menu/admin", post(handlers::access::admin_unlock))
        .route(
            "/api/secret-menu/weekly-code",
            post(handlers::access::upsert_weekly_code),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware_layer::rate_limit::rate_limit_admin,
        ))
        .with_state(state.clone());

    let open_routes = Router::new()
        .route("/api/secret-menu/access", get(handlers::access::check_access))
        .route("/api/secret-menu/quiz-grant", post(handlers::access::quiz_grant))
        .route("/api/secret-menu/revoke", post(handlers::access::revoke))
        .with_state(state.clone());

    let app = Router::new()
        .merge(verify_routes)
        .merge(admin_routes)
        .merge(open_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CookieManagerLayer::new())
        .layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
