use crate::config::Config;
use crate::services::duplicate_resolver::DuplicateResolver;
use crate::services::health_service::HealthService;
use crate::services::user_migration_service::UserMigrationService;
use axum::body::Body;
use axum::http::{HeaderName, Request, StatusCode};
use axum::{
    Router,
    routing::{get, post},
};
use std::time::Duration;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod conversations;
pub mod health;
pub mod middleware;
pub mod schemas;

#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
    pub duplicate_resolver: DuplicateResolver,
    pub user_migration_service: UserMigrationService,
}

#[derive(Clone, Debug)]
pub struct MgmtState {
    pub health_service: HealthService,
}

#[derive(Debug)]
pub struct ServiceContainer {
    pub duplicate_resolver: DuplicateResolver,
    pub user_migration_service: UserMigrationService,
}

/// Configures and returns the primary application router.
pub fn app_router(config: Config, services: ServiceContainer) -> Router {
    let request_timeout = Duration::from_secs(config.server.request_timeout_secs);

    let state = AppState {
        config,
        duplicate_resolver: services.duplicate_resolver,
        user_migration_service: services.user_migration_service,
    };

    let api_routes = Router::new()
        .route("/conversations/duplicates/cleanup", post(conversations::cleanup_duplicates))
        .route("/auth/sign-in", post(auth::sign_in));

    Router::new()
        .nest("/v1", api_routes)
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, request_timeout))
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(middleware::REQUEST_ID_HEADER)))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(move |request: &Request<Body>| {
                    let request_id = request
                        .extensions()
                        .get::<tower_http::request_id::RequestId>()
                        .and_then(|id| id.header_value().to_str().ok())
                        .unwrap_or_default()
                        .to_string();

                    tracing::info_span!(
                        "request",
                        "request_id" = %request_id,
                        "http.request.method" = %request.method(),
                        "url.path" = %request.uri().path(),
                        "http.response.status_code" = tracing::field::Empty,
                        "otel.kind" = "server",
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &tracing::Span| {
                        let status = response.status();
                        span.record("http.response.status_code", status.as_u16());

                        tracing::info!(
                            latency_ms = %latency.as_millis(),
                            status = %status.as_u16(),
                            "request completed"
                        );
                    },
                )
                .on_failure(|error, _latency, _span: &tracing::Span| {
                    tracing::error!(error = %error, "request failed");
                }),
        )
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static(middleware::REQUEST_ID_HEADER),
            middleware::MakeRequestUuidOrHeader,
        ))
        .with_state(state)
}

pub fn mgmt_router(state: MgmtState) -> Router {
    Router::new().route("/livez", get(health::livez)).route("/readyz", get(health::readyz)).with_state(state)
}
