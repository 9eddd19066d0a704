use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::http::header::InvalidHeaderValue;
use axum::http::HeaderValue;
use axum::http::Method;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use thiserror::Error;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::handlers::delete_account::delete_account;
use super::handlers::get_profile::get_profile;
use super::handlers::health::health;
use super::handlers::login::login;
use super::handlers::refresh_token::refresh_token;
use super::handlers::register_account::register_account;
use super::handlers::update_profile::update_profile;
use super::middleware::authenticate as auth_middleware;
use crate::account::ports::AccountServicePort;
use crate::domain::authentication::ports::AuthenticationServicePort;

const API_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A configured CORS origin that cannot be used as a header value.
#[derive(Debug, Error)]
#[error("Invalid CORS origin {origin:?}: {source}")]
pub struct InvalidCorsOrigin {
    origin: String,
    #[source]
    source: InvalidHeaderValue,
}

#[derive(Clone)]
pub struct AppState {
    pub account_service: Arc<dyn AccountServicePort>,
    pub authentication_service: Arc<dyn AuthenticationServicePort>,
}

/// Build the HTTP application.
///
/// # Arguments
/// * `account_service` - Registration and profile operations
/// * `authentication_service` - Login, refresh and bearer token resolution
/// * `cors_allowed_origins` - Allowed browser origins; empty allows any
///
/// # Errors
/// * `InvalidCorsOrigin` - An origin is not a valid header value
pub fn create_router(
    account_service: Arc<dyn AccountServicePort>,
    authentication_service: Arc<dyn AuthenticationServicePort>,
    cors_allowed_origins: &[String],
) -> Result<Router, InvalidCorsOrigin> {
    let cors = cors_layer(cors_allowed_origins)?;

    let state = AppState {
        account_service,
        authentication_service,
    };

    let public_routes = Router::new()
        .route("/api/v1/users", post(register_account))
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/refresh", post(refresh_token));

    let protected_routes = Router::new()
        .route(
            "/api/v1/users/me",
            get(get_profile).patch(update_profile).delete(delete_account),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TimeoutLayer::new(API_REQUEST_TIMEOUT));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    let router = Router::new()
        .route("/health", get(health))
        .merge(api_routes)
        .layer(trace_layer)
        .layer(cors)
        .with_state(state);

    Ok(router)
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, InvalidCorsOrigin> {
    if allowed_origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|source| InvalidCorsOrigin {
                origin: origin.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]))
}
