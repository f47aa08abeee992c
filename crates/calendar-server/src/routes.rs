use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware,
    routing::get,
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::db::{EventRepository, UserRepository};
use crate::error::AppError;
use crate::handlers::{events as event_handlers, users as user_handlers};
use crate::middleware::{rate_limit, require_json, RateLimiter};

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub events: Arc<dyn EventRepository>,
    pub rate_limiter: Arc<RateLimiter>,
    pub config: Config,
}

impl AppState {
    /// Build state around a store that serves both users and events.
    pub fn new<S>(store: Arc<S>, config: Config) -> Self
    where
        S: UserRepository + EventRepository + 'static,
    {
        Self {
            users: store.clone(),
            events: store,
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit)),
            config,
        }
    }
}

fn cors_layer(origins: Option<&[String]>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match origins {
        None => layer.allow_origin(Any),
        Some(origins) => {
            let values: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                        None
                    }
                })
                .collect();
            layer.allow_origin(AllowOrigin::list(values))
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let event_routes = Router::new()
        .route(
            "/",
            get(event_handlers::list_events)
                .post(event_handlers::create_event)
                .fallback(route_not_found),
        )
        .route(
            "/:id",
            get(event_handlers::get_event)
                .put(event_handlers::update_event)
                .delete(event_handlers::delete_event)
                .fallback(route_not_found),
        );

    let user_routes = Router::new()
        .route(
            "/",
            get(user_handlers::list_users)
                .post(user_handlers::create_user)
                .fallback(route_not_found),
        )
        .route(
            "/:id",
            get(user_handlers::get_user).fallback(route_not_found),
        );

    let cors = cors_layer(state.config.cors_origins.as_deref());

    // Layers run bottom-up: CORS, tracing, rate limiting, then content type
    Router::new()
        .route("/", get(service_info).fallback(route_not_found))
        .route("/health", get(health_check).fallback(route_not_found))
        .nest("/api/events", event_routes)
        .nest("/api/users", user_routes)
        .fallback(route_not_found)
        .layer(middleware::from_fn(require_json))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

async fn service_info() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Calendar backend",
        "info": "Available routes: /health, /api/users, /api/events",
        "health": "/health",
        "apiBase": "/api",
    }))
}

/// Unknown paths and unsupported methods on known paths.
async fn route_not_found() -> AppError {
    AppError::NotFound("Route not found")
}
