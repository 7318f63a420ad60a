//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: builds the account and product services from the stores
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: response bodies that are not domain types
//! - `errors.rs`: the boundary error type and its `{"detail"}` responses

use std::sync::Arc;

use anyhow::Context;
use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use stockroom_infra::{Settings, Stores, open_stores};

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Opens Postgres when `DATABASE_URL` is configured, in-memory stores otherwise.
pub async fn build_app(settings: &Settings) -> anyhow::Result<Router> {
    let stores = open_stores(settings)
        .await
        .context("failed to open stores")?;
    Ok(build_router(settings, stores))
}

/// Router over already-opened stores.
pub fn build_router(settings: &Settings, stores: Stores) -> Router {
    let services = Arc::new(services::AppServices::new(settings, stores));
    let auth_state = middleware::AuthState {
        identity: services.identity.clone(),
    };

    // Protected routes: a resolved caller is required before any handler runs.
    let protected = routes::protected_router().route_layer(
        axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware),
    );
    let api = routes::public_router().merge(protected);

    Router::new()
        .route("/health", get(routes::system::health))
        .nest(&settings.api_prefix(), api)
        .fallback(routes::system::not_found)
        .layer(Extension(services))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CatchPanicLayer::custom(errors::panic_response)),
        )
}
