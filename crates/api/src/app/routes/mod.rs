use axum::{
    Router,
    routing::{get, post},
};

pub mod auth;
pub mod products;
pub mod system;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
}

/// Endpoints that require a resolved caller.
pub fn protected_router() -> Router {
    Router::new()
        .route("/auth/me", get(auth::me))
        .merge(products::router())
}
