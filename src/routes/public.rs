use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Unauthenticated endpoints: the landing page, the login/registration
/// forms, and a monitoring probe. The login handlers accept an optional
/// `?next=` so the guard can forward callers back to where they started.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // Liveness probe for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        .route("/", get(handlers::home_page))
        // GET renders the form (consuming any pending flash notice),
        // POST authenticates and issues the session.
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route(
            "/register",
            get(handlers::register_page).post(handlers::register),
        )
}
