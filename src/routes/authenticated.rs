use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes for any signed-in employee. The session guard is layered on top
/// of this router in `create_router`; unauthenticated callers are
/// redirected to `/login?next=<path>` before any handler here runs.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        .route("/dashboard", get(handlers::dashboard))
        // Logout is itself a protected route: without a session there is
        // nothing to destroy, so the caller is bounced to login like any
        // other guarded path.
        .route("/logout", get(handlers::logout))
}
