use crate::{AppState, handlers::auth};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Session endpoints for any signed-in account, whatever its role. The router is
/// wrapped in the authentication `route_layer` in `create_router`, so handlers
/// only run for a valid token whose user still exists.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /auth/me
        // The profile behind the current token; the admin panel calls it on load.
        .route("/auth/me", get(auth::get_me))
        // POST /auth/change-password
        // Requires the current password even with a valid token.
        .route("/auth/change-password", post(auth::change_password))
}
