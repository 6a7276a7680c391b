use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Users Router Module
///
/// The four user-management endpoints. `create_router` wraps this whole router in
/// the authentication gate, so no route here is reachable anonymously.
pub fn users_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /users
        // Lists every user with a count.
        .route("/users", get(handlers::list_users))
        // GET/PUT/DELETE /users/{id}
        // Fetch, partially update, or remove one user. Update and delete enforce
        // self-or-admin, and update additionally restricts role changes to admins.
        .route(
            "/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
}
