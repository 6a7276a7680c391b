use crate::{
    AppState,
    auth::Requester,
    error::{ApiError, ApiResult},
    models::{ErrorResponse, MessageResponse, UpdateUserRequest, UserListResponse, UserResponse},
    policy::{self, AccessRequest, Action, Gate},
    validation,
};
use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde_json::Value;

// --- Helpers ---

/// The identity attached by `auth_middleware`, if any.
fn identity(requester: &Option<Extension<Requester>>) -> Option<&Requester> {
    requester.as_ref().map(|Extension(r)| r)
}

/// Runs `gates` and turns the first denial into the matching `ApiError`.
fn enforce(gates: &[Gate], request: AccessRequest<'_>) -> ApiResult<()> {
    policy::authorize(gates, &request)
        .into_result()
        .map_err(ApiError::from)
}

// --- Handlers ---

/// list_users
///
/// [Authenticated Route] Returns every user with a count. No ownership rule applies.
#[utoipa::path(
    get,
    path = "/users",
    responses(
        (status = 200, description = "All users", body = UserListResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    )
)]
pub async fn list_users(
    requester: Option<Extension<Requester>>,
    State(state): State<AppState>,
) -> ApiResult<Json<UserListResponse>> {
    policy::authentication_presence(identity(&requester)).into_result()?;

    tracing::info!("Getting users ...");

    let users = state.repo.get_users().await.inspect_err(|e| {
        tracing::error!("Error getting users: {}", e);
    })?;

    Ok(Json(UserListResponse {
        message: "Successfully retrieved users".to_string(),
        count: users.len(),
        users,
    }))
}

/// get_user
///
/// [Authenticated Route] Fetches one user. The id is validated before the store is touched.
#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User ID (positive integer)")),
    responses(
        (status = 200, description = "Found", body = UserResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    )
)]
pub async fn get_user(
    requester: Option<Extension<Requester>>,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let id = validation::parse_user_id(&raw_id)?;

    policy::authentication_presence(identity(&requester)).into_result()?;

    tracing::info!("Getting user with id: {}", id);

    let user = state.repo.get_user(id).await.inspect_err(|e| {
        tracing::error!("Error getting user by id: {}", e);
    })?;

    Ok(Json(UserResponse {
        message: "Successfully retrieved user".to_string(),
        user,
    }))
}

/// update_user
///
/// [Authenticated Route] Applies a partial update.
///
/// Order: id shape, body shape, then the update gates (identity, self-or-admin,
/// admin-only role change). The store is only reached when all of them pass.
#[utoipa::path(
    put,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User ID (positive integer)")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserResponse),
        (status = 400, description = "Malformed id or body", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not allowed to change this user or field", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    )
)]
pub async fn update_user(
    requester: Option<Extension<Requester>>,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<UserResponse>> {
    let id = validation::parse_user_id(&raw_id)?;

    let Json(body) = body.map_err(|rejection| {
        validation::ValidationErrors::single("body", rejection.body_text())
    })?;
    let changes = validation::parse_update(&body)?;

    enforce(
        policy::UPDATE_GATES,
        AccessRequest {
            requester: identity(&requester),
            target: id,
            action: Action::Update,
            changes: Some(&changes),
        },
    )?;

    tracing::info!("Updating user with id: {}", id);

    let user = state.repo.update_user(id, changes).await.inspect_err(|e| {
        tracing::error!("Error updating user: {}", e);
    })?;

    Ok(Json(UserResponse {
        message: "User updated successfully".to_string(),
        user,
    }))
}

/// delete_user
///
/// [Authenticated Route] Removes a user. Non-admins may only remove themselves.
/// The response carries a confirmation message only, never the deleted record.
#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User ID (positive integer)")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 400, description = "Malformed id", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not allowed to delete this user", body = ErrorResponse),
        (status = 404, description = "No such user", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    requester: Option<Extension<Requester>>,
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = validation::parse_user_id(&raw_id)?;

    enforce(
        policy::DELETE_GATES,
        AccessRequest {
            requester: identity(&requester),
            target: id,
            action: Action::Delete,
            changes: None,
        },
    )?;

    tracing::info!("Deleting user with id: {}", id);

    state.repo.delete_user(id).await.inspect_err(|e| {
        tracing::error!("Error deleting user: {}", e);
    })?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
