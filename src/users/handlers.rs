use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{Map, Value};
use tracing::{error, info, instrument, warn};

use crate::{
    error::ApiError,
    state::AppState,
    users::{
        dto::{ApiResponse, CreateUserRequest, UserResponse, UserUpdateRequest},
        extractors::{JsonBody, ObjectIdPath},
        password::hash_password,
        repo_types::{User, UserChanges},
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", get(get_user).put(update_user).delete(delete_user))
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    if !payload.has_required_fields() {
        warn!("create user with missing fields");
        return Err(ApiError::BadRequest(
            "All fields except ID and JoinDate are required",
        ));
    }

    let hash = match hash_password(&state.passwords, payload.password).await {
        Ok(h) => h,
        Err(e) => {
            error!(error = %e, "hash_password failed");
            return Err(ApiError::Internal("Error hashing password"));
        }
    };

    let user = match User::new(payload.email, hash, payload.first_name, payload.last_name) {
        Ok(u) => u,
        Err(e) => {
            error!(error = %e, "build user failed");
            return Err(ApiError::Internal("Failed to create user"));
        }
    };

    if let Err(e) = state.users.insert(&user).await {
        error!(error = %e, "insert user failed");
        return Err(ApiError::Internal("Failed to create user"));
    }

    info!(user_id = %user.id, email = %user.email, "user created");
    let message = format!("User created successfully with ID: {}", user.id.to_hex());
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_data(201, message, user.into())),
    ))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = match state.users.find_by_id(id).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            warn!(user_id = %id, "user not found");
            return Err(ApiError::NotFound("User not found"));
        }
        Err(e) => {
            error!(error = %e, user_id = %id, "find user failed");
            return Err(ApiError::Internal("Failed to retrieve user"));
        }
    };

    Ok(Json(ApiResponse::with_data(
        200,
        "User retrieved successfully",
        user.into(),
    )))
}

/// The id is validated before the body is read, so a bad id wins over a bad body.
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    ObjectIdPath(id): ObjectIdPath,
    JsonBody(payload): JsonBody<Map<String, Value>>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let request = UserUpdateRequest::try_from(payload)?;
    if request.is_empty() {
        warn!(user_id = %id, "update without any updatable field");
        return Err(ApiError::BadRequest("No valid fields to update"));
    }

    let password_hash = match request.password {
        Some(plain) => match hash_password(&state.passwords, plain).await {
            Ok(h) => Some(h),
            Err(e) => {
                error!(error = %e, user_id = %id, "hash_password failed");
                return Err(ApiError::Internal("Error hashing password"));
            }
        },
        None => None,
    };

    let changes = UserChanges {
        email: request.email,
        password_hash,
        first_name: request.first_name,
        last_name: request.last_name,
    };

    if let Err(e) = state.users.update(id, &changes).await {
        error!(error = %e, user_id = %id, "update user failed");
        return Err(ApiError::Internal("Failed to update user"));
    }

    info!(user_id = %id, "user updated");
    Ok(Json(ApiResponse::message(200, "User updated successfully")))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    ObjectIdPath(id): ObjectIdPath,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    if let Err(e) = state.users.delete(id).await {
        error!(error = %e, user_id = %id, "delete user failed");
        return Err(ApiError::Internal("Failed to delete user"));
    }

    info!(user_id = %id, "user deleted");
    Ok(Json(ApiResponse::message(200, "User deleted successfully")))
}
