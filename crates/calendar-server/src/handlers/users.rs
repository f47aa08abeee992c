use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use calendar_shared::{api::ApiResponse, User};
use serde_json::Value;

use crate::db::{NewUser, StoreError};
use crate::error::AppError;
use crate::routes::AppState;
use crate::validation::validate_create_user;

use super::parse_id;

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    let users = state.users.list_users().await?;
    Ok(Json(ApiResponse::ok(users)))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = match parse_id(&id) {
        Some(id) => state.users.find_user(id).await?,
        None => None,
    }
    .ok_or(AppError::NotFound("User not found"))?;

    Ok(Json(ApiResponse::ok(user)))
}

fn already_exists(user: User) -> (StatusCode, Json<ApiResponse<User>>) {
    (
        StatusCode::OK,
        Json(ApiResponse::ok(user).with_message("User already exists")),
    )
}

/// POST /api/users
///
/// Signing up twice with the same email returns the first account.
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let Json(body) = payload?;
    let input = validate_create_user(&body)?;

    if let Some(existing) = state.users.find_user_by_email(&input.email).await? {
        return Ok(already_exists(existing));
    }

    let created = state
        .users
        .create_user(NewUser {
            name: input.name,
            email: input.email.clone(),
        })
        .await;

    match created {
        Ok(user) => {
            tracing::info!(user_id = %user.id, "User created");
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::ok(user).with_message("User created successfully")),
            ))
        }
        // Lost a race with a concurrent signup for the same email
        Err(StoreError::UniqueViolation(_)) => state
            .users
            .find_user_by_email(&input.email)
            .await?
            .map(already_exists)
            .ok_or(AppError::NotFound("User not found")),
        Err(e) => Err(e.into()),
    }
}
