use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::db::UserUpdate;

use super::{ApiError, ApiResponse, AppState, MessageDto, PostDto, UpdatedUserDto, UserDto};

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub image: Option<String>,
}

/// GET /users/user/posts
pub async fn get_user_posts(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<ApiResponse<Vec<PostDto>>>, ApiError> {
    let posts = state
        .store()
        .list_posts_by_user(&ctx.user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list posts: {e}")))?;
    if posts.is_empty() {
        return Err(ApiError::not_found("No posts found for this user."));
    }

    Ok(Json(ApiResponse::success(
        posts.into_iter().map(PostDto::from).collect(),
    )))
}

/// GET /users/user/posts/{post_id}
pub async fn get_user_post(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(post_id): Path<String>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let post = state
        .store()
        .get_post_owned(&post_id, &ctx.user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load post: {e}")))?
        .ok_or_else(ApiError::post_not_found)?;

    Ok(Json(ApiResponse::success(post.into())))
}

/// GET /users/user/profile
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = state
        .store()
        .get_user_by_id(&ctx.user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load user: {e}")))?
        .ok_or_else(|| ApiError::not_found("User not found."))?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// PUT /users/user
/// Partial update; empty or absent fields keep their stored values.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UpdatedUserDto>>, ApiError> {
    let user = state
        .store()
        .get_user_by_id(&ctx.user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load user: {e}")))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let email = non_empty(payload.email);
    if let Some(new_email) = email.as_deref()
        && new_email != user.email
    {
        let taken = state
            .store()
            .get_user_by_email(new_email)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to check email: {e}")))?
            .is_some();
        if taken {
            return Err(ApiError::conflict("Email already registered"));
        }
    }

    let changes = UserUpdate {
        name: non_empty(payload.name),
        email,
        password: non_empty(payload.password),
        image: non_empty(payload.image),
    };

    let security = state.config().read().await.security.clone();
    let updated = state
        .store()
        .update_user(&ctx.user_id, changes, &security)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update user: {e}")))?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(ApiResponse::success(UpdatedUserDto {
        message: "User updated successfully".to_string(),
        user: updated.into(),
    })))
}

/// DELETE /users/user/{user_id}
/// Callers may only delete themselves; posts go with the account.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<MessageDto>>, ApiError> {
    if user_id != ctx.user_id {
        return Err(ApiError::unauthorized(
            "You can only delete your own account",
        ));
    }

    let removed = state
        .store()
        .remove_user(&user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete user: {e}")))?;
    if !removed {
        return Err(ApiError::not_found("User not found."));
    }

    tracing::info!(user_id = %user_id, "User account deleted");

    Ok(Json(ApiResponse::success(MessageDto {
        message: "User deleted successfully.".to_string(),
    })))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
