use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::db::{NewPost, PostUpdate};
use crate::models::listing::{Availability, attempt_transition};

use super::{
    ApiError, ApiResponse, AppState, CreatedPostDto, MessageDto, PostPayload, UpdatedPostDto,
    validation::validate_post_input,
};

#[derive(Deserialize)]
pub struct MarkAvailabilityRequest {
    pub availability: Option<String>,
}

/// POST /posts/create
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<PostPayload>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedPostDto>>), ApiError> {
    let upload_dir = state.upload_dir().await;
    let price = validate_post_input(&payload, &upload_dir)?;

    let new_post = NewPost {
        user_id: ctx.user_id,
        instrument_type: payload.instrument_type.unwrap_or_default(),
        brand: payload.brand.unwrap_or_default(),
        title: payload.title.unwrap_or_default(),
        price,
        description: non_empty(payload.description),
        phone_number: payload.phone_number.unwrap_or_default(),
        image: non_empty(payload.image),
        status: payload.status.unwrap_or_default(),
        location: payload.location.unwrap_or_default(),
    };

    let post = state
        .store()
        .create_post(new_post)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create post: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(CreatedPostDto {
            message: "Post created successfully".to_string(),
            post_id: post.id,
        })),
    ))
}

/// PUT /posts/posts/{post_id}
/// Owner only. The whole payload must validate even though only the
/// supplied fields are written; `status` may be echoed back but never
/// changed.
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(post_id): Path<String>,
    Json(payload): Json<PostPayload>,
) -> Result<Json<ApiResponse<UpdatedPostDto>>, ApiError> {
    let post = state
        .store()
        .get_post_owned(&post_id, &ctx.user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load post: {e}")))?
        .ok_or_else(|| ApiError::not_found("Post not found"))?;

    let upload_dir = state.upload_dir().await;
    let price = validate_post_input(&payload, &upload_dir)?;

    if let Some(status) = payload.status.as_deref()
        && status != post.status
    {
        return Err(ApiError::validation(
            "Status cannot be changed after creation",
        ));
    }

    let changes = PostUpdate {
        instrument_type: non_empty(payload.instrument_type),
        title: non_empty(payload.title),
        brand: non_empty(payload.brand),
        price: Some(price),
        phone_number: non_empty(payload.phone_number),
        description: non_empty(payload.description),
        image: non_empty(payload.image),
        location: non_empty(payload.location),
    };

    let updated = state
        .store()
        .update_post_fields(post, changes)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update post: {e}")))?;

    Ok(Json(ApiResponse::success(UpdatedPostDto {
        message: "Post updated successfully".to_string(),
        post: updated.into(),
    })))
}

/// DELETE /posts/posts/{post_id}
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(post_id): Path<String>,
) -> Result<Json<ApiResponse<MessageDto>>, ApiError> {
    let deleted = state
        .store()
        .delete_post_owned(&post_id, &ctx.user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete post: {e}")))?;
    if !deleted {
        return Err(ApiError::not_found("Post not found"));
    }

    tracing::info!(post_id = %post_id, user_id = %ctx.user_id, "Post deleted");

    Ok(Json(ApiResponse::success(MessageDto {
        message: "Post deleted successfully.".to_string(),
    })))
}

/// PATCH /posts/{post_id}/status
/// Moves a post through the availability lifecycle.
pub async fn mark_availability(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
    Path(post_id): Path<String>,
    Json(payload): Json<MarkAvailabilityRequest>,
) -> Result<Json<ApiResponse<UpdatedPostDto>>, ApiError> {
    let requested = payload
        .availability
        .ok_or_else(|| ApiError::validation("Availability is required."))?;

    // Value screening runs before the lookup so a bad value on a
    // missing post still reads as a bad request, not a 404.
    Availability::from_request(&requested)?;

    let post = state
        .store()
        .get_post_owned(&post_id, &ctx.user_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load post: {e}")))?
        .ok_or_else(ApiError::post_not_found)?;

    let availability = attempt_transition(&post.status, &post.availability, &requested)?;

    let updated = state
        .store()
        .set_post_availability(post, availability)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update availability: {e}")))?;

    tracing::info!(post_id = %updated.id, availability = %availability, "Post availability changed");

    Ok(Json(ApiResponse::success(UpdatedPostDto {
        message: format!("Post marked as {availability}"),
        post: updated.into(),
    })))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
