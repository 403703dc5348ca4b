use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::LINK},
};
use serde::Deserialize;

use crate::auth::AuthContext;

use super::{
    ApiError, ApiResponse, AppState, LoginDto, MessageDto, PaginationDto, PostDto, PostPageDto,
    RegisteredDto,
};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `page` stays a string so a garbage value falls back to page 1
/// instead of bouncing the whole request at the extractor.
#[derive(Deserialize)]
pub struct SearchQuery {
    pub page: Option<String>,
}

#[derive(Deserialize)]
pub struct CategoryQuery {
    #[serde(rename = "type")]
    pub instrument_type: Option<String>,
}

#[derive(Deserialize)]
pub struct TitleQuery {
    pub title: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /home/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegisteredDto>>), ApiError> {
    let (Some(name), Some(email), Some(password)) = (
        non_empty(payload.name),
        non_empty(payload.email),
        non_empty(payload.password),
    ) else {
        return Err(ApiError::validation("Missing name, email or password"));
    };

    let existing = state
        .store()
        .get_user_by_email(&email)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to check email: {e}")))?;
    if existing.is_some() {
        return Err(ApiError::conflict("Email already registered"));
    }

    let security = state.config().read().await.security.clone();
    let user = state
        .store()
        .create_user(&name, &email, &password, &security)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create user: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(RegisteredDto {
            message: "User created successfully".to_string(),
            user_id: user.id,
        })),
    ))
}

/// POST /home/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginDto>>, ApiError> {
    let email = payload.email.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let user = state
        .store()
        .get_user_by_email(&email)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to look up user: {e}")))?
        .ok_or_else(|| ApiError::not_found("Email not found"))?;

    let is_valid = state
        .store()
        .verify_user_password(&email, &password)
        .await
        .map_err(|e| ApiError::internal(format!("Password verification error: {e}")))?;
    if !is_valid {
        return Err(ApiError::unauthorized("Invalid password"));
    }

    let access_token = state.tokens().mint(&user.id)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(ApiResponse::success(LoginDto {
        access_token,
        user_id: user.id,
    })))
}

/// POST /home/logout
/// Revokes the presented token only; the user's other tokens stay live.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(ctx): Extension<AuthContext>,
) -> Json<ApiResponse<MessageDto>> {
    state.revoked_tokens().revoke(&ctx.token_id).await;
    metrics::counter!("auth_tokens_revoked_total").increment(1);
    tracing::info!(user_id = %ctx.user_id, "User logged out");

    Json(ApiResponse::success(MessageDto {
        message: "Logged out successfully".to_string(),
    }))
}

/// GET /home/search?page=N
/// Newest first, fixed page size, RFC 5988 Link header alongside the
/// JSON pagination block.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<(HeaderMap, Json<ApiResponse<PostPageDto>>), ApiError> {
    let page = query
        .page
        .as_deref()
        .and_then(|p| p.parse::<u64>().ok())
        .unwrap_or(1)
        .max(1);
    let per_page = state.config().read().await.pagination.per_page;

    let page_data = state
        .store()
        .page_posts(page, per_page)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to page posts: {e}")))?;

    let next = (page < page_data.pages).then(|| format!("/home/search?page={}", page + 1));
    let prev = (page > 1).then(|| format!("/home/search?page={}", page - 1));

    let mut headers = HeaderMap::new();
    let links: Vec<String> = [
        next.as_ref().map(|url| format!("<{url}>; rel=\"next\"")),
        prev.as_ref().map(|url| format!("<{url}>; rel=\"prev\"")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !links.is_empty()
        && let Ok(value) = HeaderValue::from_str(&links.join(", "))
    {
        headers.insert(LINK, value);
    }

    let dto = PostPageDto {
        posts: page_data.posts.into_iter().map(PostDto::from).collect(),
        pagination: PaginationDto {
            total: page_data.total,
            pages: page_data.pages,
            next,
            prev,
        },
    };

    Ok((headers, Json(ApiResponse::success(dto))))
}

/// GET /home/posts/{post_id}
/// Any authenticated user may read any post.
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let post = state
        .store()
        .get_post(&post_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to load post: {e}")))?
        .ok_or_else(ApiError::post_not_found)?;

    Ok(Json(ApiResponse::success(post.into())))
}

/// GET /home/category?type=Guitar
/// No or empty `type` lists everything.
pub async fn by_category(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<ApiResponse<Vec<PostDto>>>, ApiError> {
    let category = query.instrument_type.as_deref().filter(|t| !t.is_empty());

    let posts = state
        .store()
        .list_posts_by_category(category)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list posts: {e}")))?;

    Ok(Json(ApiResponse::success(
        posts.into_iter().map(PostDto::from).collect(),
    )))
}

/// GET /home/posts/search?title=...
/// Public endpoint, case-insensitive substring match.
pub async fn search_by_title(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TitleQuery>,
) -> Result<Json<ApiResponse<Vec<PostDto>>>, ApiError> {
    let title = query.title.as_deref().unwrap_or("").trim().to_string();
    if title.is_empty() {
        return Err(ApiError::validation("Title query is required"));
    }

    let posts = state
        .store()
        .search_posts_by_title(&title)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to search posts: {e}")))?;
    if posts.is_empty() {
        return Err(ApiError::not_found("No posts found"));
    }

    Ok(Json(ApiResponse::success(
        posts.into_iter().map(PostDto::from).collect(),
    )))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
