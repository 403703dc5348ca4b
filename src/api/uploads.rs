use std::sync::Arc;

use axum::{
    Json,
    body::Bytes,
    extract::{Multipart, State},
};
use tokio::fs;
use uuid::Uuid;

use super::{
    ApiError, ApiResponse, AppState, MessageDto, UploadDto,
    validation::{has_allowed_extension, sanitize_filename},
};

/// GET /splash
pub async fn splash() -> Json<ApiResponse<MessageDto>> {
    Json(ApiResponse::success(MessageDto {
        message: "Welcome to Renty".to_string(),
    }))
}

/// POST /upload
/// Accepts one multipart field named `file`, keeps only a sanitized
/// basename, and refuses anything that is not a png/jpg/jpeg. A name
/// that is already taken gets a short random prefix rather than
/// clobbering the existing file.
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadDto>>, ApiError> {
    let mut file: Option<(String, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let filename = field.file_name().unwrap_or("").to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::validation(format!("Failed to read upload: {e}")))?;
            file = Some((filename, bytes));
            break;
        }
    }

    let Some((filename, bytes)) = file else {
        return Err(ApiError::validation("No file part"));
    };
    if filename.is_empty() {
        return Err(ApiError::validation("No selected file"));
    }
    if !has_allowed_extension(&filename) {
        return Err(ApiError::validation("File type not allowed"));
    }

    let safe_name = sanitize_filename(&filename);
    if safe_name.is_empty() {
        return Err(ApiError::validation("No selected file"));
    }

    let upload_dir = state.upload_dir().await;
    fs::create_dir_all(&upload_dir)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create upload dir: {e}")))?;

    let mut final_name = safe_name;
    if upload_dir.join(&final_name).exists() {
        let prefix = Uuid::new_v4().to_string();
        final_name = format!("{}_{final_name}", &prefix[..8]);
    }

    let target = upload_dir.join(&final_name);
    fs::write(&target, &bytes)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store upload: {e}")))?;

    tracing::info!(filename = %final_name, bytes = bytes.len(), "Stored upload");

    Ok(Json(ApiResponse::success(UploadDto {
        filename: final_name,
    })))
}
