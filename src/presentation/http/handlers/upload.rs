//! Image Upload Handler
//!
//! Accepts a multipart image upload, writes it into the configured upload
//! directory under a generated name, and returns the public URL. The
//! files themselves are served statically from `/uploads`.

use std::path::Path;

use axum::{
    extract::{Extension, Multipart, State},
    Json,
};
use chrono::Utc;

use crate::application::dto::response::UploadResponse;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Allowed image file extensions
const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Upload an image
pub async fn upload_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let extension = Path::new(&filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(AppError::BadRequest(
                "Only .png, .jpg, .jpeg, .webp images are allowed".into(),
            ));
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(AppError::BadRequest(
                "Only .png, .jpg, .jpeg, .webp images are allowed".into(),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        if data.len() > state.settings.upload.max_file_size {
            return Err(AppError::BadRequest("File too large".into()));
        }

        let stored_name = format!(
            "image-{}-{}.{}",
            Utc::now().timestamp_millis(),
            rand::random::<u32>(),
            extension
        );
        let dest = Path::new(&state.settings.upload.dir).join(&stored_name);

        tokio::fs::write(&dest, &data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

        tracing::info!(
            user_id = %auth.user_id,
            file = %stored_name,
            size = data.len(),
            "Image uploaded"
        );

        return Ok(Json(UploadResponse {
            image_url: format!("/uploads/{}", stored_name),
        }));
    }

    Err(AppError::BadRequest("No file uploaded".into()))
}
