use axum::{
    Json,
    extract::{Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
};
use serde_json::Value;
use uuid::Uuid;

use super::{now, to_document};
use crate::{
    AppState,
    auth::AuthUser,
    collections::MEDIA,
    error::{ApiError, ApiResult},
    models::{MediaRecord, MessageResponse},
    repository::{Document, Filter, FindOptions},
};

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("File is too large".to_string())
    } else {
        ApiError::BadRequest(format!("invalid multipart body: {}", err.body_text()))
    }
}

/// object_key
///
/// `uploads/<uuid>.<ext>`, keeping a short alphanumeric extension from the
/// client-side name when there is one.
pub fn object_key(filename: &str) -> String {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });

    match ext {
        Some(ext) => format!("uploads/{}.{}", Uuid::new_v4(), ext),
        None => format!("uploads/{}", Uuid::new_v4()),
    }
}

/// upload_file
///
/// [Admin Route] Accepts a multipart body with a `file` field, stores the bytes
/// in the blob store and records the upload in `media`.
#[utoipa::path(
    post,
    path = "/api/admin/upload",
    responses(
        (status = 201, description = "Uploaded", body = MediaRecord),
        (status = 400, description = "No file field"),
        (status = 413, description = "File is too large")
    )
)]
pub async fn upload_file(
    user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<MediaRecord>)> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        if bytes.is_empty() {
            return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
        }
        if bytes.len() > state.config.upload_max_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "File exceeds the {} byte limit",
                state.config.upload_max_bytes
            )));
        }

        let key = object_key(&filename);
        let size = bytes.len() as u64;
        let url = state
            .storage
            .put_object(&key, &content_type, bytes.to_vec())
            .await?;

        let record = MediaRecord {
            id: Uuid::new_v4().to_string(),
            filename,
            key,
            url,
            content_type,
            size,
            created_at: now(),
        };
        state.repo.insert(MEDIA, to_document(&record)?).await?;

        tracing::info!(key = %record.key, size, by = %user.username, "file uploaded");
        return Ok((StatusCode::CREATED, Json(record)));
    }

    Err(ApiError::BadRequest("Missing 'file' field".to_string()))
}

#[utoipa::path(
    get,
    path = "/api/admin/media",
    responses((status = 200, description = "Uploaded files, newest first", body = [MediaRecord]))
)]
pub async fn list_media(
    _user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Document>>> {
    let media = state
        .repo
        .find(MEDIA, &Filter::new(), FindOptions::default().newest_first())
        .await?;
    Ok(Json(media))
}

/// delete_media
///
/// [Admin Route] Removes the stored blob, then its record.
#[utoipa::path(
    delete,
    path = "/api/admin/media/{id}",
    params(("id" = String, Path, description = "Media record id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Media not found")
    )
)]
pub async fn delete_media(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let record = state
        .repo
        .find_one(MEDIA, &Filter::by_id(&id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Media not found".to_string()))?;

    if let Some(Value::String(key)) = record.get("key") {
        state.storage.delete_object(key).await?;
    }
    state.repo.delete(MEDIA, &Filter::by_id(&id)).await?;

    tracing::info!(media_id = %id, by = %user.username, "media deleted");
    Ok(Json(MessageResponse::new("Deleted")))
}
