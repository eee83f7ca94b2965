//! HTTP handlers for media uploads.

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use bytes::BytesMut;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState,
    api::models::uploads::{UploadForm, UploadResponse},
    auth::permissions::{RequiresPermission, operation, resource},
    errors::{Error, Result},
    storage::{extension_for, is_allowed_content_type, object_key, validate_key},
    validation::is_valid_folder,
};

const DEFAULT_FOLDER: &str = "uploads";

struct PendingFile {
    bytes: BytesMut,
    content_type: String,
    file_name: Option<String>,
}

/// Accepts a single image or video in the `file` field. The object key is generated server side.
#[utoipa::path(
    post,
    path = "/uploads",
    tag = "uploads",
    summary = "Upload media",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = UploadResponse),
        (status = 400, description = "Missing file, bad folder or unsupported content type"),
        (status = 413, description = "Payload too large"),
        (status = 503, description = "Storage backend unavailable")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn upload_media(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Uploads, operation::CreateAll>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let max_file_size = state.config.storage.max_file_size;
    let mut folder: Option<String> = None;
    let mut file: Option<PendingFile> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "folder" => {
                let value = field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read folder: {e}"),
                })?;
                folder = Some(value.trim().to_string());
            }
            "file" => {
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                if !is_allowed_content_type(&content_type) {
                    return Err(Error::BadRequest {
                        message: format!("Unsupported content type '{content_type}': only images and videos are accepted"),
                    });
                }
                let file_name = field.file_name().map(str::to_string);

                let mut bytes = BytesMut::new();
                while let Some(chunk) = field.chunk().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read file chunk: {e}"),
                })? {
                    if (bytes.len() + chunk.len()) as u64 > max_file_size {
                        tracing::warn!(max_file_size, "Upload exceeds size limit, aborting");
                        return Err(Error::PayloadTooLarge {
                            message: format!(
                                "File size exceeds maximum allowed size of {} bytes ({} MB)",
                                max_file_size,
                                max_file_size / (1024 * 1024)
                            ),
                        });
                    }
                    bytes.extend_from_slice(&chunk);
                }

                file = Some(PendingFile {
                    bytes,
                    content_type,
                    file_name,
                });
            }
            other => {
                tracing::debug!(field = other, "Ignoring unknown multipart field");
            }
        }
    }

    let file = file.ok_or_else(|| Error::BadRequest {
        message: "Missing 'file' field".to_string(),
    })?;
    if file.bytes.is_empty() {
        return Err(Error::BadRequest {
            message: "Uploaded file is empty".to_string(),
        });
    }

    let folder = folder.filter(|f| !f.is_empty()).unwrap_or_else(|| DEFAULT_FOLDER.to_string());
    if !is_valid_folder(&folder) {
        return Err(Error::BadRequest {
            message: format!("Invalid folder '{folder}': use lowercase letters, digits and '-'"),
        });
    }

    let extension = extension_for(&file.content_type, file.file_name.as_deref());
    let key = object_key(&folder, &extension, Utc::now(), Uuid::new_v4());
    let size_bytes = file.bytes.len() as u64;

    state.storage.put(&key, file.bytes.freeze(), &file.content_type).await?;
    tracing::info!(key = %key, size_bytes, content_type = %file.content_type, "Stored upload");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            url: state.storage.public_url(&key),
            key,
            content_type: file.content_type,
            size_bytes,
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/uploads/{key}",
    tag = "uploads",
    summary = "Delete media",
    params(("key" = String, Path, description = "Object key returned by the upload")),
    responses(
        (status = 204, description = "Object deleted, or already absent"),
        (status = 400, description = "Invalid key")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(key = %key))]
pub async fn delete_media(
    State(state): State<AppState>,
    Path(key): Path<String>,
    _: RequiresPermission<resource::Uploads, operation::DeleteAll>,
) -> Result<StatusCode> {
    validate_key(&key)?;
    state.storage.delete(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::config::StorageBackendConfig;
    use crate::test_utils::{add_auth_headers, create_test_app_with_config, create_test_config, create_test_user};
    use axum_test::multipart::{MultipartForm, Part};
    use sqlx::PgPool;

    fn media_root(config: &crate::config::Config) -> std::path::PathBuf {
        match &config.storage.backend {
            StorageBackendConfig::Local { path, .. } => path.clone(),
            StorageBackendConfig::S3 { .. } => unreachable!("tests use local storage"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_upload_then_delete(pool: PgPool) {
        let config = create_test_config();
        let root = media_root(&config);
        let (server, state) = create_test_app_with_config(pool.clone(), config).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let headers = add_auth_headers(&admin, &state.config);

        let form = MultipartForm::new().add_text("folder", "recipe-images").add_part(
            "file",
            Part::bytes(b"\x89PNG fake image".to_vec())
                .file_name("chicken.png")
                .mime_type("image/png"),
        );
        let response = server
            .post("/admin/api/v1/uploads")
            .add_header(&headers[0].0, &headers[0].1)
            .multipart(form)
            .await;
        response.assert_status(StatusCode::CREATED);
        let upload: UploadResponse = response.json();

        assert!(upload.key.starts_with("recipe-images/"));
        assert!(upload.key.ends_with(".png"));
        assert!(upload.url.ends_with(&upload.key));
        assert_eq!(upload.size_bytes, 15);
        assert!(root.join(&upload.key).exists());

        server
            .delete(&format!("/admin/api/v1/uploads/{}", upload.key))
            .add_header(&headers[0].0, &headers[0].1)
            .await
            .assert_status(StatusCode::NO_CONTENT);
        assert!(!root.join(&upload.key).exists());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_rejects_non_media_and_bad_folder(pool: PgPool) {
        let (server, state) = create_test_app_with_config(pool.clone(), create_test_config()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let headers = add_auth_headers(&admin, &state.config);

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(b"#!/bin/sh".to_vec()).file_name("run.sh").mime_type("text/x-shellscript"),
        );
        server
            .post("/admin/api/v1/uploads")
            .add_header(&headers[0].0, &headers[0].1)
            .multipart(form)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        let form = MultipartForm::new()
            .add_text("folder", "../etc")
            .add_part("file", Part::bytes(b"img".to_vec()).file_name("a.jpg").mime_type("image/jpeg"));
        server
            .post("/admin/api/v1/uploads")
            .add_header(&headers[0].0, &headers[0].1)
            .multipart(form)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_oversized_upload_rejected(pool: PgPool) {
        let mut config = create_test_config();
        config.storage.max_file_size = 8;
        let (server, state) = create_test_app_with_config(pool.clone(), config).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let headers = add_auth_headers(&admin, &state.config);

        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(vec![0u8; 64]).file_name("big.webp").mime_type("image/webp"),
        );
        server
            .post("/admin/api/v1/uploads")
            .add_header(&headers[0].0, &headers[0].1)
            .multipart(form)
            .await
            .assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    }
}
