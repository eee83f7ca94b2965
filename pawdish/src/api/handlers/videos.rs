//! HTTP handlers wrapping the video streaming API.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;

use crate::{
    AppState,
    api::models::videos::{CopyVideoRequest, DirectUploadRequest},
    auth::permissions::{RequiresPermission, operation, resource},
    errors::{Error, Result},
    video::{DirectUpload, VideoClient, VideoStatus},
};

fn client(state: &AppState) -> Result<Arc<VideoClient>> {
    state.video.clone().ok_or_else(|| Error::ServiceUnavailable {
        service: "Video API".to_string(),
        message: "Video streaming is not configured".to_string(),
    })
}

/// One-time URL the admin UI uploads the video file to directly.
#[utoipa::path(
    post,
    path = "/videos/direct-upload",
    tag = "videos",
    summary = "Create direct upload URL",
    request_body = DirectUploadRequest,
    responses(
        (status = 201, description = "Upload URL created", body = DirectUpload),
        (status = 503, description = "Video API not configured or failing")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_direct_upload(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Videos, operation::CreateAll>,
    Json(request): Json<DirectUploadRequest>,
) -> Result<(StatusCode, Json<DirectUpload>)> {
    if request.max_duration_seconds == 0 {
        return Err(Error::BadRequest {
            message: "max_duration_seconds must be positive".to_string(),
        });
    }
    let upload = client(&state)?.create_direct_upload(request.max_duration_seconds).await?;
    Ok((StatusCode::CREATED, Json(upload)))
}

#[utoipa::path(
    post,
    path = "/videos/copy",
    tag = "videos",
    summary = "Import video from URL",
    request_body = CopyVideoRequest,
    responses(
        (status = 201, description = "Import started", body = VideoStatus),
        (status = 400, description = "Invalid URL"),
        (status = 503, description = "Video API not configured or failing")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn copy_video(
    State(state): State<AppState>,
    _: RequiresPermission<resource::Videos, operation::CreateAll>,
    Json(request): Json<CopyVideoRequest>,
) -> Result<(StatusCode, Json<VideoStatus>)> {
    let source = url::Url::parse(&request.url).map_err(|e| Error::BadRequest {
        message: format!("Invalid video URL: {e}"),
    })?;
    if !matches!(source.scheme(), "http" | "https") {
        return Err(Error::BadRequest {
            message: "Video URL must be http or https".to_string(),
        });
    }

    let status = client(&state)?.copy_from_url(source.as_str(), request.name.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(status)))
}

/// Poll processing state. Playback URLs only resolve once `ready_to_stream` is true.
#[utoipa::path(
    get,
    path = "/videos/{uid}",
    tag = "videos",
    summary = "Get video status",
    params(("uid" = String, Path, description = "Video UID")),
    responses(
        (status = 200, description = "Video status", body = VideoStatus),
        (status = 400, description = "Malformed UID"),
        (status = 503, description = "Video API not configured or failing")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(uid = %uid))]
pub async fn get_video(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    _: RequiresPermission<resource::Videos, operation::ReadAll>,
) -> Result<Json<VideoStatus>> {
    let status = client(&state)?.get_video(&uid).await?;
    Ok(Json(status))
}

#[utoipa::path(
    delete,
    path = "/videos/{uid}",
    tag = "videos",
    summary = "Delete video",
    params(("uid" = String, Path, description = "Video UID")),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 400, description = "Malformed UID"),
        (status = 503, description = "Video API not configured or failing")
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all, fields(uid = %uid))]
pub async fn delete_video(
    State(state): State<AppState>,
    Path(uid): Path<String>,
    _: RequiresPermission<resource::Videos, operation::DeleteAll>,
) -> Result<StatusCode> {
    client(&state)?.delete_video(&uid).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Role;
    use crate::config::VideoConfig;
    use crate::test_utils::{add_auth_headers, create_test_app, create_test_app_with_config, create_test_config, create_test_user};
    use serde_json::json;
    use sqlx::PgPool;
    use std::time::Duration;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    const UID: &str = "ea95132c15732412d22c1476fa83f27a";

    #[sqlx::test]
    #[test_log::test]
    async fn test_unconfigured_video_api_is_unavailable(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let headers = add_auth_headers(&admin, &config);

        server
            .post("/admin/api/v1/videos/direct-upload")
            .add_header(&headers[0].0, &headers[0].1)
            .json(&json!({}))
            .await
            .assert_status(StatusCode::SERVICE_UNAVAILABLE);
        server
            .get(&format!("/admin/api/v1/videos/{UID}"))
            .add_header(&headers[0].0, &headers[0].1)
            .await
            .assert_status(StatusCode::SERVICE_UNAVAILABLE);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_direct_upload_and_status_through_api(pool: PgPool) {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/client/v4/accounts/acct/stream/direct_upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": { "uid": UID, "uploadURL": "https://upload.example.com/one-time" }
            })))
            .mount(&mock)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/client/v4/accounts/acct/stream/{UID}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "errors": [],
                "result": { "uid": UID, "readyToStream": true, "status": { "state": "ready", "pctComplete": "100" }, "duration": 12.5 }
            })))
            .mount(&mock)
            .await;

        let mut config = create_test_config();
        config.video = Some(VideoConfig {
            api_base_url: url::Url::parse(&format!("{}/client/v4/", mock.uri())).unwrap(),
            account_id: "acct".to_string(),
            api_token: "token".to_string(),
            customer_subdomain: "customer-xyz.cloudflarestream.com".to_string(),
            request_timeout: Duration::from_secs(5),
        });
        let (server, state) = create_test_app_with_config(pool.clone(), config).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let headers = add_auth_headers(&admin, &state.config);

        let response = server
            .post("/admin/api/v1/videos/direct-upload")
            .add_header(&headers[0].0, &headers[0].1)
            .json(&json!({ "max_duration_seconds": 300 }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let upload: serde_json::Value = response.json();
        assert_eq!(upload["upload_url"], "https://upload.example.com/one-time");

        let status: serde_json::Value = server
            .get(&format!("/admin/api/v1/videos/{UID}"))
            .add_header(&headers[0].0, &headers[0].1)
            .await
            .json();
        assert_eq!(status["ready_to_stream"], true);
        assert_eq!(status["pct_complete"], 100.0);
        assert_eq!(
            status["playback"]["hls"],
            format!("https://customer-xyz.cloudflarestream.com/{UID}/manifest/video.m3u8")
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_copy_rejects_non_http_urls(pool: PgPool) {
        let (server, config) = create_test_app(pool.clone()).await;
        let admin = create_test_user(&pool, Role::Admin).await;
        let headers = add_auth_headers(&admin, &config);

        server
            .post("/admin/api/v1/videos/copy")
            .add_header(&headers[0].0, &headers[0].1)
            .json(&json!({ "url": "file:///etc/passwd" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
