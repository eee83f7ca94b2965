//! Client for a Cloudflare Stream compatible video API.
//!
//! Every call goes to `{api_base_url}/accounts/{account_id}/stream...` with a bearer token. The
//! API wraps every payload in an envelope:
//!
//! ```json
//! { "success": true, "errors": [], "result": { ... } }
//! ```
//!
//! A non-2xx status or `success: false` becomes [`VideoError::Api`] carrying the first provider
//! message. Playback and thumbnail URLs are built locally from the customer delivery host and
//! never need a request.

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use url::Url;
use utoipa::ToSchema;

use crate::config::VideoConfig;
use crate::errors::Error;

pub type Result<T> = std::result::Result<T, VideoError>;

#[derive(Debug, thiserror::Error)]
pub enum VideoError {
    /// The provider answered with an error
    #[error("Video API error: {0}")]
    Api(String),

    #[error("Video API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid video id: {0}")]
    InvalidUid(String),
}

impl From<VideoError> for Error {
    fn from(err: VideoError) -> Self {
        match err {
            VideoError::InvalidUid(uid) => Error::BadRequest {
                message: format!("Invalid video id '{uid}'"),
            },
            other => Error::ServiceUnavailable {
                service: "Video API".to_string(),
                message: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

/// A one-time URL a browser can upload a video file to directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DirectUpload {
    pub uid: String,
    #[serde(alias = "uploadURL")]
    pub upload_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PlaybackUrls {
    pub hls: String,
    pub dash: String,
    pub iframe: String,
}

/// Processing state of a video.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct VideoStatus {
    pub uid: String,
    pub ready_to_stream: bool,
    /// Provider state, e.g. `pendingupload`, `inprogress`, `ready`, `error`
    pub state: Option<String>,
    pub pct_complete: Option<f64>,
    /// Seconds; negative while unknown
    pub duration: Option<f64>,
    pub thumbnail_url: Option<String>,
    pub playback: Option<PlaybackUrls>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVideo {
    uid: String,
    #[serde(default)]
    ready_to_stream: bool,
    #[serde(default)]
    status: Option<RawStatus>,
    #[serde(default)]
    duration: Option<f64>,
    #[serde(default)]
    thumbnail: Option<String>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatus {
    state: Option<String>,
    // Sent as a string such as "42.500000"
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pct_complete: Option<f64>,
}

/// Authenticated client for one account's videos.
#[derive(Debug, Clone)]
pub struct VideoClient {
    client: reqwest::Client,
    config: VideoConfig,
}

impl VideoClient {
    pub fn new(config: VideoConfig) -> Result<Self> {
        let client = crate::http::client(config.request_timeout)?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let relative = format!("accounts/{}/stream{path}", self.config.account_id);
        self.config
            .api_base_url
            .join(&relative)
            .map_err(|e| VideoError::Api(format!("invalid endpoint {relative}: {e}")))
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<Option<T>> {
        let response = request.bearer_auth(&self.config.api_token).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope = serde_json::from_str::<Envelope<T>>(&body);
        match envelope {
            Ok(envelope) if status.is_success() && envelope.success => Ok(envelope.result),
            Ok(envelope) => {
                let message = envelope
                    .errors
                    .first()
                    .map(|e| match e.code {
                        Some(code) => format!("{} (code {code})", e.message),
                        None => e.message.clone(),
                    })
                    .unwrap_or_else(|| format!("HTTP {status}"));
                tracing::warn!(%status, %message, "Video API call failed");
                Err(VideoError::Api(message))
            }
            Err(e) if status.is_success() => Err(VideoError::Api(format!("unexpected response body: {e}"))),
            Err(_) => {
                tracing::warn!(%status, "Video API call failed without an error envelope");
                Err(VideoError::Api(format!("HTTP {status}")))
            }
        }
    }

    async fn send_result<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .ok_or_else(|| VideoError::Api("response had no result".to_string()))
    }

    /// Ask for a one-time upload URL. The video is capped at `max_duration_seconds`.
    #[tracing::instrument(skip(self), err)]
    pub async fn create_direct_upload(&self, max_duration_seconds: u32) -> Result<DirectUpload> {
        let request = self
            .client
            .post(self.endpoint("/direct_upload")?)
            .json(&json!({ "maxDurationSeconds": max_duration_seconds }));
        self.send_result(request).await
    }

    /// Have the provider fetch a video from a public URL.
    #[tracing::instrument(skip(self), err)]
    pub async fn copy_from_url(&self, url: &str, name: Option<&str>) -> Result<VideoStatus> {
        let mut body = json!({ "url": url });
        if let Some(name) = name {
            body["meta"] = json!({ "name": name });
        }
        let request = self.client.post(self.endpoint("/copy")?).json(&body);
        let raw: RawVideo = self.send_result(request).await?;
        Ok(self.to_status(raw))
    }

    /// Current processing state of a video.
    #[tracing::instrument(skip(self), err)]
    pub async fn get_video(&self, uid: &str) -> Result<VideoStatus> {
        validate_uid(uid)?;
        let request = self.client.get(self.endpoint(&format!("/{uid}"))?);
        let raw: RawVideo = self.send_result(request).await?;
        Ok(self.to_status(raw))
    }

    #[tracing::instrument(skip(self), err)]
    pub async fn delete_video(&self, uid: &str) -> Result<()> {
        validate_uid(uid)?;
        let request = self.client.delete(self.endpoint(&format!("/{uid}"))?);
        self.send::<serde_json::Value>(request).await?;
        Ok(())
    }

    pub fn playback_urls(&self, uid: &str) -> PlaybackUrls {
        let base = self.delivery_base(uid);
        PlaybackUrls {
            hls: format!("{base}/manifest/video.m3u8"),
            dash: format!("{base}/manifest/video.mpd"),
            iframe: format!("{base}/iframe"),
        }
    }

    /// Still frame at `time_seconds`, scaled to `height` pixels when given.
    pub fn thumbnail_url(&self, uid: &str, time_seconds: f64, height: Option<u32>) -> String {
        let mut url = format!("{}/thumbnails/thumbnail.jpg?time={time_seconds}s", self.delivery_base(uid));
        if let Some(height) = height {
            url.push_str(&format!("&height={height}"));
        }
        url
    }

    fn delivery_base(&self, uid: &str) -> String {
        let host = self
            .config
            .customer_subdomain
            .trim_start_matches("https://")
            .trim_end_matches('/');
        format!("https://{host}/{uid}")
    }

    fn to_status(&self, raw: RawVideo) -> VideoStatus {
        let (state, pct_complete) = raw.status.map(|s| (s.state, s.pct_complete)).unwrap_or_default();
        VideoStatus {
            ready_to_stream: raw.ready_to_stream,
            state,
            pct_complete,
            duration: raw.duration,
            thumbnail_url: raw.thumbnail.or_else(|| Some(self.thumbnail_url(&raw.uid, 0.0, None))),
            playback: Some(self.playback_urls(&raw.uid)),
            uid: raw.uid,
        }
    }
}

/// Provider uids are 32 hex characters; anything else would end up in a request path.
fn validate_uid(uid: &str) -> Result<()> {
    if !uid.is_empty() && uid.len() <= 64 && uid.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(VideoError::InvalidUid(uid.to_string()))
    }
}
