use std::time::Duration;

use bytes::Bytes;
use hunter_core::{JobId, MaxResults, StagedImage, StatusUpdate};
use hunter_logging::{hunter_debug, hunter_trace};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use url::Url;

use crate::types::{DownloadResponse, ErrorBody, KeywordRequest, StatusResponse, SubmitResponse};
use crate::{ClientError, TransportKind};

/// Statuses on the download endpoint that mean "bundle not staged yet"
/// (404 not found, 409 conflict, 425 too early).
const NOT_READY_STATUSES: [u16; 3] = [404, 409, 425];

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The four remote operations of the crawl service.
///
/// Implementations are stateless protocol shims: one round trip per call, no
/// retries, no caching.
#[async_trait::async_trait]
pub trait CrawlClient: Send + Sync {
    async fn submit_by_keyword(
        &self,
        keyword: &str,
        max_results: MaxResults,
    ) -> Result<JobId, ClientError>;

    async fn submit_by_upload(
        &self,
        image: StagedImage,
        max_results: MaxResults,
    ) -> Result<JobId, ClientError>;

    /// Idempotent read; safe to call repeatedly and concurrently.
    async fn fetch_status(&self, job_id: &str) -> Result<StatusUpdate, ClientError>;

    /// Resolves the bundle location to an absolute URL.
    async fn fetch_download_url(&self, job_id: &str) -> Result<String, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestCrawlClient {
    base: Url,
    client: reqwest::Client,
}

impl ReqwestCrawlClient {
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        let base = Url::parse(&settings.base_url)
            .map_err(|err| ClientError::transport(TransportKind::InvalidUrl, err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::transport(
                TransportKind::InvalidUrl,
                format!("{base} cannot carry a path"),
            ));
        }
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ClientError::transport(TransportKind::Network, err.to_string()))?;
        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Fetches the bundle archive behind a resolved download URL.
    pub async fn download_bundle(&self, url: &str) -> Result<Bytes, ClientError> {
        let parsed = Url::parse(url)
            .map_err(|err| ClientError::transport(TransportKind::InvalidUrl, err.to_string()))?;
        let response = self.client.get(parsed).send().await.map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        response.bytes().await.map_err(map_reqwest_error)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new` rejected cannot-be-a-base URLs, so segments are always available.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait::async_trait]
impl CrawlClient for ReqwestCrawlClient {
    async fn submit_by_keyword(
        &self,
        keyword: &str,
        max_results: MaxResults,
    ) -> Result<JobId, ClientError> {
        let body = KeywordRequest {
            keyword,
            max_num: max_results.get(),
        };
        let response = self
            .client
            .post(self.endpoint(&["crawl"]))
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let submitted: SubmitResponse = decode(ensure_success(response).await?).await?;
        hunter_debug!("keyword submission accepted as job {}", submitted.job_id);
        Ok(submitted.job_id)
    }

    async fn submit_by_upload(
        &self,
        image: StagedImage,
        max_results: MaxResults,
    ) -> Result<JobId, ClientError> {
        let byte_len = image.bytes.len();
        let mut part = Part::bytes(image.bytes).file_name(image.file_name.clone());
        if let Some(mime) = guess_image_mime(&image.file_name) {
            part = part.mime_str(mime).map_err(map_reqwest_error)?;
        }
        let form = Form::new()
            .part("file", part)
            .text("max_num", max_results.get().to_string());

        hunter_trace!("uploading {} ({byte_len} bytes)", image.file_name);
        let response = self
            .client
            .post(self.endpoint(&["crawl-by-upload"]))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let submitted: SubmitResponse = decode(ensure_success(response).await?).await?;
        hunter_debug!("upload submission accepted as job {}", submitted.job_id);
        Ok(submitted.job_id)
    }

    async fn fetch_status(&self, job_id: &str) -> Result<StatusUpdate, ClientError> {
        let response = self
            .client
            .get(self.endpoint(&["status", job_id]))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status: StatusResponse = decode(ensure_success(response).await?).await?;
        Ok(StatusUpdate::new(status.status.into(), status.msg))
    }

    async fn fetch_download_url(&self, job_id: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .get(self.endpoint(&["download", job_id]))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if NOT_READY_STATUSES.contains(&response.status().as_u16()) {
            let detail = error_detail(response).await;
            return Err(ClientError::NotReady(detail));
        }
        let link: DownloadResponse = decode(ensure_success(response).await?).await?;
        Ok(resolve_bundle_url(&self.base, &link.url))
    }
}

/// Turns the `url` field of a download response into an absolute URL.
///
/// Absolute URLs are kept as is; paths are appended to the service base with
/// exactly one `/` between them, so a base mounted under a prefix keeps it.
pub fn resolve_bundle_url(base: &Url, raw: &str) -> String {
    if Url::parse(raw).is_ok() {
        return raw.to_string();
    }
    let base = base.as_str().trim_end_matches('/');
    let path = raw.trim_start_matches('/');
    format!("{base}/{path}")
}

fn guess_image_mime(file_name: &str) -> Option<&'static str> {
    let (_, ext) = file_name.rsplit_once('.')?;
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = error_detail(response).await;
    Err(ClientError::transport(
        TransportKind::HttpStatus(status.as_u16()),
        detail,
    ))
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    serde_json::from_slice(&body)
        .map_err(|err| ClientError::transport(TransportKind::Decode, err.to_string()))
}

/// Best-effort human-readable reason from an error response.
async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(text) => match serde_json::from_str::<ErrorBody>(&text) {
            Ok(body) => body.detail,
            Err(_) if text.trim().is_empty() => status.to_string(),
            Err(_) => text,
        },
        Err(_) => status.to_string(),
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        return ClientError::transport(TransportKind::Timeout, err.to_string());
    }
    if err.is_builder() {
        return ClientError::transport(TransportKind::InvalidRequest, err.to_string());
    }
    ClientError::transport(TransportKind::Network, err.to_string())
}
