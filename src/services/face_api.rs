use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::config::{ApiMode, AppConfig};
use crate::models::tryon::PhotoUpload;

const PROCESS_PATH: &str = "/rest_api/process";
const RESULT_PATH: &str = "/rest_api/process_result";

const SUBMIT_TIMEOUT: Duration = Duration::from_secs(120);
const POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for the Deep-Image try-on API.
pub struct FaceApiClient {
    http: Client,
    base_url: String,
    api_key: String,
    mode: ApiMode,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl FaceApiClient {
    pub fn new(http: Client, config: &AppConfig) -> Self {
        Self {
            http,
            base_url: config.face_api_base_url.trim_end_matches('/').to_string(),
            api_key: config.face_api_key.clone(),
            mode: config.face_api_mode,
            poll_attempts: config.poll_attempts,
            poll_interval: config.poll_interval(),
        }
    }

    pub fn mode(&self) -> ApiMode {
        self.mode
    }

    /// Run a try-on of `photo` onto the garment at `target_url` and return the result URL.
    pub async fn try_on(&self, photo: &PhotoUpload, target_url: &str) -> Result<String, FaceApiError> {
        let start = Instant::now();

        let result = match self.mode {
            ApiMode::Sync => self.process_sync(photo, target_url).await,
            ApiMode::Poll => {
                let job_id = self.submit(photo, target_url).await?;
                self.poll(&job_id).await
            }
        };

        metrics::histogram!("tryon_upstream_seconds").record(start.elapsed().as_secs_f64());
        result
    }

    /// One-shot processing: the response carries the result URL.
    pub async fn process_sync(
        &self,
        photo: &PhotoUpload,
        target_url: &str,
    ) -> Result<String, FaceApiError> {
        let response = self
            .http
            .post(self.url(RESULT_PATH))
            .header("x-api-key", &self.api_key)
            .multipart(build_form(photo, target_url)?)
            .timeout(SUBMIT_TIMEOUT)
            .send()
            .await?;

        let body = check_status(response, Stage::Process).await?;
        extract_result_url(&body, &["result_url", "url"])
            .ok_or(FaceApiError::MissingResultUrl { raw: body })
    }

    /// Submit a processing job and return its id.
    pub async fn submit(&self, photo: &PhotoUpload, target_url: &str) -> Result<String, FaceApiError> {
        let response = self
            .http
            .post(self.url(PROCESS_PATH))
            .header("x-api-key", &self.api_key)
            .multipart(build_form(photo, target_url)?)
            .timeout(SUBMIT_TIMEOUT)
            .send()
            .await?;

        let body = check_status(response, Stage::Process).await?;
        let job_id = match body.get("id") {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            _ => return Err(FaceApiError::MissingJobId { raw: body }),
        };

        tracing::info!(job_id = %job_id, "Face API job submitted");
        Ok(job_id)
    }

    /// Poll a submitted job until a result URL shows up or the attempt budget runs out.
    pub async fn poll(&self, job_id: &str) -> Result<String, FaceApiError> {
        let mut last = Value::Null;

        for attempt in 1..=self.poll_attempts {
            metrics::counter!("tryon_poll_attempts_total").increment(1);

            let response = self
                .http
                .post(self.url(RESULT_PATH))
                .header("x-api-key", &self.api_key)
                .json(&serde_json::json!({ "id": job_id }))
                .timeout(POLL_TIMEOUT)
                .send()
                .await?;

            let body = check_status(response, Stage::Result).await?;
            if let Some(url) = extract_result_url(&body, &["url"]) {
                tracing::info!(job_id = %job_id, attempt, "Face API job finished");
                return Ok(url);
            }

            tracing::debug!(job_id = %job_id, attempt, "Face API job not ready");
            last = body;

            if attempt < self.poll_attempts {
                sleep(self.poll_interval).await;
            }
        }

        tracing::warn!(
            job_id = %job_id,
            attempts = self.poll_attempts,
            "Face API job produced no result URL"
        );
        Err(FaceApiError::MissingResultUrl { raw: last })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn build_form(photo: &PhotoUpload, target_url: &str) -> Result<Form, FaceApiError> {
    let parameters = serde_json::json!({
        "enhancements": ["denoise", "deblur", "light"],
        "url": target_url,
        "width": 2000
    });

    let part = Part::bytes(photo.data.to_vec())
        .file_name(photo.file_name.clone())
        .mime_str(&photo.content_type)?;

    Ok(Form::new()
        .part("file", part)
        .text("parameters", parameters.to_string()))
}

async fn check_status(response: reqwest::Response, stage: Stage) -> Result<Value, FaceApiError> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(%status, stage = stage.as_str(), "Face API returned an error status");
        return Err(FaceApiError::Status { stage, status, body });
    }
    Ok(response.json::<Value>().await?)
}

/// First of `keys` holding an absolute http(s) URL.
fn extract_result_url(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| body.get(*key).and_then(Value::as_str))
        .find(|candidate| {
            Url::parse(candidate)
                .map(|url| matches!(url.scheme(), "http" | "https"))
                .unwrap_or(false)
        })
        .map(str::to_string)
}

/// Which upstream call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Process,
    Result,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Process => "process",
            Stage::Result => "result",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FaceApiError {
    #[error("Face API {} error {}", .stage.as_str(), .status.as_u16())]
    Status {
        stage: Stage,
        status: StatusCode,
        body: String,
    },

    #[error("Face API did not return a job id")]
    MissingJobId { raw: Value },

    #[error("Face API did not return a result URL")]
    MissingResultUrl { raw: Value },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}
