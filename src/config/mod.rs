use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// How the upstream face API is driven.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    /// One call returns the result URL directly.
    Sync,
    /// Submit returns a job id which is polled for the result URL.
    Poll,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server bind address (e.g., "0.0.0.0:3000").
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Deep-Image API key, sent as `x-api-key`
    pub face_api_key: String,

    /// Deep-Image API root
    #[serde(default = "default_face_api_base_url")]
    pub face_api_base_url: String,

    #[serde(default = "default_face_api_mode")]
    pub face_api_mode: ApiMode,

    /// Poll budget for the submit + poll mode
    #[serde(default = "default_poll_attempts")]
    pub poll_attempts: u32,

    /// Fixed sleep between polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Directory holding the reference garment images (`black1.jpg`, `white1.jpg`)
    #[serde(default = "default_dress_image_base_url")]
    pub dress_image_base_url: String,

    /// Upload size cap for the `photo` field
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Append-only contact log
    #[serde(default = "default_contact_log_path")]
    pub contact_log_path: PathBuf,

    /// Public origin used to build `/uploads` and `/results` URLs
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    pub telegram_bot_token: Option<String>,

    pub telegram_admin_chat_id: Option<String>,

    #[serde(default = "default_telegram_api_base_url")]
    pub telegram_api_base_url: String,

    #[serde(default)]
    pub watermark_enabled: bool,

    #[serde(default = "default_watermark_text")]
    pub watermark_text: String,

    /// TrueType/OpenType font used to render the watermark caption
    pub watermark_font_path: Option<PathBuf>,

    /// Comma-separated list of allowed origins. Empty means permissive.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_face_api_base_url() -> String {
    "https://deep-image.ai".to_string()
}

fn default_face_api_mode() -> ApiMode {
    ApiMode::Poll
}

fn default_poll_attempts() -> u32 {
    10
}

fn default_poll_interval_ms() -> u64 {
    3000
}

fn default_dress_image_base_url() -> String {
    "https://www.karlbarbini.ru/assets".to_string()
}

fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("results")
}

fn default_contact_log_path() -> PathBuf {
    PathBuf::from("contacts.log")
}

fn default_public_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_telegram_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_watermark_text() -> String {
    "karlbarbini.ru".to_string()
}

impl AppConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Telegram credentials, only when both halves are configured.
    pub fn telegram_credentials(&self) -> Option<(&str, &str)> {
        match (&self.telegram_bot_token, &self.telegram_admin_chat_id) {
            (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => {
                Some((token.as_str(), chat.as_str()))
            }
            _ => None,
        }
    }
}
