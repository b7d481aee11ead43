use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Relays finished try-on images to the administrator's Telegram chat.
pub struct TelegramNotifier {
    http: Client,
    api_base_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(http: Client, api_base_url: &str, bot_token: &str, chat_id: &str) -> Self {
        Self {
            http,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        }
    }

    /// Send the result image. When `image` is `None` it is downloaded from `image_url`.
    pub async fn relay_result(
        &self,
        image_url: &str,
        image: Option<Bytes>,
        caption: &str,
    ) -> Result<(), NotifyError> {
        let image = match image {
            Some(bytes) => bytes,
            None => self.download(image_url).await?,
        };
        self.send_photo(image, caption).await
    }

    pub async fn send_photo(&self, image: Bytes, caption: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendPhoto", self.api_base_url, self.bot_token);

        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", caption.to_string())
            .part("photo", Part::bytes(image.to_vec()).file_name("tryon.jpg"));

        let response = self
            .http
            .post(url)
            .multipart(form)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(chat_id = %self.chat_id, "Try-on result relayed to Telegram");
        Ok(())
    }

    async fn download(&self, image_url: &str) -> Result<Bytes, NotifyError> {
        let response = self
            .http
            .get(image_url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.bytes().await?)
    }
}

/// Caption sent alongside the relayed image.
pub fn caption(dress: &str, contact: &str) -> String {
    format!("Virtual try-on ({dress}). Contact: {contact}")
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}
