use reqwest::Client;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{
    contact_log::ContactLog,
    face_api::FaceApiClient,
    notify::TelegramNotifier,
    storage::{LocalStorage, StorageError},
    watermark::Watermarker,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub http: Client,
    pub face_api: Arc<FaceApiClient>,
    pub storage: Arc<LocalStorage>,
    pub contacts: Arc<ContactLog>,
    pub notifier: Option<Arc<TelegramNotifier>>,
    pub watermark: Option<Arc<Watermarker>>,
    pub dress_image_base_url: String,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        http: Client,
        face_api: FaceApiClient,
        storage: LocalStorage,
        contacts: ContactLog,
        notifier: Option<TelegramNotifier>,
        watermark: Option<Watermarker>,
        config: &AppConfig,
    ) -> Self {
        Self {
            http,
            face_api: Arc::new(face_api),
            storage: Arc::new(storage),
            contacts: Arc::new(contacts),
            notifier: notifier.map(Arc::new),
            watermark: watermark.map(Arc::new),
            dress_image_base_url: config.dress_image_base_url.clone(),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Wire every service from configuration and create the storage directories.
    ///
    /// A watermark font that cannot be loaded disables watermarking rather
    /// than failing start-up.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StorageError> {
        let http = Client::new();

        let storage = LocalStorage::new(
            &config.upload_dir,
            &config.results_dir,
            &config.public_base_url,
        );
        storage.ensure_dirs().await?;

        let face_api = FaceApiClient::new(http.clone(), config);
        let contacts = ContactLog::new(&config.contact_log_path);

        let notifier = config.telegram_credentials().map(|(token, chat_id)| {
            TelegramNotifier::new(http.clone(), &config.telegram_api_base_url, token, chat_id)
        });
        if notifier.is_none() {
            tracing::info!("Telegram credentials not set, admin relay disabled");
        }

        let watermark = if config.watermark_enabled {
            load_watermark(config)
        } else {
            None
        };

        Ok(Self::new(
            http, face_api, storage, contacts, notifier, watermark, config,
        ))
    }
}

fn load_watermark(config: &AppConfig) -> Option<Watermarker> {
    let Some(path) = config.watermark_font_path.as_deref() else {
        tracing::warn!("WATERMARK_ENABLED is set without WATERMARK_FONT_PATH, watermark disabled");
        return None;
    };

    match Watermarker::from_font_file(path, &config.watermark_text) {
        Ok(watermarker) => {
            tracing::info!(font = %path.display(), "Watermark enabled");
            Some(watermarker)
        }
        Err(e) => {
            tracing::warn!(error = %e, font = %path.display(), "Failed to load watermark font, watermark disabled");
            None
        }
    }
}
