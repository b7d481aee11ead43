use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, State};
use axum::Json;
use bytes::{Bytes, BytesMut};
use garde::Validate;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::models::contact::ContactRecord;
use crate::models::tryon::{ContactDetails, Dress, PhotoUpload, TryOnResponse};
use crate::services::notify;
use crate::services::storage::image_extension;
use crate::services::watermark::{WatermarkError, Watermarker};

const RESULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Raw multipart fields before validation.
#[derive(Default)]
struct TryOnForm {
    photo: Option<PhotoUpload>,
    dress: Option<String>,
    contact: Option<String>,
}

/// POST /api/tryon — Run a virtual try-on for an uploaded photo.
pub async fn submit_tryon(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<TryOnResponse>, ApiError> {
    metrics::counter!("tryon_requests_total").increment(1);

    let form = read_form(&mut multipart, state.max_upload_bytes).await?;

    let photo = form
        .photo
        .ok_or_else(|| ApiError::bad_request("Missing file field `photo`"))?;
    let dress = parse_dress(form.dress.as_deref())?;
    let details = ContactDetails {
        contact: form.contact.unwrap_or_default().trim().to_string(),
    };
    details
        .validate()
        .map_err(|e| ApiError::bad_request(format!("Invalid contact: {e}")))?;

    let stored = state
        .storage
        .save_upload(&photo.data, image_extension(&photo.data, &photo.content_type))
        .await?;
    tracing::info!(upload = %stored.name, %dress, bytes = photo.data.len(), "Try-on request accepted");

    let target_url = dress.reference_url(&state.dress_image_base_url);
    let upstream_url = state.face_api.try_on(&photo, &target_url).await?;

    let (output_url, rendered) = match &state.watermark {
        Some(watermarker) => match watermark_result(&state, watermarker, &upstream_url).await {
            Ok((url, bytes)) => (url, Some(bytes)),
            Err(e) => {
                tracing::warn!(error = %e, url = %upstream_url, "Watermark failed, serving original result");
                metrics::counter!("tryon_side_effect_failures_total", "target" => "watermark")
                    .increment(1);
                (upstream_url, None)
            }
        },
        None => (upstream_url, None),
    };

    record_contact(&state, &details.contact, dress, &output_url).await;
    relay_to_admin(&state, &output_url, rendered, dress, &details.contact).await;

    Ok(Json(TryOnResponse { output_url }))
}

async fn read_form(multipart: &mut Multipart, max_bytes: usize) -> Result<TryOnForm, ApiError> {
    let mut form = TryOnForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("photo") => {
                let file_name = field.file_name().unwrap_or("photo").to_string();
                let declared = field
                    .content_type()
                    .unwrap_or(DEFAULT_CONTENT_TYPE)
                    .to_string();
                let data = read_capped(field, max_bytes).await?;
                if data.is_empty() {
                    return Err(ApiError::bad_request("Uploaded `photo` is empty"));
                }
                form.photo = Some(PhotoUpload {
                    content_type: resolve_content_type(&data, declared),
                    data,
                    file_name,
                });
            }
            Some("dress") => form.dress = Some(field.text().await.map_err(multipart_error)?),
            Some("contact") => form.contact = Some(field.text().await.map_err(multipart_error)?),
            _ => {}
        }
    }

    Ok(form)
}

/// Buffer a field, failing as soon as it grows past `max_bytes`.
async fn read_capped(mut field: Field<'_>, max_bytes: usize) -> Result<Bytes, ApiError> {
    let mut buf = BytesMut::new();
    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        if buf.len() + chunk.len() > max_bytes {
            return Err(ApiError::bad_request(format!(
                "File is too large, the limit is {}",
                human_size(max_bytes)
            )));
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::bad_request(format!("Malformed multipart request: {}", err.body_text()))
}

fn parse_dress(raw: Option<&str>) -> Result<Dress, ApiError> {
    match raw.filter(|value| !value.is_empty()) {
        None => Ok(Dress::default()),
        Some(value) => Dress::from_str(value)
            .map_err(|_| ApiError::bad_request(format!("Invalid dress value `{value}`"))),
    }
}

/// Prefer the declared type; sniff the bytes when the client sent none.
fn resolve_content_type(data: &[u8], declared: String) -> String {
    if declared != DEFAULT_CONTENT_TYPE {
        return declared;
    }
    image::guess_format(data)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or(declared)
}

fn human_size(bytes: usize) -> String {
    const MB: usize = 1024 * 1024;
    if bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else {
        format!("{bytes} bytes")
    }
}

/// Fetch the upstream result, caption it and store the copy under `/results`.
async fn watermark_result(
    state: &AppState,
    watermarker: &Arc<Watermarker>,
    upstream_url: &str,
) -> Result<(String, Bytes), WatermarkError> {
    let source = state
        .http
        .get(upstream_url)
        .timeout(RESULT_DOWNLOAD_TIMEOUT)
        .send()
        .await?
        .error_for_status()?
        .bytes()
        .await?;

    let watermarker = Arc::clone(watermarker);
    let rendered = tokio::task::spawn_blocking(move || watermarker.render_jpeg(&source)).await??;

    let stored = state.storage.save_result(&rendered, "jpg").await?;
    tracing::info!(result = %stored.name, "Watermarked result stored");
    Ok((stored.url, Bytes::from(rendered)))
}

async fn record_contact(state: &AppState, contact: &str, dress: Dress, output_url: &str) {
    let record = ContactRecord::new(contact, dress, output_url);
    if let Err(e) = state.contacts.append(&record).await {
        tracing::error!(error = %e, path = %state.contacts.path().display(), "Failed to record contact");
        metrics::counter!("tryon_side_effect_failures_total", "target" => "contact_log").increment(1);
    }
}

async fn relay_to_admin(
    state: &AppState,
    output_url: &str,
    rendered: Option<Bytes>,
    dress: Dress,
    contact: &str,
) {
    let Some(notifier) = &state.notifier else {
        return;
    };

    let caption = notify::caption(&dress.to_string(), contact);
    if let Err(e) = notifier.relay_result(output_url, rendered, &caption).await {
        tracing::error!(error = %e, "Telegram send error");
        metrics::counter!("tryon_side_effect_failures_total", "target" => "telegram").increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dress_defaults_to_black() {
        assert_eq!(parse_dress(None).unwrap(), Dress::Black);
        assert_eq!(parse_dress(Some("")).unwrap(), Dress::Black);
        assert_eq!(parse_dress(Some("White")).unwrap(), Dress::White);
    }

    #[test]
    fn padded_dress_is_not_trimmed() {
        assert!(parse_dress(Some(" black ")).is_err());
        assert!(parse_dress(Some("  ")).is_err());
    }

    #[test]
    fn unknown_dress_is_a_client_error() {
        let err = parse_dress(Some("red")).unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(ref msg) if msg.contains("red")));
    }

    #[test]
    fn content_type_is_sniffed_only_when_missing() {
        let png_magic = b"\x89PNG\r\n\x1a\n0000";
        assert_eq!(
            resolve_content_type(png_magic, DEFAULT_CONTENT_TYPE.to_string()),
            "image/png"
        );
        assert_eq!(
            resolve_content_type(png_magic, "image/jpeg".to_string()),
            "image/jpeg"
        );
        assert_eq!(
            resolve_content_type(b"????", DEFAULT_CONTENT_TYPE.to_string()),
            DEFAULT_CONTENT_TYPE
        );
    }

    #[test]
    fn human_size_prefers_whole_megabytes() {
        assert_eq!(human_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(human_size(1500), "1500 bytes");
    }
}
