use bytes::Bytes;
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Dress colours offered for the try-on, each backed by a reference garment image.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, EnumString, Display, PartialEq, Eq,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Dress {
    #[default]
    Black,
    White,
}

impl Dress {
    /// Reference garment URL for this dress under `base_url`.
    pub fn reference_url(&self, base_url: &str) -> String {
        format!("{}/{}1.jpg", base_url.trim_end_matches('/'), self)
    }
}

/// Uploaded photo, held in memory for the lifetime of the request.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub data: Bytes,
    pub file_name: String,
    pub content_type: String,
}

/// Free-text fields of a try-on submission.
#[derive(Debug, Clone, Validate)]
pub struct ContactDetails {
    #[garde(length(chars, max = 500))]
    pub contact: String,
}

/// Successful try-on response.
#[derive(Debug, Serialize, Deserialize)]
pub struct TryOnResponse {
    pub output_url: String,
}
