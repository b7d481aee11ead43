use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::models::tryon::Dress;

/// One row of the append-only contact log.
#[derive(Debug, Clone, Serialize)]
pub struct ContactRecord {
    pub recorded_at: DateTime<Utc>,
    pub contact: String,
    pub dress: Dress,
    pub result_url: String,
}

impl ContactRecord {
    pub fn new(contact: &str, dress: Dress, result_url: &str) -> Self {
        Self {
            recorded_at: Utc::now(),
            contact: contact.to_string(),
            dress,
            result_url: result_url.to_string(),
        }
    }

    /// Tab-separated line, newline terminated. Field contents never span lines.
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\n",
            self.recorded_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            single_line(&self.contact),
            self.dress,
            single_line(&self.result_url),
        )
    }
}

fn single_line(value: &str) -> String {
    value
        .chars()
        .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
        .collect()
}
