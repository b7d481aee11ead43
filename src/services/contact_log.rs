use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::models::contact::ContactRecord;

/// Append-only flat file of customer contacts.
///
/// The file is opened and closed for every row. There is no locking, so
/// concurrent writers may interleave.
pub struct ContactLog {
    path: PathBuf,
}

impl ContactLog {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn append(&self, record: &ContactRecord) -> Result<(), ContactLogError> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(record.to_line().as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContactLogError {
    #[error("Contact log write failed: {0}")]
    Io(#[from] std::io::Error),
}
