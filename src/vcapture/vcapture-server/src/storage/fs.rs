/*
 * vSMTP mail transfer agent
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/
use super::{Storage, StorageError};
use vcapture_common::MailRecord;

/// Write each record in a directory, as `{uuid}.eml` (the message as received)
/// and `{uuid}.json` (the envelope and the parsed message).
#[derive(Debug)]
pub struct FileStorage {
    dirpath: std::path::PathBuf,
}

impl FileStorage {
    /// Create the directory if needed.
    ///
    /// # Errors
    ///
    /// * the directory cannot be created
    pub fn new(dirpath: impl Into<std::path::PathBuf>) -> Result<Self, StorageError> {
        let dirpath = dirpath.into();
        std::fs::DirBuilder::new()
            .recursive(true)
            .create(&dirpath)
            .map_err(|source| StorageError::Io {
                path: dirpath.clone(),
                source,
            })?;

        Ok(Self { dirpath })
    }

    /// Directory the records are written in.
    #[must_use]
    pub fn dirpath(&self) -> &std::path::Path {
        &self.dirpath
    }

    /// Path of the file `{uuid}.{extension}`.
    #[must_use]
    pub fn filepath(&self, uuid: &uuid::Uuid, extension: &str) -> std::path::PathBuf {
        self.dirpath.join(format!("{uuid}.{extension}"))
    }

    async fn write(path: std::path::PathBuf, content: &[u8]) -> Result<(), StorageError> {
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| StorageError::Io { path, source })
    }
}

#[async_trait::async_trait]
impl Storage for FileStorage {
    #[tracing::instrument(name = "fs-store", skip_all, fields(uuid = %record.uuid))]
    async fn store(&self, record: &MailRecord) -> Result<(), StorageError> {
        let json = serde_json::to_vec_pretty(record)?;

        Self::write(self.filepath(&record.uuid, "eml"), &record.raw).await?;
        Self::write(self.filepath(&record.uuid, "json"), &json).await?;

        tracing::debug!(dirpath = %self.dirpath.display(), "Record written.");
        Ok(())
    }
}
