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

/// Keep the records in memory, in order of arrival.
pub struct MemoryStorage {
    records: std::sync::RwLock<Vec<MailRecord>>,
    count: tokio::sync::watch::Sender<usize>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self {
            records: std::sync::RwLock::default(),
            count: tokio::sync::watch::channel(0).0,
        }
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl MemoryStorage {
    /// Copy of every record stored.
    #[must_use]
    pub fn records(&self) -> Vec<MailRecord> {
        self.records
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    ///
    #[must_use]
    pub fn len(&self) -> usize {
        *self.count.borrow()
    }

    ///
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Wait until at least `count` records are stored.
    pub async fn wait_for(&self, count: usize) {
        let mut receiver = self.count.subscribe();
        while *receiver.borrow_and_update() < count {
            // the sender lives as long as `self`
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn store(&self, record: &MailRecord) -> Result<(), StorageError> {
        let len = {
            let mut records = self
                .records
                .write()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            records.push(record.clone());
            records.len()
        };
        self.count.send_replace(len);
        Ok(())
    }
}
