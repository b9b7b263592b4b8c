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
use super::Storage;
use crate::MailReceiver;
use vcapture_common::MailRecord;

/// A [`MailReceiver`] persisting every record in a [`Storage`].
pub struct StorageReceiver {
    name: String,
    storage: std::sync::Arc<dyn Storage>,
}

impl StorageReceiver {
    ///
    #[must_use]
    pub fn new(name: impl Into<String>, storage: std::sync::Arc<dyn Storage>) -> Self {
        Self {
            name: name.into(),
            storage,
        }
    }
}

#[async_trait::async_trait]
impl MailReceiver for StorageReceiver {
    fn name(&self) -> &str {
        &self.name
    }

    async fn deliver(&self, record: std::sync::Arc<MailRecord>) -> anyhow::Result<()> {
        self.storage.store(&record).await?;
        Ok(())
    }
}
