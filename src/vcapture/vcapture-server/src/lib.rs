//! vCapture server
//!
//! Accept the SMTP clients in a bounded pool of sessions, and hand the captured
//! mails to the receivers.

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

#![doc(html_no_source)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
//
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
//

mod fan_out;
mod manager;
mod pool;
mod runtime;
mod server;

mod receiver {
    pub mod handler;
}

/// Persistence of the captured mails.
pub mod storage {
    mod fs;
    mod memory;
    mod receiver;

    pub use fs::FileStorage;
    pub use memory::MemoryStorage;
    pub use receiver::StorageReceiver;

    use vcapture_common::MailRecord;
    use vcapture_config::field::FieldAppStorage;

    /// Error produced by a [`Storage`].
    #[allow(clippy::module_name_repetitions)]
    #[derive(Debug, thiserror::Error)]
    pub enum StorageError {
        /// Filesystem failure.
        #[error("cannot write `{}`: {source}", path.display())]
        Io {
            /// File or directory involved.
            path: std::path::PathBuf,
            /// Underlying error.
            #[source]
            source: std::io::Error,
        },
        /// The record cannot be written as JSON.
        #[error("cannot serialize the mail record: {0}")]
        Serialize(#[from] serde_json::Error),
    }

    /// Where the records are kept.
    #[async_trait::async_trait]
    pub trait Storage: Send + Sync {
        /// Persist one record.
        ///
        /// # Errors
        ///
        /// * see [`StorageError`]
        async fn store(&self, record: &MailRecord) -> Result<(), StorageError>;
    }

    /// Build the storage described in the configuration.
    ///
    /// # Errors
    ///
    /// * the storage directory cannot be created
    pub fn from_config(
        config: &FieldAppStorage,
    ) -> Result<std::sync::Arc<dyn Storage>, StorageError> {
        Ok(match config {
            FieldAppStorage::Memory => std::sync::Arc::new(MemoryStorage::default()),
            FieldAppStorage::Fs { dirpath } => std::sync::Arc::new(FileStorage::new(dirpath)?),
        })
    }
}

pub use fan_out::{FanOut, MailReceiver};
pub use manager::{ConnectionManager, ManagerError, SessionHandle};
pub use pool::{PoolError, Slot, WorkerPool};
pub use receiver::handler::Handler;
pub use runtime::{start_runtime, start_runtime_with};
pub use server::{socket_bind_anyhow, Server};
