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
use tokio_util::sync::CancellationToken;

/// Error produced while waiting for a [`Slot`].
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// The server is stopping, no more session will be started.
    #[error("the pool is stopping, no slot granted")]
    Cancelled,
}

/// Bounded number of concurrent sessions, backed by a counting semaphore.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: std::sync::Arc<tokio::sync::Semaphore>,
    capacity: usize,
}

/// The right to run one session, given back to the pool when dropped.
#[must_use]
#[derive(Debug)]
pub struct Slot {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

impl Slot {
    /// Give the slot back to the pool.
    pub fn release(self) {
        drop(self);
    }
}

impl WorkerPool {
    /// Create a pool of `capacity` slots.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(tokio::sync::Semaphore::MAX_PERMITS);
        Self {
            semaphore: std::sync::Arc::new(tokio::sync::Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot.
    ///
    /// # Errors
    ///
    /// * [`PoolError::Cancelled`] once `token` is cancelled, even if a slot is free
    pub async fn acquire(&self, token: &CancellationToken) -> Result<Slot, PoolError> {
        tokio::select! {
            biased;
            () = token.cancelled() => Err(PoolError::Cancelled),
            permit = self.semaphore.clone().acquire_owned() => permit
                .map(|permit| Slot { _permit: permit })
                .map_err(|_closed| PoolError::Cancelled),
        }
    }

    /// Total number of slots.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots free right now.
    #[must_use]
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Number of slots held by a session.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }
}
