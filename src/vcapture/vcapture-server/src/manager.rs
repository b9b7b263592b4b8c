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
use crate::Slot;
use tokio_util::sync::CancellationToken;

/// Error produced by the [`ConnectionManager`].
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ManagerError {
    /// No more session are accepted.
    #[error("the server is shutting down")]
    ShuttingDown,
    /// Some sessions did not end before the deadline, they have been terminated.
    #[error("{remaining} session(s) still running at the shutdown deadline")]
    ShutdownTimeout {
        /// Number of sessions terminated.
        remaining: usize,
    },
}

struct SessionEntry {
    client_addr: std::net::SocketAddr,
    cancelled: CancellationToken,
    killed: CancellationToken,
}

#[derive(Default)]
struct Registry {
    sessions: std::collections::HashMap<uuid::Uuid, SessionEntry>,
    shutting_down: bool,
}

struct Inner {
    registry: std::sync::Mutex<Registry>,
    count: tokio::sync::watch::Sender<usize>,
}

/// Registry of the running sessions, coordinating the stop of the server.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: std::sync::Arc<Inner>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self {
            inner: std::sync::Arc::new(Inner {
                registry: std::sync::Mutex::default(),
                count: tokio::sync::watch::channel(0).0,
            }),
        }
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("sessions", &self.len())
            .finish_non_exhaustive()
    }
}

/// Membership of a session in the [`ConnectionManager`], removed when dropped.
#[must_use]
pub struct SessionHandle {
    id: uuid::Uuid,
    client_addr: std::net::SocketAddr,
    cancelled: CancellationToken,
    killed: CancellationToken,
    manager: ConnectionManager,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.id)
            .field("client_addr", &self.client_addr)
            .finish_non_exhaustive()
    }
}

impl SessionHandle {
    ///
    #[must_use]
    pub const fn id(&self) -> &uuid::Uuid {
        &self.id
    }

    ///
    #[must_use]
    pub const fn client_addr(&self) -> &std::net::SocketAddr {
        &self.client_addr
    }

    /// Cancelled when the server asks the session to end, at the next command.
    #[must_use]
    pub const fn cancelled(&self) -> &CancellationToken {
        &self.cancelled
    }

    /// Cancelled when the shutdown deadline has passed, the session must stop immediately.
    #[must_use]
    pub const fn killed(&self) -> &CancellationToken {
        &self.killed
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.manager.remove(&self.id);
    }
}

impl ConnectionManager {
    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        // NOTE: the registry stays consistent even if a holder panicked.
        self.inner
            .registry
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn remove(&self, id: &uuid::Uuid) {
        let mut registry = self.lock();
        if let Some(entry) = registry.sessions.remove(id) {
            tracing::trace!(session = %id, client = %entry.client_addr, "Session deregistered.");
        }
        self.inner.count.send_replace(registry.sessions.len());
    }

    /// Add a session to the registry, holding a [`Slot`] of the pool.
    ///
    /// # Errors
    ///
    /// * [`ManagerError::ShuttingDown`] once [`ConnectionManager::shutdown`] has been called
    pub fn register(
        &self,
        _slot: &Slot,
        client_addr: std::net::SocketAddr,
    ) -> Result<SessionHandle, ManagerError> {
        let mut registry = self.lock();
        if registry.shutting_down {
            return Err(ManagerError::ShuttingDown);
        }

        let id = uuid::Uuid::new_v4();
        let (cancelled, killed) = (CancellationToken::new(), CancellationToken::new());
        registry.sessions.insert(
            id,
            SessionEntry {
                client_addr,
                cancelled: cancelled.clone(),
                killed: killed.clone(),
            },
        );
        self.inner.count.send_replace(registry.sessions.len());

        Ok(SessionHandle {
            id,
            client_addr,
            cancelled,
            killed,
            manager: self.clone(),
        })
    }

    /// Remove a session from the registry.
    pub fn deregister(&self, handle: SessionHandle) {
        debug_assert!(std::sync::Arc::ptr_eq(&self.inner, &handle.manager.inner));
        drop(handle);
    }

    /// Number of sessions registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().sessions.len()
    }

    ///
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Refuse the new sessions, ask every session to end and wait for them
    /// at most `deadline`.
    ///
    /// # Errors
    ///
    /// * [`ManagerError::ShutdownTimeout`] if sessions are still registered at
    ///   the deadline, they are then asked to stop immediately.
    #[tracing::instrument(name = "shutdown", skip(self))]
    pub async fn shutdown(&self, deadline: std::time::Duration) -> Result<(), ManagerError> {
        let mut count = self.inner.count.subscribe();
        {
            let mut registry = self.lock();
            registry.shutting_down = true;
            for entry in registry.sessions.values() {
                entry.cancelled.cancel();
            }
            tracing::info!(sessions = registry.sessions.len(), "Closing the sessions.");
        }

        let drained = tokio::time::timeout(deadline, async move {
            while *count.borrow_and_update() != 0 {
                if count.changed().await.is_err() {
                    break;
                }
            }
        })
        .await;

        if drained.is_ok() {
            tracing::info!("Every session ended.");
            return Ok(());
        }

        let registry = self.lock();
        for entry in registry.sessions.values() {
            entry.killed.cancel();
        }
        let remaining = registry.sessions.len();
        if remaining == 0 {
            return Ok(());
        }

        tracing::warn!(remaining, "Sessions terminated at the shutdown deadline.");
        Err(ManagerError::ShutdownTimeout { remaining })
    }
}
