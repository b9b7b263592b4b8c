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
use vcapture_config::Config;
use vcapture_protocol::CancellationToken;
use vcapture_server::{
    socket_bind_anyhow,
    storage::{MemoryStorage, StorageReceiver},
    ConnectionManager, FanOut, MailReceiver, ManagerError, Server, WorkerPool,
};

/// A server listening on the first interface of its configuration, capturing
/// the mails in memory.
pub struct TestServer {
    /// Address the server is listening on.
    pub addr: std::net::SocketAddr,
    /// Mails captured.
    pub storage: std::sync::Arc<MemoryStorage>,
    /// Sessions running.
    pub manager: ConnectionManager,
    token: CancellationToken,
    listener: tokio::task::JoinHandle<anyhow::Result<()>>,
    fan_out: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Bind the socket and spawn the accept loop.
    ///
    /// # Panics
    ///
    /// * the socket cannot be bound
    #[must_use]
    pub fn start(config: Config) -> Self {
        let config = std::sync::Arc::new(config);
        let socket = socket_bind_anyhow(config.server.interfaces.addr[0]).unwrap();
        let addr = socket.local_addr().unwrap();

        let storage = std::sync::Arc::new(MemoryStorage::default());
        let receiver: std::sync::Arc<dyn MailReceiver> =
            std::sync::Arc::new(StorageReceiver::new("memory", storage.clone()));

        let channel_size = config.server.queues.delivery.channel_size;
        let (sender, delivery) = tokio::sync::mpsc::channel(channel_size);
        let fan_out = FanOut::new(vec![receiver], channel_size).start(delivery);

        let (token, manager) = (CancellationToken::new(), ConnectionManager::default());
        let server = Server::new(
            config.clone(),
            WorkerPool::new(config.server.client_count_max),
            manager.clone(),
            sender,
        );
        let listener = tokio::spawn(server.listen_and_serve(vec![socket], token.clone()));

        Self {
            addr,
            storage,
            manager,
            token,
            listener,
            fan_out,
        }
    }

    /// Stop accepting, close the sessions within `deadline` and wait for the
    /// captured mails to be stored.
    ///
    /// # Errors
    ///
    /// * some sessions were still running at the deadline
    pub async fn stop(self, deadline: std::time::Duration) -> Result<(), ManagerError> {
        self.token.cancel();
        self.listener.await.unwrap().unwrap();

        let shutdown = self.manager.shutdown(deadline).await;
        self.fan_out.await.unwrap();
        shutdown
    }
}
