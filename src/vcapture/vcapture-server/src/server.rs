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
use crate::{receiver::handler::Handler, ConnectionManager, PoolError, SessionHandle, Slot, WorkerPool};
use anyhow::Context;
use tokio_util::sync::CancellationToken;
use vcapture_common::{CodeID, MailRecord};
use vcapture_config::Config;
use vcapture_protocol::{AcceptArgs, ErrorCounter, Receiver};

/// TCP/IP server
pub struct Server {
    config: std::sync::Arc<Config>,
    pool: WorkerPool,
    manager: ConnectionManager,
    delivery_sender: tokio::sync::mpsc::Sender<MailRecord>,
}

/// Create a `TCPListener` ready to be listened to
///
/// # Errors
///
/// * failed to bind to the socket address
/// * failed to set the listener to non blocking
pub fn socket_bind_anyhow<A: std::net::ToSocketAddrs + std::fmt::Debug>(
    addr: A,
) -> anyhow::Result<std::net::TcpListener> {
    let socket = std::net::TcpListener::bind(&addr)
        .with_context(|| format!("Failed to bind socket on addr: '{addr:?}'"))?;

    socket
        .set_nonblocking(true)
        .with_context(|| format!("Failed to set non-blocking socket on addr: '{addr:?}'"))?;

    Ok(socket)
}

type ListenerStreamItem = std::io::Result<(tokio::net::TcpStream, std::net::SocketAddr)>;

fn listener_to_stream(
    listener: tokio::net::TcpListener,
) -> impl tokio_stream::Stream<Item = ListenerStreamItem> {
    async_stream::stream! {
        loop {
            yield listener.accept().await;
        }
    }
}

impl Server {
    /// Create a server sharing the `pool` and the `manager` of the runtime.
    #[must_use]
    pub fn new(
        config: std::sync::Arc<Config>,
        pool: WorkerPool,
        manager: ConnectionManager,
        delivery_sender: tokio::sync::mpsc::Sender<MailRecord>,
    ) -> Self {
        Self {
            config,
            pool,
            manager,
            delivery_sender,
        }
    }

    async fn reject(&self, mut stream: tokio::net::TcpStream, code: CodeID) {
        let reply = self.config.server.smtp.codes.get(&code);
        if let Some(reply) = reply {
            if let Err(error) =
                tokio::io::AsyncWriteExt::write_all(&mut stream, reply.as_ref().as_bytes()).await
            {
                tracing::error!(%error, "Code delivery failure.");
            }
        }

        if let Err(error) = tokio::io::AsyncWriteExt::shutdown(&mut stream).await {
            tracing::error!(%error, "Closing connection failure.");
        }
    }

    async fn acquire(&self, token: &CancellationToken) -> Result<Option<Slot>, PoolError> {
        match self.config.server.pool.acquire_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.pool.acquire(token))
                .await
                .map_or(Ok(None), |slot| slot.map(Some)),
            None => self.pool.acquire(token).await.map(Some),
        }
    }

    #[tracing::instrument(name = "accept", skip_all, fields(client = %client_addr, server = %server_addr))]
    async fn handle_client(
        &self,
        stream: tokio::net::TcpStream,
        client_addr: std::net::SocketAddr,
        server_addr: std::net::SocketAddr,
        token: &CancellationToken,
    ) {
        if self.pool.available() == 0 {
            tracing::debug!(
                max = self.pool.capacity(),
                "Every slot in use, waiting for a session to end."
            );
        }

        let slot = match self.acquire(token).await {
            Ok(Some(slot)) => slot,
            Ok(None) => {
                tracing::warn!(
                    max = self.pool.capacity(),
                    "Connection count max reached, rejecting connection.",
                );
                self.reject(stream, CodeID::ConnectionMaxReached).await;
                return;
            }
            Err(PoolError::Cancelled) => {
                self.reject(stream, CodeID::ShuttingDown).await;
                return;
            }
        };

        let handle = match self.manager.register(&slot, client_addr) {
            Ok(handle) => handle,
            Err(error) => {
                tracing::info!(%error, "Connection refused.");
                self.reject(stream, CodeID::ShuttingDown).await;
                return;
            }
        };

        tokio::spawn(Self::run_session(
            self.config.clone(),
            self.delivery_sender.clone(),
            stream,
            server_addr,
            slot,
            handle,
        ));
    }

    /// Main loop of the server, accept the clients until `token` is cancelled.
    ///
    /// The sessions already running are not stopped.
    ///
    /// # Errors
    ///
    /// * failed to convert sockets to `[tokio::net::TcpListener]`
    #[tracing::instrument(name = "serve", skip_all)]
    pub async fn listen_and_serve(
        self,
        sockets: Vec<std::net::TcpListener>,
        token: CancellationToken,
    ) -> anyhow::Result<()> {
        let mut map = tokio_stream::StreamMap::new();
        for socket in sockets {
            let listener = tokio::net::TcpListener::from_std(socket)?;
            let server_addr = listener.local_addr()?;
            map.insert(server_addr, Box::pin(listener_to_stream(listener)));
        }

        tracing::info!(
            interfaces = ?map.keys().collect::<Vec<_>>(),
            "Listening for clients.",
        );

        loop {
            let (server_addr, client) = tokio::select! {
                biased;
                () = token.cancelled() => break,
                next = tokio_stream::StreamExt::next(&mut map) => match next {
                    Some(next) => next,
                    None => break,
                },
            };

            match client {
                Ok((stream, client_addr)) => {
                    self.handle_client(stream, client_addr, server_addr, &token)
                        .await;
                }
                Err(error) => tracing::warn!(%server_addr, %error, "Accept failure."),
            }
        }

        tracing::info!("Stopped listening.");
        Ok(())
    }

    #[tracing::instrument(name = "handle-client", skip_all, fields(client = %handle.client_addr(), server = %server_addr, session = %handle.id()))]
    async fn run_session(
        config: std::sync::Arc<Config>,
        delivery_sender: tokio::sync::mpsc::Sender<MailRecord>,
        stream: tokio::net::TcpStream,
        server_addr: std::net::SocketAddr,
        slot: Slot,
        handle: SessionHandle,
    ) {
        tracing::info!("Connection accepted.");

        let client_addr = *handle.client_addr();
        let smtp = &config.server.smtp;
        let (read, write) = stream.into_split();
        let receiver = Receiver::new(
            read,
            write,
            Handler::new(config.clone(), delivery_sender, client_addr),
            ErrorCounter::new(smtp.error.soft_count, smtp.error.hard_count),
            config.server.message_size_limit,
            handle.cancelled().clone(),
        );

        let session = receiver.into_stream(AcceptArgs {
            client_addr,
            server_addr,
        });
        tokio::pin!(session);

        let outcome = loop {
            tokio::select! {
                biased;
                () = handle.killed().cancelled() => {
                    break Err(anyhow::anyhow!("session terminated at the shutdown deadline"));
                }
                message = tokio_stream::StreamExt::next(&mut session) => match message {
                    Some(Ok(())) => tracing::trace!("Transaction completed."),
                    Some(Err(error)) => break Err(anyhow::Error::from(error)),
                    None => break Ok(()),
                },
            }
        };

        match outcome {
            Ok(()) => tracing::info!("Connection closed cleanly."),
            Err(error) => tracing::warn!(%error, "Connection closing failure."),
        }

        drop(handle);
        slot.release();
    }
}
