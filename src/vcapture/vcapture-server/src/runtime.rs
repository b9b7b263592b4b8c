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
use crate::{
    storage::{self, StorageReceiver},
    ConnectionManager, FanOut, MailReceiver, Server, WorkerPool,
};
use anyhow::Context;
use tokio_util::sync::CancellationToken;
use vcapture_common::MailRecord;
use vcapture_config::Config;

/// Signals stopping the server gracefully.
const STOP_SIGNALS: [std::os::raw::c_int; 3] = [
    // Send by `systemctl stop` (and then sending `SIGKILL`)
    signal_hook::consts::SIGTERM,
    // Ctrl+C on a terminal
    signal_hook::consts::SIGINT,
    // Ctrl+\ on a terminal
    signal_hook::consts::SIGQUIT,
];

/// Start the server's runtime, the captured mails are written in the storage
/// of the configuration.
///
/// Return once the server has been stopped, by a signal (`SIGINT`, `SIGTERM`, `SIGQUIT`)
/// or after `timeout`.
///
/// # Errors
///
/// * the storage cannot be initialized
/// * see [`start_runtime_with`]
#[allow(clippy::module_name_repetitions)]
pub fn start_runtime(
    config: Config,
    sockets: Vec<std::net::TcpListener>,
    timeout: Option<std::time::Duration>,
) -> anyhow::Result<()> {
    let storage =
        storage::from_config(&config.app.storage).context("could not initialize the storage")?;

    let receiver: std::sync::Arc<dyn MailReceiver> =
        std::sync::Arc::new(StorageReceiver::new("storage", storage));

    start_runtime_with(config, sockets, vec![receiver], timeout)
}

/// Start the server's runtime, delivering the captured mails to `receivers`.
///
/// # Errors
///
/// * the tokio runtime or the signal handler cannot be started
/// * the sockets cannot be listened to
#[allow(clippy::module_name_repetitions)]
pub fn start_runtime_with(
    config: Config,
    sockets: Vec<std::net::TcpListener>,
    receivers: Vec<std::sync::Arc<dyn MailReceiver>>,
    timeout: Option<std::time::Duration>,
) -> anyhow::Result<()> {
    let config = std::sync::Arc::new(config);
    let token = CancellationToken::new();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("vcapture-worker")
        .build()?;

    let mut signals = signal_hook::iterator::Signals::new(STOP_SIGNALS)?;
    let signals_handle = signals.handle();
    let signal_handler = {
        let token = token.clone();
        std::thread::Builder::new()
            .name("vcapture-signals".to_string())
            .spawn(move || {
                for signal in signals.forever() {
                    tracing::warn!(signal, "Stopping vCapture server.");
                    token.cancel();
                }
            })?
    };

    let result = runtime.block_on(serve(config, sockets, receivers, token, timeout));

    signals_handle.close();
    if signal_handler.join().is_err() {
        tracing::error!("Signal handler panicked.");
    }

    result
}

async fn serve(
    config: std::sync::Arc<Config>,
    sockets: Vec<std::net::TcpListener>,
    receivers: Vec<std::sync::Arc<dyn MailReceiver>>,
    token: CancellationToken,
    timeout: Option<std::time::Duration>,
) -> anyhow::Result<()> {
    tracing::info!(name = %config.server.name, "Runtime started successfully.");

    let channel_size = config.server.queues.delivery.channel_size;
    let (delivery_sender, delivery_receiver) = tokio::sync::mpsc::channel::<MailRecord>(channel_size);
    let fan_out = FanOut::new(receivers, channel_size).start(delivery_receiver);

    if let Some(timeout) = timeout {
        let token = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            tracing::info!(?timeout, "Timeout reached, stopping vCapture server.");
            token.cancel();
        });
    }

    let manager = ConnectionManager::default();
    let server = Server::new(
        config.clone(),
        WorkerPool::new(config.server.client_count_max),
        manager.clone(),
        delivery_sender,
    );
    let listening = server.listen_and_serve(sockets, token.clone()).await;
    token.cancel();

    if let Err(error) = manager.shutdown(config.server.shutdown.grace_period).await {
        tracing::warn!(%error, "Shutdown deadline reached.");
    }

    // every sender is dropped with the sessions, the fan-out drains the queue and stops
    fan_out.await.context("delivery task failure")?;

    tracing::info!("vCapture server stopped.");
    listening
}
