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
use vcapture_common::MailRecord;

/// A consumer of the captured mails.
#[async_trait::async_trait]
pub trait MailReceiver: Send + Sync {
    /// Name used in the logs.
    fn name(&self) -> &str;

    /// Handle one record, an error is logged and does not stop the receiver.
    ///
    /// # Errors
    ///
    /// * depends on the implementation
    async fn deliver(&self, record: std::sync::Arc<MailRecord>) -> anyhow::Result<()>;
}

type Queue = tokio::sync::mpsc::Receiver<std::sync::Arc<MailRecord>>;

/// Broadcast every record to each [`MailReceiver`], each one owning its own
/// queue so a slow receiver only delays itself.
pub struct FanOut {
    senders: Vec<(String, tokio::sync::mpsc::Sender<std::sync::Arc<MailRecord>>)>,
    pending: Vec<(std::sync::Arc<dyn MailReceiver>, Queue)>,
}

impl FanOut {
    /// Create a queue of `queue_capacity` records for each receiver.
    #[must_use]
    pub fn new(receivers: Vec<std::sync::Arc<dyn MailReceiver>>, queue_capacity: usize) -> Self {
        let (senders, pending) = receivers
            .into_iter()
            .map(|receiver| {
                let (sender, queue) = tokio::sync::mpsc::channel(queue_capacity.max(1));
                ((receiver.name().to_string(), sender), (receiver, queue))
            })
            .unzip();

        Self { senders, pending }
    }

    /// Number of receivers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    ///
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Push `record` in the queue of every receiver, waiting while a queue is full.
    pub async fn deliver(&self, record: std::sync::Arc<MailRecord>) {
        for (name, sender) in &self.senders {
            if sender.send(record.clone()).await.is_err() {
                tracing::error!(receiver = name, uuid = %record.uuid, "Receiver stopped, record lost.");
            }
        }
    }

    async fn run_receiver(receiver: std::sync::Arc<dyn MailReceiver>, mut queue: Queue) {
        while let Some(record) = queue.recv().await {
            match receiver.deliver(record.clone()).await {
                Ok(()) => {
                    tracing::debug!(receiver = receiver.name(), uuid = %record.uuid, "Record delivered.");
                }
                Err(error) => {
                    tracing::warn!(receiver = receiver.name(), uuid = %record.uuid, %error, "Delivery failed.");
                }
            }
        }
        tracing::trace!(receiver = receiver.name(), "Receiver stopped.");
    }

    /// Spawn one worker per receiver and forward every record read on `delivery`.
    ///
    /// The returned task completes once `delivery` is closed and every queued
    /// record has been handled.
    pub fn start(
        mut self,
        mut delivery: tokio::sync::mpsc::Receiver<MailRecord>,
    ) -> tokio::task::JoinHandle<()> {
        let workers = std::mem::take(&mut self.pending)
            .into_iter()
            .map(|(receiver, queue)| tokio::spawn(Self::run_receiver(receiver, queue)))
            .collect::<Vec<_>>();

        tokio::spawn(async move {
            tracing::info!(receivers = self.len(), "Delivery started.");
            while let Some(record) = delivery.recv().await {
                self.deliver(std::sync::Arc::new(record)).await;
            }
            drop(self);

            for result in futures_util::future::join_all(workers).await {
                if let Err(error) = result {
                    tracing::error!(%error, "Receiver worker panicked.");
                }
            }
            tracing::info!("Delivery stopped.");
        })
    }
}
