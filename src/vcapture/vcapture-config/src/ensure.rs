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
    config::field::{FieldAppStorage, FieldServerSMTP},
    Config,
};
use vcapture_common::{CodeID, Reply, ReplyCode};

impl Config {
    /// Check the consistency of the values, and fill the reply table.
    ///
    /// # Errors
    ///
    /// * a size or a count is set to 0
    /// * no interface to listen on
    /// * an error threshold is lower than `-1`
    /// * the storage directory is empty
    pub fn ensure(self) -> anyhow::Result<Self> {
        let server = &self.server;

        anyhow::ensure!(!server.name.is_empty(), "Server name cannot be empty");
        anyhow::ensure!(
            server.client_count_max != 0,
            "Maximum client count cannot be set to 0"
        );
        anyhow::ensure!(
            server.message_size_limit != 0,
            "Message size limit cannot be set to 0"
        );
        anyhow::ensure!(
            server.queues.delivery.channel_size != 0,
            "Delivery channel size cannot be set to 0"
        );
        anyhow::ensure!(
            !server.interfaces.addr.is_empty(),
            "At least one interface must be served"
        );
        anyhow::ensure!(
            server.smtp.rcpt_count_max != 0,
            "Maximum recipient count cannot be set to 0"
        );
        anyhow::ensure!(
            server.smtp.error.soft_count >= -1 && server.smtp.error.hard_count >= -1,
            "Error thresholds must be positive, or -1 to disable them"
        );

        if let FieldAppStorage::Fs { dirpath } = &self.app.storage {
            anyhow::ensure!(
                !dirpath.as_os_str().is_empty(),
                "Storage directory cannot be empty"
            );
        }

        Ok(self.with_codes())
    }

    /// Insert the missing replies, generate [`CodeID::Ehlo`] and replace `{name}`.
    pub(crate) fn with_codes(mut self) -> Self {
        let name = &self.server.name;
        let reply_codes = &mut self.server.smtp.codes;

        for (key, reply) in FieldServerSMTP::default_smtp_codes() {
            reply_codes.entry(key).or_insert(reply);
        }

        reply_codes.insert(
            CodeID::Ehlo,
            Reply::new(
                ReplyCode::Code { code: 250 },
                [
                    name.clone(),
                    "8BITMIME".to_string(),
                    "SMTPUTF8".to_string(),
                    "PIPELINING".to_string(),
                    format!("SIZE {}", self.server.message_size_limit),
                ]
                .join("\n"),
            ),
        );

        for reply in reply_codes.values_mut() {
            if reply.text().iter().any(|line| line.contains("{name}")) {
                let text = reply
                    .text()
                    .iter()
                    .map(|line| line.replace("{name}", name))
                    .collect::<Vec<_>>()
                    .join("\n");
                *reply = Reply::new(reply.code().clone(), text);
            }
        }

        self
    }
}
