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
use crate::{Address, ClientName};
use vcapture_mail_parser::Mail;

/// A message captured by the server, with its envelope.
///
/// Built once at the end of a successful `DATA`, never modified after.
#[serde_with::serde_as]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MailRecord {
    /// Unique identifier of the record.
    pub uuid: uuid::Uuid,
    /// Reception time, UTC.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: time::OffsetDateTime,
    /// Peer address of the connection.
    pub client_addr: std::net::SocketAddr,
    /// Argument of the last `HELO` / `EHLO`.
    pub client_name: ClientName,
    /// Reverse path, `None` for the null sender `<>`.
    pub mail_from: Option<Address>,
    /// Forward paths, in the order they were received.
    pub rcpt_to: Vec<Address>,
    /// Parsed message.
    pub mail: Mail,
    /// Message as received, dot-stuffing removed.
    #[serde_as(as = "serde_with::base64::Base64")]
    pub raw: Vec<u8>,
}

impl MailRecord {
    /// Stamp a new record with a fresh uuid and the current time.
    #[must_use]
    pub fn new(
        client_addr: std::net::SocketAddr,
        client_name: ClientName,
        mail_from: Option<Address>,
        rcpt_to: Vec<Address>,
        mail: Mail,
        raw: Vec<u8>,
    ) -> Self {
        Self {
            uuid: uuid::Uuid::new_v4(),
            timestamp: time::OffsetDateTime::now_utc(),
            client_addr,
            client_name,
            mail_from,
            rcpt_to,
            mail,
            raw,
        }
    }

    /// The sender as written in the `MAIL FROM` command.
    #[must_use]
    pub fn reverse_path(&self) -> String {
        self.mail_from
            .as_ref()
            .map_or_else(|| "<>".to_string(), |addr| format!("<{addr}>"))
    }
}
