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

/// Stage of a SMTP session.
///
/// `Greeting -> Ready -> MailFrom -> RcptTo -> Data -> Ready ... -> Complete`,
/// any stage can end in `Aborted`.
#[derive(
    Debug,
    Eq,
    PartialEq,
    Hash,
    Copy,
    Clone,
    Ord,
    PartialOrd,
    serde::Deserialize,
    serde::Serialize,
    strum::EnumString,
    strum::Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// After TCP/IP socket has been accepted, waiting for HELO/EHLO
    Greeting,
    /// After receiving HELO/EHLO command, or at the end of a transaction
    Ready,
    /// After receiving MAIL FROM command
    MailFrom,
    /// After receiving at least one RCPT TO command
    RcptTo,
    /// Receiving the message, between DATA and the final `.`
    Data,
    /// After QUIT
    Complete,
    /// The connection dropped, or was closed by the server
    Aborted,
}

impl Stage {
    /// The session is over.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Aborted)
    }

    /// A mail transaction has been started by `MAIL FROM`.
    #[must_use]
    pub const fn in_transaction(self) -> bool {
        matches!(self, Self::MailFrom | Self::RcptTo | Self::Data)
    }
}
