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
use super::mime_type::TransferEncoding;

/// we use Vec instead of a `HashMap` because header ordering is important.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct MailHeaders(pub Vec<(String, String)>);

impl MailHeaders {
    /// Value of the first header named `name` (case insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Values of every header named `name` (case insensitive), in order of appearance.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Number of headers named `name` (case insensitive).
    #[must_use]
    pub fn count(&self, name: &str) -> usize {
        self.get_all(name).count()
    }

    /// Number of header lines (after unfolding).
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    ///
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for MailHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, value) in &self.0 {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}

/// A part of the message meant to be displayed.
#[serde_with::serde_as]
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct BodyPart {
    /// Lowercase `type/subtype`, `text/plain` if not declared.
    pub content_type: String,
    /// `charset` parameter of the content type.
    pub charset: Option<String>,
    /// Encoding the content was transferred with.
    pub transfer_encoding: TransferEncoding,
    /// Decoded bytes.
    #[serde_as(as = "serde_with::base64::Base64")]
    pub content: Vec<u8>,
}

/// A part of the message sent as a file.
#[serde_with::serde_as]
#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Attachment {
    /// Name of the file, from the `Content-Disposition` or `Content-Type` parameters.
    pub filename: String,
    /// Lowercase `type/subtype`.
    pub content_type: String,
    /// Encoding the content was transferred with.
    pub transfer_encoding: TransferEncoding,
    /// `Content-ID` header without the angle brackets.
    pub content_id: Option<String>,
    /// Decoded bytes.
    #[serde_as(as = "serde_with::base64::Base64")]
    pub content: Vec<u8>,
}

/// Message body representation
#[derive(Clone, Default, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Mail {
    /// Top level headers of the message.
    pub headers: MailHeaders,
    /// `Subject` header.
    pub subject: Option<String>,
    /// `Date` header, as sent by the client.
    pub date: Option<String>,
    /// `Message-ID` header.
    pub message_id: Option<String>,
    /// Displayable parts, nested multiparts are flattened in order.
    pub parts: Vec<BodyPart>,
    /// Files attached to the message.
    pub attachments: Vec<Attachment>,
}

impl Mail {
    /// Total count of leaf entities (body parts and attachments).
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.parts.len() + self.attachments.len()
    }

    /// First body part with the given content type.
    #[must_use]
    pub fn part_by_type(&self, content_type: &str) -> Option<&BodyPart> {
        self.parts
            .iter()
            .find(|part| part.content_type.eq_ignore_ascii_case(content_type))
    }
}
