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
use crate::{helpers, ParserError, ParserResult};

/// A structured header such as `Content-Type: text/plain; charset="utf-8"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MimeHeader {
    /// Lowercase name of the header.
    pub name: String,
    /// Lowercase value before the first `;`.
    pub value: String,
    /// Parameters, keys are lowercase, quotes are removed from values.
    pub args: std::collections::HashMap<String, String>,
}

/// Value of the `Content-Transfer-Encoding` header (RFC2045 section 6).
#[derive(
    Debug,
    Copy,
    Clone,
    Default,
    PartialEq,
    Eq,
    strum::EnumString,
    strum::Display,
    serde_with::SerializeDisplay,
    serde_with::DeserializeFromStr,
)]
#[strum(ascii_case_insensitive)]
pub enum TransferEncoding {
    /// Lines of us-ascii, the default.
    #[default]
    #[strum(serialize = "7bit")]
    SevenBit,
    /// Lines of 8bit data.
    #[strum(serialize = "8bit")]
    EightBit,
    /// Arbitrary bytes.
    #[strum(serialize = "binary")]
    Binary,
    /// `=XX` escapes and soft line breaks.
    #[strum(serialize = "quoted-printable")]
    QuotedPrintable,
    /// RFC2045 base64.
    #[strum(serialize = "base64")]
    Base64,
}

impl TransferEncoding {
    /// Decode `content` into raw bytes.
    ///
    /// # Errors
    ///
    /// * the content is not valid for this encoding
    pub fn decode(self, content: &[u8]) -> ParserResult<Vec<u8>> {
        match self {
            Self::SevenBit | Self::EightBit | Self::Binary => Ok(content.to_vec()),
            Self::QuotedPrintable => {
                quoted_printable::decode(content, quoted_printable::ParseMode::Robust)
                    .map_err(|error| error.to_string())
            }
            Self::Base64 => helpers::decode_base64(content),
        }
        .map_err(|reason| ParserError::InvalidEncoding {
            encoding: self.to_string(),
            reason,
        })
    }
}
