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
use crate::{message::mail::Mail, ParserResult};

/// An abstract mail parser
pub trait MailParser: Default {
    /// From the lines of a message (already de-stuffed), return a [`Mail`].
    ///
    /// Line terminators (`\r\n` or `\n`) are optional.
    ///
    /// # Errors
    ///
    /// * the input is not compliant
    fn parse_sync(&mut self, raw: Vec<Vec<u8>>) -> ParserResult<Mail>;

    /// Split `raw` on line feeds and call [`MailParser::parse_sync`].
    ///
    /// # Errors
    ///
    /// * the input is not compliant
    fn parse_bytes(&mut self, raw: &[u8]) -> ParserResult<Mail> {
        let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
        if raw.is_empty() {
            return self.parse_sync(vec![]);
        }

        self.parse_sync(raw.split(|c| *c == b'\n').map(<[u8]>::to_vec).collect())
    }
}
