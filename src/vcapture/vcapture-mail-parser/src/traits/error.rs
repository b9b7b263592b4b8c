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

/// The message cannot be turned into a [`crate::Mail`].
///
/// Never fatal for the server: the transaction is discarded and the
/// client is told why.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParserError {
    /// The header block is ill-formed or not terminated by an empty line.
    #[error("parsing email failed: {0}")]
    InvalidMail(String),
    /// A `multipart/*` content type without a `boundary` parameter.
    #[error("Boundary not found in content-type header parameters, {0}")]
    BoundaryNotFound(String),
    /// The declared boundary never appears in the body.
    #[error("Misplaced boundary in mime message, {0}")]
    MisplacedBoundary(String),
    /// The content transfer encoding is unknown, or the content does not match it.
    #[error("cannot decode content with encoding '{encoding}': {reason}")]
    InvalidEncoding {
        /// Encoding declared in the `Content-Transfer-Encoding` header.
        encoding: String,
        /// What went wrong.
        reason: String,
    },
}

/// Result of the parsing operations.
pub type ParserResult<T> = Result<T, ParserError>;
