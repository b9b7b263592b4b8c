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

//! vCapture protocol implementation
//!
//! The server side of a SMTP session, without relay, TLS or authentication:
//! replies are produced by a [`ReceiverHandler`], the [`Receiver`] reads the
//! commands, checks their sequence and writes the replies.

#![doc(html_no_source)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
//
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
// FIXME:
#![allow(clippy::indexing_slicing)] // issue with async_stream

mod command;
mod error;
mod reader;
mod receiver;
mod receiver_handler;
mod writer;

pub use command::{
    AcceptArgs, EhloArgs, HeloArgs, MailFromArgs, ParseArgsError, RcptToArgs, UnparsedArgs, Verb,
};
pub use error::Error;
pub use reader::Reader;
pub use receiver::{ErrorCounter, Receiver, ReceiverContext};
pub use receiver_handler::ReceiverHandler;
pub use writer::Writer;

pub use tokio_util::sync::CancellationToken;
