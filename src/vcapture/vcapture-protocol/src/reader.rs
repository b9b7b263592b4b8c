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
use crate::{command::Command, Error, UnparsedArgs, Verb};
use tokio::io::AsyncReadExt;
use vcapture_common::COMMAND_LINE_MAX;

fn strip_line_terminator(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Stream for reading commands from the client.
///
/// The bytes read after a line are kept for the next call, so pipelined
/// commands are not lost.
pub struct Reader<R: tokio::io::AsyncRead + Unpin + Send> {
    inner: R,
    buffer: bytes::BytesMut,
    additional_reserve: usize,
}

impl<R: tokio::io::AsyncRead + Unpin + Send> Reader<R> {
    /// Create a new stream.
    #[must_use]
    #[inline]
    pub fn new(tcp_stream: R) -> Self {
        Self {
            inner: tcp_stream,
            buffer: bytes::BytesMut::with_capacity(80),
            additional_reserve: 100,
        }
    }

    /// Consume the instance and return the underlying reader.
    #[inline]
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Read the next line, terminated by `\n` (optionally preceded by `\r`).
    ///
    /// A line longer than `max_len` bytes (terminator included) is consumed up
    /// to its terminator and reported as [`Error::BufferTooLong`]. Return `None` if the connection is
    /// closed, an unterminated line is then discarded.
    ///
    /// Cancel safe: the bytes read are kept in the internal buffer.
    ///
    /// # Errors
    ///
    /// * [`std::io::Error`] produced by the underlying reader
    /// * the line is too long
    pub async fn next_line(&mut self, max_len: usize) -> Result<Option<Vec<u8>>, Error> {
        let mut discarded = 0;

        loop {
            if let Some(pos) = self.buffer.iter().position(|c| *c == b'\n') {
                let line = self.buffer.split_to(pos + 1);
                let got = discarded + line.len();
                if got > max_len {
                    return Err(Error::BufferTooLong {
                        expected: max_len,
                        got,
                    });
                }
                return Ok(Some(line.to_vec()));
            }

            if self.buffer.len() >= max_len {
                discarded += self.buffer.len();
                self.buffer.clear();
            }

            self.buffer.reserve(self.additional_reserve);
            if self.inner.read_buf(&mut self.buffer).await? == 0 {
                if !self.buffer.is_empty() {
                    tracing::debug!(
                        remaining = self.buffer.len(),
                        "Connection closed with an unterminated line."
                    );
                    self.buffer.clear();
                }
                return Ok(None);
            }
        }
    }

    /// Read the next ESMTP command, `None` if the connection is closed.
    ///
    /// # Errors
    ///
    /// * [`std::io::Error`] produced by the underlying reader
    /// * the line is too long
    pub async fn next_command(&mut self) -> Result<Option<Command<Verb, UnparsedArgs>>, Error> {
        let Some(line) = self.next_line(COMMAND_LINE_MAX).await? else {
            return Ok(None);
        };
        tracing::trace!("<< {:?}", String::from_utf8_lossy(&line));

        Ok(Some(Verb::parse_command(strip_line_terminator(&line))))
    }

    /// Produce a stream of lines to generate IMF compliant messages.
    ///
    /// Lines are yielded with their terminator, the leading `.` of stuffed lines
    /// is removed, the stream ends at the line `.`.
    ///
    /// If the message is larger than `size_limit`, the remaining lines are
    /// read and dropped until `.`, then [`Error::BufferTooLong`] is yielded.
    /// Each line must be received within `timeout`.
    pub fn as_message_stream(
        &mut self,
        size_limit: usize,
        timeout: std::time::Duration,
    ) -> impl tokio_stream::Stream<Item = Result<Vec<u8>, Error>> + '_ {
        async_stream::stream! {
            let mut size = 0;
            let mut exceeded = false;

            loop {
                let line = match tokio::time::timeout(
                    timeout,
                    self.next_line(size_limit.saturating_add(2)),
                ).await {
                    Err(_elapsed) => {
                        yield Err(Error::Timeout(timeout));
                        return;
                    }
                    Ok(Err(Error::BufferTooLong { got, .. })) => {
                        size += got;
                        exceeded = true;
                        continue;
                    }
                    Ok(Err(error)) => {
                        yield Err(error);
                        return;
                    }
                    Ok(Ok(None)) => {
                        yield Err(Error::UnexpectedEof);
                        return;
                    }
                    Ok(Ok(Some(line))) => line,
                };

                if strip_line_terminator(&line) == b"." {
                    if exceeded {
                        yield Err(Error::BufferTooLong { expected: size_limit, got: size });
                    }
                    return;
                }

                let line = match line.strip_prefix(b".") {
                    Some(unstuffed) => unstuffed.to_vec(),
                    None => line,
                };

                size += line.len();
                if size > size_limit {
                    exceeded = true;
                }
                if !exceeded {
                    yield Ok(line);
                }
            }
        }
    }
}
