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
    reader::Reader, writer::Writer, AcceptArgs, EhloArgs, Error, HeloArgs, MailFromArgs,
    ParseArgsError, RcptToArgs, ReceiverHandler, Verb,
};
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use vcapture_common::Stage;

enum HandshakeOutcome {
    Message,
    Quit,
    Abort(Error),
}

/// Count of the error replies sent to the client during the session.
#[derive(Debug, Clone, Copy)]
pub struct ErrorCounter {
    /// Error replies sent so far.
    pub error_count: i64,
    /// Threshold of the soft error handling, `-1` to disable.
    pub threshold_soft_error: i64,
    /// Threshold of the hard error handling, `-1` to disable.
    pub threshold_hard_error: i64,
}

impl ErrorCounter {
    /// A counter starting at zero.
    #[must_use]
    pub const fn new(threshold_soft_error: i64, threshold_hard_error: i64) -> Self {
        Self {
            error_count: 0,
            threshold_soft_error,
            threshold_hard_error,
        }
    }
}

/// An handle to send event from the [`ReceiverHandler`] to the [`Receiver`].
#[allow(clippy::module_name_repetitions)]
#[derive(Default)]
pub struct ReceiverContext {
    outcome: Option<HandshakeOutcome>,
}

impl ReceiverContext {
    /// Make the [`Receiver`] quit the connection early, after sending the reply.
    #[inline]
    pub fn deny(&mut self) {
        self.outcome = Some(HandshakeOutcome::Quit);
    }

    /// Make the [`Receiver`] drop the connection without sending the reply.
    #[inline]
    pub fn abort(&mut self, error: Error) {
        self.outcome = Some(HandshakeOutcome::Abort(error));
    }
}

/// A SMTP receiver.
pub struct Receiver<
    T: ReceiverHandler + Send,
    W: tokio::io::AsyncWrite + Unpin + Send,
    R: tokio::io::AsyncRead + Unpin + Send,
> {
    handler: T,
    writer: Writer<W>,
    reader: Reader<R>,
    error_counter: ErrorCounter,
    context: ReceiverContext,
    message_size_max: usize,
    token: CancellationToken,
}

impl<
        T: ReceiverHandler + Send,
        W: tokio::io::AsyncWrite + Unpin + Send,
        R: tokio::io::AsyncRead + Unpin + Send,
    > Receiver<T, W, R>
{
    /// Create a new [`Receiver`] from the two halves of a connection.
    ///
    /// Once `token` is cancelled, the session is closed as soon as the server
    /// waits for a command. A message being received is completed first.
    #[inline]
    pub fn new(
        read: R,
        write: W,
        handler: T,
        error_counter: ErrorCounter,
        message_size_max: usize,
        token: CancellationToken,
    ) -> Self {
        Self {
            handler,
            writer: Writer::new(write),
            reader: Reader::new(read),
            error_counter,
            context: ReceiverContext::default(),
            message_size_max,
            token,
        }
    }

    /// Handle the inner stream to produce a [`tokio_stream::Stream`], each item
    /// being a message received and answered.
    ///
    /// The stream ends when the session is over, an error item means the
    /// connection is lost.
    #[inline]
    pub fn into_stream(
        mut self,
        args: AcceptArgs,
    ) -> impl tokio_stream::Stream<Item = Result<(), Error>> {
        async_stream::try_stream! {
            let reply_accept = self.handler.on_accept(&mut self.context, args).await;
            let denied = match std::mem::take(&mut self.context).outcome {
                Some(HandshakeOutcome::Abort(error)) => {
                    Err::<(), _>(error)?;
                    true
                }
                outcome => outcome.is_some(),
            };

            self.writer
                .send_reply(&mut self.context, &mut self.error_counter, &mut self.handler, reply_accept)
                .await?;
            if denied {
                return;
            }

            loop {
                match self.smtp_handshake().await? {
                    HandshakeOutcome::Message => {
                        let timeout = self.handler.get_timeout();
                        let message_stream = self
                            .reader
                            .as_message_stream(self.message_size_max, timeout)
                            .fuse();
                        tokio::pin!(message_stream);

                        let reply = self.handler.on_message(&mut self.context, message_stream).await;
                        let denied = match std::mem::take(&mut self.context).outcome {
                            Some(HandshakeOutcome::Abort(error)) => {
                                Err::<(), _>(error)?;
                                true
                            }
                            outcome => outcome.is_some(),
                        };

                        self.writer
                            .send_reply(&mut self.context, &mut self.error_counter, &mut self.handler, reply)
                            .await?;

                        yield ();

                        if denied || std::mem::take(&mut self.context).outcome.is_some() {
                            return;
                        }
                    },
                    HandshakeOutcome::Quit => break,
                    HandshakeOutcome::Abort(error) => {
                        Err::<(), _>(error)?;
                    },
                }
            }
        }
    }

    /// SMTP handshake (generate the envelope and metadata).
    ///
    /// Return when a message is about to be received, or when the session is over.
    #[allow(clippy::too_many_lines)]
    async fn smtp_handshake(&mut self) -> Result<HandshakeOutcome, Error> {
        macro_rules! handle_args {
            ($args_output:ty, $args:expr, $on_event:tt) => {
                match <$args_output>::try_from($args) {
                    Ok(args) => self.handler.$on_event(&mut self.context, args).await,
                    Err(e) => self.handler.on_args_error(e).await,
                }
            };
        }

        loop {
            let timeout = self.handler.get_timeout();
            let command = tokio::select! {
                biased;
                () = self.token.cancelled() => None,
                command = tokio::time::timeout(timeout, self.reader.next_command()) => Some(command),
            };

            let command = match command {
                None => {
                    tracing::info!("Server shutting down, closing the session.");
                    let reply = self.handler.on_shutdown().await;
                    self.writer.write_all(reply.as_ref()).await?;
                    return Ok(HandshakeOutcome::Quit);
                }
                Some(Err(_elapsed)) => {
                    tracing::warn!(?timeout, "Closing after timeout without receiving a command.");
                    let reply = self.handler.on_timeout(&mut self.context, timeout).await;
                    self.writer.write_all(reply.as_ref()).await?;
                    return Ok(HandshakeOutcome::Quit);
                }
                Some(Ok(Ok(Some(command)))) => command,
                Some(Ok(Ok(None))) => {
                    tracing::debug!("Connection closed by the client.");
                    return Ok(HandshakeOutcome::Quit);
                }
                Some(Ok(Err(Error::BufferTooLong { expected, got }))) => {
                    let reply = self
                        .handler
                        .on_args_error(ParseArgsError::BufferTooLong { expected, got })
                        .await;
                    self.writer
                        .send_reply(
                            &mut self.context,
                            &mut self.error_counter,
                            &mut self.handler,
                            reply,
                        )
                        .await?;
                    if let Some(done) = std::mem::take(&mut self.context).outcome {
                        return Ok(done);
                    }
                    continue;
                }
                Some(Ok(Err(error))) => return Err(error),
            };

            let (verb, args) = command;
            let stage = self.handler.get_stage();
            tracing::trace!(?verb, %stage, "Command received.");

            let reply = match (verb, stage) {
                (Verb::Helo, _) => handle_args!(HeloArgs, args, on_helo),
                (Verb::Ehlo, _) => handle_args!(EhloArgs, args, on_ehlo),
                (Verb::Noop, _) => self.handler.on_noop().await,
                (Verb::Rset, _) => self.handler.on_rset().await,
                (Verb::MailFrom, Stage::Ready) => handle_args!(MailFromArgs, args, on_mail_from),
                (Verb::RcptTo, Stage::MailFrom | Stage::RcptTo) => {
                    handle_args!(RcptToArgs, args, on_rcpt_to)
                }
                (Verb::Data, Stage::RcptTo) => {
                    self.context.outcome = Some(HandshakeOutcome::Message);
                    self.handler.on_data().await
                }
                (Verb::Quit, _) => {
                    self.context.outcome = Some(HandshakeOutcome::Quit);
                    self.handler.on_quit().await
                }
                (Verb::Help, _) => self.handler.on_help(args).await,
                (Verb::Unknown, _) => self.handler.on_unknown(args.0).await,
                otherwise => self.handler.on_bad_sequence(otherwise).await,
            };

            if let Some(HandshakeOutcome::Abort(_)) = self.context.outcome {
                if let Some(done) = std::mem::take(&mut self.context).outcome {
                    return Ok(done);
                }
            }

            self.writer
                .send_reply(
                    &mut self.context,
                    &mut self.error_counter,
                    &mut self.handler,
                    reply,
                )
                .await?;

            let produced_context = std::mem::take(&mut self.context);
            if let Some(done) = produced_context.outcome {
                return Ok(done);
            }
        }
    }
}
