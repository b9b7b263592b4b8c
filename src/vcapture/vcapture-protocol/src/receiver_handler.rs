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
    receiver::ReceiverContext, AcceptArgs, EhloArgs, Error, HeloArgs, MailFromArgs,
    ParseArgsError, RcptToArgs, UnparsedArgs, Verb,
};
use vcapture_common::{Reply, ReplyCode, Stage};

const fn code(code: u16) -> ReplyCode {
    ReplyCode::Code { code }
}

/// Trait to implement to handle the SMTP commands in pair with the [`Receiver`](crate::Receiver).
#[async_trait::async_trait]
pub trait ReceiverHandler {
    /// The [`Receiver`](crate::Receiver) does not store the context.
    /// This function is called after each command to get the context stage.
    fn get_stage(&self) -> Stage;

    /// Maximum time to wait for the next command (or the next line of the message)
    /// at the current stage.
    fn get_timeout(&self) -> std::time::Duration;

    /// Called when the client connects to the server.
    async fn on_accept(&mut self, ctx: &mut ReceiverContext, args: AcceptArgs) -> Reply;

    /// Called after receiving a [`Verb::Helo`] command.
    async fn on_helo(&mut self, ctx: &mut ReceiverContext, args: HeloArgs) -> Reply;

    /// Called after receiving a [`Verb::Ehlo`] command.
    async fn on_ehlo(&mut self, ctx: &mut ReceiverContext, args: EhloArgs) -> Reply;

    /// Called after receiving a [`Verb::MailFrom`] command.
    async fn on_mail_from(&mut self, ctx: &mut ReceiverContext, args: MailFromArgs) -> Reply;

    /// Called after receiving a [`Verb::RcptTo`] command.
    async fn on_rcpt_to(&mut self, ctx: &mut ReceiverContext, args: RcptToArgs) -> Reply;

    /// Called after receiving a [`Verb::Data`] command.
    /// The stream is the body of the message, with dot-stuffing handled.
    /// The stream return `None` when the message is finished (`.<CRLF>`).
    ///
    /// A [`Error::Io`] or [`Error::UnexpectedEof`] item means the connection is
    /// lost, the handler should call [`ReceiverContext::abort`].
    async fn on_message(
        &mut self,
        ctx: &mut ReceiverContext,
        stream: impl tokio_stream::Stream<Item = Result<Vec<u8>, Error>> + Send + Unpin,
    ) -> Reply;

    /// Called when the number of reply considered as error reached a threshold (hard).
    async fn on_hard_error(&mut self, ctx: &mut ReceiverContext, reply: Reply) -> Reply;

    /// Called when the number of reply considered as error reached a threshold (soft).
    async fn on_soft_error(&mut self, ctx: &mut ReceiverContext, reply: Reply) -> Reply;

    /// Called after receiving a [`Verb::Rset`] command.
    async fn on_rset(&mut self) -> Reply;

    /// Called after receiving a [`Verb::Data`] command.
    async fn on_data(&mut self) -> Reply {
        Reply::new(code(354), "Start mail input; end with <CRLF>.<CRLF>")
    }

    /// Called after receiving a [`Verb::Quit`] command.
    async fn on_quit(&mut self) -> Reply {
        Reply::new(code(221), "Service closing transmission channel")
    }

    /// Called after receiving a [`Verb::Noop`] command.
    async fn on_noop(&mut self) -> Reply {
        Reply::new(code(250), "Ok")
    }

    /// Called after receiving a [`Verb::Help`] command.
    async fn on_help(&mut self, _: UnparsedArgs) -> Reply {
        Reply::new(
            code(214),
            "Commands: HELO EHLO MAIL RCPT DATA RSET NOOP QUIT HELP",
        )
    }

    /// Called when no command is received in time, the connection is then closed.
    async fn on_timeout(&mut self, _: &mut ReceiverContext, _: std::time::Duration) -> Reply {
        Reply::new(code(451), "Timeout - closing connection")
    }

    /// Called when the server stops while waiting for a command, the connection is then closed.
    async fn on_shutdown(&mut self) -> Reply {
        Reply::new(
            code(421),
            "Service not available, closing transmission channel",
        )
    }

    /// Called after receiving an unknown command (unrecognized or unimplemented).
    async fn on_unknown(&mut self, buffer: Vec<u8>) -> Reply {
        let unimplemented_command = [b"VRFY" as &[u8], b"EXPN" as &[u8], b"TURN" as &[u8]];

        if unimplemented_command
            .iter()
            .any(|c| buffer.len() >= c.len() && buffer[..c.len()].eq_ignore_ascii_case(c))
        {
            Reply::new(code(502), "Command not implemented")
        } else {
            Reply::new(code(500), "Syntax error command unrecognized")
        }
    }

    /// Called when the stage of the transaction (obtained with [`get_stage`](Self::get_stage))
    /// and the command are not compatible.
    async fn on_bad_sequence(&mut self, _: (Verb, Stage)) -> Reply {
        Reply::new(code(503), "Bad sequence of commands")
    }

    /// Called when an argument of a command is invalid.
    async fn on_args_error(&mut self, error: ParseArgsError) -> Reply {
        match error {
            ParseArgsError::BufferTooLong { .. } => Reply::new(code(500), "Line too long"),
            _ => Reply::new(code(501), "Syntax error in parameters or arguments"),
        }
    }
}
