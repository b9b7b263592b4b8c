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
use tokio_stream::StreamExt;
use vcapture_common::{Address, ClientName, CodeID, MailRecord, Reply, ReplyCode, Stage};
use vcapture_config::Config;
use vcapture_mail_parser::{MailMimeParser, MailParser};
use vcapture_protocol::{
    AcceptArgs, EhloArgs, Error, HeloArgs, MailFromArgs, ParseArgsError, RcptToArgs,
    ReceiverContext, UnparsedArgs, Verb,
};

/// State of a SMTP session, producing the replies from the configuration
/// and pushing the captured mails to the delivery queue.
pub struct Handler {
    config: std::sync::Arc<Config>,
    delivery: tokio::sync::mpsc::Sender<MailRecord>,
    client_addr: std::net::SocketAddr,
    stage: Stage,
    client_name: Option<ClientName>,
    reverse_path: Option<Option<Address>>,
    forward_paths: Vec<Address>,
}

impl Handler {
    ///
    #[must_use]
    pub fn new(
        config: std::sync::Arc<Config>,
        delivery: tokio::sync::mpsc::Sender<MailRecord>,
        client_addr: std::net::SocketAddr,
    ) -> Self {
        Self {
            config,
            delivery,
            client_addr,
            stage: Stage::Greeting,
            client_name: None,
            reverse_path: None,
            forward_paths: vec![],
        }
    }

    fn reply_in_config(&self, code: CodeID) -> Reply {
        self.config
            .server
            .smtp
            .codes
            .get(&code)
            .cloned()
            .unwrap_or_else(|| {
                tracing::error!(%code, "Reply code missing in the configuration.");
                Reply::new(
                    ReplyCode::Code { code: 451 },
                    "Requested action aborted: local error in processing",
                )
            })
    }

    fn reset_transaction(&mut self) {
        self.reverse_path = None;
        self.forward_paths.clear();
        self.stage = if self.client_name.is_some() {
            Stage::Ready
        } else {
            Stage::Greeting
        };
    }

    fn on_greeting(&mut self, client_name: ClientName) {
        tracing::debug!(%client_name, "Client identified.");
        self.client_name = Some(client_name);
        self.reset_transaction();
    }

    async fn on_message_inner(
        &mut self,
        ctx: &mut ReceiverContext,
        mut stream: impl tokio_stream::Stream<Item = Result<Vec<u8>, Error>> + Send + Unpin,
    ) -> Reply {
        let mut lines = vec![];
        let mut failure = None;
        while let Some(line) = stream.next().await {
            match line {
                Ok(line) => lines.push(line),
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }

        match failure {
            None => {}
            Some(Error::BufferTooLong { expected, got }) => {
                tracing::warn!(limit = expected, size = got, "Message rejected, too big.");
                self.reset_transaction();
                return self.reply_in_config(CodeID::MessageSizeExceeded);
            }
            Some(Error::Timeout(timeout)) => {
                tracing::warn!(?timeout, "Timeout while receiving the message.");
                ctx.deny();
                self.stage = Stage::Aborted;
                return self.reply_in_config(CodeID::Timeout);
            }
            Some(error) => {
                tracing::warn!(%error, "Connection lost while receiving the message.");
                self.stage = Stage::Aborted;
                ctx.abort(error);
                return self.reply_in_config(CodeID::Failure);
            }
        }

        let raw = lines.concat();
        let mail = match MailMimeParser::default().parse_sync(lines) {
            Ok(mail) => mail,
            Err(error) => {
                tracing::warn!(%error, "Message rejected, cannot be parsed.");
                self.reset_transaction();
                let reply = self.reply_in_config(CodeID::MalformedMessage);
                return match reply.text().split_last() {
                    Some((last, rest)) => {
                        let mut text = rest.to_vec();
                        text.push(format!("{last}: {error}"));
                        Reply::new(reply.code().clone(), text.join("\n"))
                    }
                    None => reply,
                };
            }
        };

        let client_name = self.client_name.clone().unwrap_or_else(|| {
            match self.client_addr.ip() {
                std::net::IpAddr::V4(ip) => ClientName::Ip4(ip),
                std::net::IpAddr::V6(ip) => ClientName::Ip6(ip),
            }
        });
        let record = MailRecord::new(
            self.client_addr,
            client_name,
            self.reverse_path.take().flatten(),
            std::mem::take(&mut self.forward_paths),
            mail,
            raw,
        );
        let uuid = record.uuid;
        self.reset_transaction();

        match self.delivery.send(record).await {
            Ok(()) => {
                tracing::info!(%uuid, "Message captured.");
                self.reply_in_config(CodeID::Ok)
            }
            Err(error) => {
                tracing::error!(%uuid, %error, "Delivery queue closed, message lost.");
                self.reply_in_config(CodeID::Failure)
            }
        }
    }
}

#[async_trait::async_trait]
impl vcapture_protocol::ReceiverHandler for Handler {
    fn get_stage(&self) -> Stage {
        self.stage
    }

    fn get_timeout(&self) -> std::time::Duration {
        let timeout = &self.config.server.smtp.timeout_client;
        match self.stage {
            Stage::Greeting | Stage::Complete | Stage::Aborted => timeout.connect,
            Stage::Ready => timeout.helo,
            Stage::MailFrom => timeout.mail_from,
            Stage::RcptTo => timeout.rcpt_to,
            Stage::Data => timeout.data,
        }
    }

    async fn on_accept(&mut self, _: &mut ReceiverContext, args: AcceptArgs) -> Reply {
        tracing::info!(client = %args.client_addr, server = %args.server_addr, "Session started.");
        self.reply_in_config(CodeID::Greetings)
    }

    async fn on_helo(&mut self, _: &mut ReceiverContext, args: HeloArgs) -> Reply {
        self.on_greeting(args.client_name);
        self.reply_in_config(CodeID::Helo)
    }

    async fn on_ehlo(&mut self, _: &mut ReceiverContext, args: EhloArgs) -> Reply {
        self.on_greeting(args.client_name);
        self.reply_in_config(CodeID::Ehlo)
    }

    async fn on_mail_from(&mut self, _: &mut ReceiverContext, args: MailFromArgs) -> Reply {
        self.reverse_path = Some(args.reverse_path);
        self.forward_paths.clear();
        self.stage = Stage::MailFrom;
        self.reply_in_config(CodeID::Ok)
    }

    async fn on_rcpt_to(&mut self, _: &mut ReceiverContext, args: RcptToArgs) -> Reply {
        if self.forward_paths.len() >= self.config.server.smtp.rcpt_count_max {
            tracing::warn!(
                max = self.config.server.smtp.rcpt_count_max,
                "Too many recipients."
            );
            return self.reply_in_config(CodeID::TooManyRecipients);
        }

        self.forward_paths.push(args.forward_path);
        self.stage = Stage::RcptTo;
        self.reply_in_config(CodeID::Ok)
    }

    async fn on_message(
        &mut self,
        ctx: &mut ReceiverContext,
        stream: impl tokio_stream::Stream<Item = Result<Vec<u8>, Error>> + Send + Unpin,
    ) -> Reply {
        self.on_message_inner(ctx, stream).await
    }

    async fn on_hard_error(&mut self, ctx: &mut ReceiverContext, reply: Reply) -> Reply {
        tracing::warn!("Too many errors, closing the session.");
        ctx.deny();
        self.stage = Stage::Aborted;
        reply.extended(&self.reply_in_config(CodeID::TooManyError))
    }

    async fn on_soft_error(&mut self, _: &mut ReceiverContext, reply: Reply) -> Reply {
        tokio::time::sleep(self.config.server.smtp.error.delay).await;
        reply
    }

    async fn on_rset(&mut self) -> Reply {
        self.reset_transaction();
        self.reply_in_config(CodeID::Ok)
    }

    async fn on_data(&mut self) -> Reply {
        self.stage = Stage::Data;
        self.reply_in_config(CodeID::DataStart)
    }

    async fn on_quit(&mut self) -> Reply {
        self.stage = Stage::Complete;
        self.reply_in_config(CodeID::Closing)
    }

    async fn on_noop(&mut self) -> Reply {
        self.reply_in_config(CodeID::Ok)
    }

    async fn on_help(&mut self, _: UnparsedArgs) -> Reply {
        self.reply_in_config(CodeID::Help)
    }

    async fn on_timeout(&mut self, _: &mut ReceiverContext, _: std::time::Duration) -> Reply {
        self.stage = Stage::Aborted;
        self.reply_in_config(CodeID::Timeout)
    }

    async fn on_shutdown(&mut self) -> Reply {
        self.stage = Stage::Aborted;
        self.reply_in_config(CodeID::ShuttingDown)
    }

    async fn on_unknown(&mut self, buffer: Vec<u8>) -> Reply {
        let verb = buffer
            .split(u8::is_ascii_whitespace)
            .next()
            .unwrap_or_default();

        if [b"VRFY" as &[u8], b"EXPN" as &[u8], b"TURN" as &[u8]]
            .iter()
            .any(|unimplemented| verb.eq_ignore_ascii_case(unimplemented))
        {
            self.reply_in_config(CodeID::Unimplemented)
        } else {
            self.reply_in_config(CodeID::UnrecognizedCommand)
        }
    }

    async fn on_bad_sequence(&mut self, (verb, stage): (Verb, Stage)) -> Reply {
        tracing::debug!(?verb, %stage, "Bad sequence of commands.");
        self.reply_in_config(CodeID::BadSequence)
    }

    async fn on_args_error(&mut self, error: ParseArgsError) -> Reply {
        tracing::debug!(%error, "Invalid arguments.");
        match error {
            ParseArgsError::BufferTooLong { .. } => self.reply_in_config(CodeID::LineTooLong),
            _ => self.reply_in_config(CodeID::SyntaxErrorParams),
        }
    }
}
