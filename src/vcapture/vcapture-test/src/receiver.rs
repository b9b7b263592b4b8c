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
use vcapture_common::MailRecord;
use vcapture_config::Config;
use vcapture_protocol::{AcceptArgs, ErrorCounter, Receiver};
use vcapture_server::Handler;

pub use vcapture_protocol::CancellationToken;

/// A type implementing Write+Read to emulate sockets
#[derive(Debug)]
pub struct Mock<'a, T: AsRef<[u8]> + Unpin> {
    read_cursor: std::io::Cursor<T>,
    write_cursor: std::io::Cursor<&'a mut Vec<u8>>,
}

impl<'a, T: AsRef<[u8]> + Unpin> Mock<'a, T> {
    /// Create an new instance
    pub fn new(read: T, write: &'a mut Vec<u8>) -> Self {
        Self {
            read_cursor: std::io::Cursor::new(read),
            write_cursor: std::io::Cursor::new(write),
        }
    }
}

impl<T: AsRef<[u8]> + Unpin> tokio::io::AsyncRead for Mock<'_, T> {
    fn poll_read(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::result::Result<(), std::io::Error>> {
        std::pin::Pin::new(&mut self.read_cursor).poll_read(cx, buf)
    }
}

impl<T: AsRef<[u8]> + Unpin> tokio::io::AsyncWrite for Mock<'_, T> {
    fn poll_write(
        mut self: std::pin::Pin<&mut Self>,
        _: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<Result<usize, std::io::Error>> {
        std::task::Poll::Ready(std::io::Write::write(&mut self.write_cursor, buf))
    }

    fn poll_flush(
        mut self: std::pin::Pin<&mut Self>,
        _: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), std::io::Error>> {
        std::task::Poll::Ready(std::io::Write::flush(&mut self.write_cursor))
    }

    fn poll_shutdown(
        self: std::pin::Pin<&mut Self>,
        _: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), std::io::Error>> {
        std::task::Poll::Ready(Ok(()))
    }
}

/// Run a session over `reader` and `writer`, return the outcome of the session
/// and the records pushed to the delivery queue.
pub async fn run_session<R, W>(
    reader: R,
    writer: W,
    config: std::sync::Arc<Config>,
    token: CancellationToken,
) -> (anyhow::Result<()>, Vec<MailRecord>)
where
    R: tokio::io::AsyncRead + Unpin + Send,
    W: tokio::io::AsyncWrite + Unpin + Send,
{
    let client_addr = "127.0.0.1:53844".parse().unwrap();
    let (sender, mut delivery) =
        tokio::sync::mpsc::channel(config.server.queues.delivery.channel_size);

    let result = {
        let receiver = Receiver::new(
            reader,
            writer,
            Handler::new(config.clone(), sender, client_addr),
            ErrorCounter::new(
                config.server.smtp.error.soft_count,
                config.server.smtp.error.hard_count,
            ),
            config.server.message_size_limit,
            token,
        );
        let stream = receiver.into_stream(AcceptArgs {
            client_addr,
            server_addr: "127.0.0.1:53845".parse().unwrap(),
        });
        tokio::pin!(stream);

        let mut result = Ok(());
        while let Some(message) = stream.next().await {
            if let Err(error) = message {
                result = Err(anyhow::Error::from(error));
            }
        }
        result
    };

    let mut records = vec![];
    while let Some(record) = delivery.recv().await {
        records.push(record);
    }
    (result, records)
}

/// run a session and assert the output produced by the server is `expected_output`
///
/// # Panics
///
/// * the output is not the one expected
pub async fn test_receiver_inner(
    smtp_input: &[u8],
    expected_output: &[u8],
    config: std::sync::Arc<Config>,
    token: CancellationToken,
) -> (anyhow::Result<()>, Vec<MailRecord>) {
    let mut written_data = Vec::new();
    let outcome = {
        let mock = Mock::new(smtp_input.to_vec(), &mut written_data);
        let (reader, writer) = tokio::io::split(mock);
        run_session(reader, writer, config, token).await
    };

    pretty_assertions::assert_eq!(
        std::str::from_utf8(expected_output),
        std::str::from_utf8(&written_data),
    );

    outcome
}

/// Generate a test running a scripted session, with [`crate::config::local_test`]
/// unless `config` is given.
///
/// ```ignore
/// run_test! {
///     fn name,
///     input = concat!["HELO foo\r\n", "QUIT\r\n"],
///     expected = concat![
///         "220 testserver.com Service ready\r\n",
///         "250 testserver.com\r\n",
///         "221 Service closing transmission channel\r\n",
///     ],
///     config = { ... },               // optional
///     cancelled = true,               // optional, the server is shutting down
///     records = |records| { ... },    // optional, the mails captured
/// }
/// ```
#[macro_export]
macro_rules! run_test {
    (
        fn $name:ident,
        input = $input:expr,
        expected = $expected:expr
        $(, config = $config:expr)?
        $(, cancelled = $cancelled:expr)?
        $(, records = |$records:ident| $check:block)?
        $(,)?
    ) => {
        #[tokio::test]
        async fn $name() {
            #[allow(unused_mut, unused_assignments)]
            let mut config = $crate::config::local_test();
            $( config = $config; )?

            let token = $crate::receiver::CancellationToken::new();
            $( if $cancelled { token.cancel(); } )?

            let (_result, _records) = $crate::receiver::test_receiver_inner(
                $input.as_bytes(),
                $expected.as_bytes(),
                std::sync::Arc::new(config),
                token,
            )
            .await;

            $(
                let $records: Vec<vcapture_common::MailRecord> = _records;
                $check
            )?
        }
    };
}
