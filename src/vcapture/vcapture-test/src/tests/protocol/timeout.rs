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
use crate::{config::local_test, receiver::run_session};
use pretty_assertions::assert_eq;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
use vcapture_protocol::CancellationToken;

fn config() -> std::sync::Arc<vcapture_config::Config> {
    let mut config = local_test();
    config.server.smtp.timeout_client.connect = std::time::Duration::from_secs(10);
    config.server.smtp.timeout_client.mail_from = std::time::Duration::from_secs(20);
    config.server.smtp.timeout_client.data = std::time::Duration::from_secs(30);
    std::sync::Arc::new(config)
}

#[tokio::test(start_paused = true)]
async fn connect_timeout() {
    let (client, server) = tokio::io::duplex(1024);
    let (reader, writer) = tokio::io::split(server);
    let session = tokio::spawn(run_session(
        reader,
        writer,
        config(),
        CancellationToken::new(),
    ));

    let start = tokio::time::Instant::now();
    let mut lines = tokio::io::BufReader::new(client).lines();
    assert_eq!(
        lines.next_line().await.unwrap().unwrap(),
        "220 testserver.com Service ready"
    );
    assert_eq!(
        lines.next_line().await.unwrap().unwrap(),
        "451 Timeout - closing connection"
    );
    assert!(start.elapsed() >= std::time::Duration::from_secs(10));

    let (result, records) = session.await.unwrap();
    assert!(result.is_ok());
    assert!(records.is_empty());
}

#[tokio::test(start_paused = true)]
async fn data_timeout() {
    let (client, server) = tokio::io::duplex(1024);
    let (reader, writer) = tokio::io::split(server);
    let session = tokio::spawn(run_session(
        reader,
        writer,
        config(),
        CancellationToken::new(),
    ));

    let (client_read, mut client_write) = tokio::io::split(client);
    let mut lines = tokio::io::BufReader::new(client_read).lines();
    assert_eq!(
        lines.next_line().await.unwrap().unwrap(),
        "220 testserver.com Service ready"
    );

    for (command, expected) in [
        ("HELO foobar\r\n", "250 testserver.com"),
        ("MAIL FROM:<john@doe.com>\r\n", "250 Ok"),
        ("RCPT TO:<aa@bb.com>\r\n", "250 Ok"),
        ("DATA\r\n", "354 Start mail input; end with <CRLF>.<CRLF>"),
    ] {
        client_write.write_all(command.as_bytes()).await.unwrap();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), expected);
    }

    let start = tokio::time::Instant::now();
    client_write
        .write_all(b"Subject: never ending\r\n")
        .await
        .unwrap();
    assert_eq!(
        lines.next_line().await.unwrap().unwrap(),
        "451 Timeout - closing connection"
    );
    assert!(start.elapsed() >= std::time::Duration::from_secs(30));

    let (result, records) = session.await.unwrap();
    assert!(result.is_ok());
    assert!(records.is_empty());
}
