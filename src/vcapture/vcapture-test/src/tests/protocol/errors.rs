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
use crate::{config::local_test, run_test};
use pretty_assertions::assert_eq;

run_test! {
    fn test_receiver_bad_sequence,
    input = [
        "MAIL FROM:<john@doe.com>\r\n",
        "HELO foobar\r\n",
        "RCPT TO:<aa@bb.com>\r\n",
        "DATA\r\n",
        "MAIL FROM:<john@doe.com>\r\n",
        "MAIL FROM:<john@doe.com>\r\n",
        "DATA\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "503 Bad sequence of commands\r\n",
        "250 testserver.com\r\n",
        "503 Bad sequence of commands\r\n",
        "503 Bad sequence of commands\r\n",
        "250 Ok\r\n",
        "503 Bad sequence of commands\r\n",
        "503 Bad sequence of commands\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    records = |records| {
        assert!(records.is_empty());
    }
}

run_test! {
    fn test_receiver_syntax_error,
    input = [
        "HELO\r\n",
        "HELO foobar\r\n",
        "MAIL FROM:\r\n",
        "MAIL FROM:<john@doe.com\r\n",
        "MAIL FROM:<not an address>\r\n",
        "MAIL FROM:<john@doe.com>\r\n",
        "RCPT TO:<>\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "501 Syntax error in parameters or arguments\r\n",
        "250 testserver.com\r\n",
        "501 Syntax error in parameters or arguments\r\n",
        "501 Syntax error in parameters or arguments\r\n",
        "501 Syntax error in parameters or arguments\r\n",
        "250 Ok\r\n",
        "501 Syntax error in parameters or arguments\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat()
}

run_test! {
    fn test_receiver_line_too_long,
    input = [
        format!("HELO {}\r\n", "a".repeat(600)).as_str(),
        "HELO foobar\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "500 Line too long\r\n",
        "250 testserver.com\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat()
}

run_test! {
    fn test_receiver_line_length_limit,
    input = [
        format!("NOOP {}\r\n", "a".repeat(505)).as_str(),
        format!("NOOP {}\r\n", "a".repeat(506)).as_str(),
        "QUIT\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "250 Ok\r\n",
        "500 Line too long\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat()
}

run_test! {
    fn test_receiver_too_many_recipients,
    input = [
        "HELO foobar\r\n",
        "MAIL FROM:<john@doe.com>\r\n",
        "RCPT TO:<aa@bb.com>\r\n",
        "RCPT TO:<cc@dd.com>\r\n",
        "RCPT TO:<ee@ff.com>\r\n",
        "DATA\r\n",
        "\r\n",
        ".\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "250 testserver.com\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "452 Requested action not taken: too many recipients\r\n",
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "250 Ok\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    config = {
        let mut config = local_test();
        config.server.smtp.rcpt_count_max = 2;
        config
    },
    records = |records| {
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rcpt_to.len(), 2);
    }
}

run_test! {
    fn test_receiver_hard_error,
    input = [
        "foo\r\n",
        "bar\r\n",
        "baz\r\n",
        "HELO foobar\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "500 Syntax error command unrecognized\r\n",
        "500 Syntax error command unrecognized\r\n",
        "451-Syntax error command unrecognized\r\n",
        "451 Too many errors from the client\r\n",
    ].concat(),
    config = {
        let mut config = local_test();
        config.server.smtp.error.soft_count = -1;
        config.server.smtp.error.hard_count = 3;
        config
    }
}

run_test! {
    fn test_receiver_soft_error,
    input = [
        "foo\r\n",
        "bar\r\n",
        "HELO foobar\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "500 Syntax error command unrecognized\r\n",
        "500 Syntax error command unrecognized\r\n",
        "250 testserver.com\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    config = {
        let mut config = local_test();
        config.server.smtp.error.soft_count = 1;
        config.server.smtp.error.hard_count = -1;
        config.server.smtp.error.delay = std::time::Duration::from_millis(10);
        config
    }
}

#[tokio::test]
async fn test_receiver_eof_during_data() {
    let (result, records) = crate::receiver::test_receiver_inner(
        [
            "HELO foobar\r\n",
            "MAIL FROM:<john@doe.com>\r\n",
            "RCPT TO:<aa@bb.com>\r\n",
            "DATA\r\n",
            "Subject: cut\r\n",
        ]
        .concat()
        .as_bytes(),
        [
            "220 testserver.com Service ready\r\n",
            "250 testserver.com\r\n",
            "250 Ok\r\n",
            "250 Ok\r\n",
            "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        ]
        .concat()
        .as_bytes(),
        std::sync::Arc::new(local_test()),
        crate::receiver::CancellationToken::new(),
    )
    .await;

    assert!(result.is_err());
    assert!(records.is_empty());
}
