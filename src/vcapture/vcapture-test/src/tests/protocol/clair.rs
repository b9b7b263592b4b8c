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
use crate::run_test;
use pretty_assertions::assert_eq;
use vcapture_common::{addr, ClientName};

run_test! {
    fn test_receiver_helo_quit,
    input = ["HELO foobar\r\n", "QUIT\r\n"].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "250 testserver.com\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    records = |records| {
        assert!(records.is_empty());
    }
}

run_test! {
    fn test_receiver_ehlo,
    input = ["EHLO client.local\r\n", "QUIT\r\n"].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "250-testserver.com\r\n",
        "250-8BITMIME\r\n",
        "250-SMTPUTF8\r\n",
        "250-PIPELINING\r\n",
        "250 SIZE 10000000\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat()
}

run_test! {
    fn test_receiver_full_transaction,
    input = [
        "EHLO client.local\r\n",
        "MAIL FROM:<john@doe.com>\r\n",
        "RCPT TO:<aa@bb.com>\r\n",
        "RCPT TO:<cc@dd.com>\r\n",
        "DATA\r\n",
        "Subject: hello\r\n",
        "\r\n",
        "..dot\r\n",
        "body\r\n",
        ".\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "250-testserver.com\r\n",
        "250-8BITMIME\r\n",
        "250-SMTPUTF8\r\n",
        "250-PIPELINING\r\n",
        "250 SIZE 10000000\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "250 Ok\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    records = |records| {
        assert_eq!(records.len(), 1);
        let record = &records[0];

        assert_eq!(record.client_name, ClientName::Domain("client.local".to_string()));
        assert_eq!(record.mail_from, Some(addr!("john@doe.com")));
        assert_eq!(record.rcpt_to, vec![addr!("aa@bb.com"), addr!("cc@dd.com")]);
        assert_eq!(record.raw, b"Subject: hello\r\n\r\n.dot\r\nbody\r\n".to_vec());
        assert_eq!(record.mail.subject.as_deref(), Some("hello"));
        assert_eq!(record.mail.parts.len(), 1);
        assert_eq!(record.mail.parts[0].content, b".dot\r\nbody\r\n".to_vec());
    }
}

run_test! {
    fn test_receiver_lowercase_without_brackets,
    input = [
        "helo foobar\r\n",
        "mail from: john@doe.com SIZE=42\r\n",
        "rcpt to: aa@bb.com\r\n",
        "data\r\n",
        "Subject: lowercase\r\n",
        "\r\n",
        ".\r\n",
        "quit\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "250 testserver.com\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "250 Ok\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    records = |records| {
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mail_from, Some(addr!("john@doe.com")));
        assert_eq!(records[0].rcpt_to, vec![addr!("aa@bb.com")]);
    }
}

run_test! {
    fn test_receiver_null_sender,
    input = [
        "HELO foobar\r\n",
        "MAIL FROM:<>\r\n",
        "RCPT TO:<postmaster@doe.com>\r\n",
        "DATA\r\n",
        "Subject: bounce\r\n",
        "\r\n",
        "undelivered\r\n",
        ".\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "250 testserver.com\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "250 Ok\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    records = |records| {
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mail_from, None);
    }
}

run_test! {
    fn test_receiver_two_messages,
    input = [
        "HELO foobar\r\n",
        "MAIL FROM:<john@doe.com>\r\n",
        "RCPT TO:<aa@bb.com>\r\n",
        "DATA\r\n",
        "Subject: first\r\n",
        "\r\n",
        ".\r\n",
        "MAIL FROM:<jane@doe.com>\r\n",
        "RCPT TO:<cc@dd.com>\r\n",
        "DATA\r\n",
        "Subject: second\r\n",
        "\r\n",
        ".\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "250 testserver.com\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "250 Ok\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    records = |records| {
        assert_eq!(
            records
                .iter()
                .map(|record| record.mail.subject.clone())
                .collect::<Vec<_>>(),
            vec![Some("first".to_string()), Some("second".to_string())]
        );
        assert_eq!(records[1].mail_from, Some(addr!("jane@doe.com")));
        assert_eq!(records[1].rcpt_to, vec![addr!("cc@dd.com")]);
        assert_ne!(records[0].uuid, records[1].uuid);
    }
}

run_test! {
    fn test_receiver_help_noop,
    input = ["NOOP\r\n", "HELP\r\n", "HELP DATA\r\n", "QUIT\r\n"].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "250 Ok\r\n",
        "214 Commands supported: HELO EHLO MAIL RCPT DATA RSET NOOP QUIT HELP\r\n",
        "214 Commands supported: HELO EHLO MAIL RCPT DATA RSET NOOP QUIT HELP\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat()
}

run_test! {
    fn test_receiver_client_address_literal,
    input = [
        "HELO [127.0.0.1]\r\n",
        "MAIL FROM:<john@doe.com>\r\n",
        "RCPT TO:<aa@bb.com>\r\n",
        "DATA\r\n",
        "\r\n",
        ".\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "250 testserver.com\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "250 Ok\r\n",
    ].concat(),
    records = |records| {
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].client_name, ClientName::Ip4("127.0.0.1".parse().unwrap()));
        assert!(records[0].mail.headers.is_empty());
    }
}
