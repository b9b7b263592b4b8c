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

fn limited() -> vcapture_config::Config {
    let mut config = local_test();
    config.server.message_size_limit = 64;
    config
}

run_test! {
    fn test_receiver_line_over_limit,
    input = [
        "HELO foobar\r\n",
        "MAIL FROM:<john@doe.com>\r\n",
        "RCPT TO:<aa@bb.com>\r\n",
        "DATA\r\n",
        "Subject: too big\r\n",
        "\r\n",
        format!("{}\r\n", "x".repeat(100)).as_str(),
        "last line\r\n",
        ".\r\n",
        "MAIL FROM:<john@doe.com>\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "250 testserver.com\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "552 4.3.1 Message size exceeds fixed maximum message size\r\n",
        "250 Ok\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    config = limited(),
    records = |records| {
        assert!(records.is_empty());
    }
}

run_test! {
    fn test_receiver_total_over_limit,
    input = [
        "HELO foobar\r\n",
        "MAIL FROM:<john@doe.com>\r\n",
        "RCPT TO:<aa@bb.com>\r\n",
        "DATA\r\n",
        "Subject: too big\r\n",
        "\r\n",
        "0123456789012345678901234567890123456789\r\n",
        "0123456789012345678901234567890123456789\r\n",
        ".\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "250 testserver.com\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "552 4.3.1 Message size exceeds fixed maximum message size\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    config = limited(),
    records = |records| {
        assert!(records.is_empty());
    }
}

run_test! {
    fn test_receiver_under_limit,
    input = [
        "HELO foobar\r\n",
        "MAIL FROM:<john@doe.com>\r\n",
        "RCPT TO:<aa@bb.com>\r\n",
        "DATA\r\n",
        "Subject: small\r\n",
        "\r\n",
        "fits\r\n",
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
    config = limited(),
    records = |records| {
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].raw, b"Subject: small\r\n\r\nfits\r\n".to_vec());
    }
}
