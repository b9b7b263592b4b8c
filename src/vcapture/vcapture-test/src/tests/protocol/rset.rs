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
use vcapture_common::addr;

run_test! {
    fn test_receiver_rset_before_helo,
    input = [
        "RSET\r\n",
        "MAIL FROM:<john@doe.com>\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "250 Ok\r\n",
        "503 Bad sequence of commands\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat()
}

run_test! {
    fn test_receiver_rset_transaction,
    input = [
        "HELO foobar\r\n",
        "MAIL FROM:<john@doe.com>\r\n",
        "RCPT TO:<aa@bb.com>\r\n",
        "RSET\r\n",
        "DATA\r\n",
        "RSET\r\n",
        "RSET\r\n",
        "MAIL FROM:<jane@doe.com>\r\n",
        "RCPT TO:<cc@dd.com>\r\n",
        "DATA\r\n",
        "Subject: after reset\r\n",
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
        "503 Bad sequence of commands\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "250 Ok\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    records = |records| {
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].mail_from, Some(addr!("jane@doe.com")));
        assert_eq!(records[0].rcpt_to, vec![addr!("cc@dd.com")]);
    }
}

run_test! {
    fn test_receiver_helo_resets_transaction,
    input = [
        "HELO foobar\r\n",
        "MAIL FROM:<john@doe.com>\r\n",
        "RCPT TO:<aa@bb.com>\r\n",
        "EHLO other\r\n",
        "DATA\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "250 testserver.com\r\n",
        "250 Ok\r\n",
        "250 Ok\r\n",
        "250-testserver.com\r\n",
        "250-8BITMIME\r\n",
        "250-SMTPUTF8\r\n",
        "250-PIPELINING\r\n",
        "250 SIZE 10000000\r\n",
        "503 Bad sequence of commands\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    records = |records| {
        assert!(records.is_empty());
    }
}
