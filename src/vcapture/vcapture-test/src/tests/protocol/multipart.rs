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
use vcapture_mail_parser::TransferEncoding;

const ENVELOPE: [&str; 4] = [
    "HELO foobar\r\n",
    "MAIL FROM:<john@doe.com>\r\n",
    "RCPT TO:<aa@bb.com>\r\n",
    "DATA\r\n",
];

const ACCEPTED: [&str; 4] = [
    "220 testserver.com Service ready\r\n",
    "250 testserver.com\r\n",
    "250 Ok\r\n",
    "250 Ok\r\n",
];

run_test! {
    fn test_receiver_multipart,
    input = [
        ENVELOPE.concat().as_str(),
        "From: john@doe.com\r\n",
        "Subject: multipart\r\n",
        "MIME-Version: 1.0\r\n",
        "Content-Type: multipart/mixed; boundary=\"sep\"\r\n",
        "\r\n",
        "This is a multi-part message in MIME format.\r\n",
        "--sep\r\n",
        "Content-Type: text/plain; charset=us-ascii\r\n",
        "\r\n",
        "plain text\r\n",
        "--sep\r\n",
        "Content-Type: text/html; charset=\"utf-8\"\r\n",
        "Content-Transfer-Encoding: quoted-printable\r\n",
        "\r\n",
        "<p>caf=C3=A9</p>\r\n",
        "--sep\r\n",
        "Content-Type: application/octet-stream; name=\"data.bin\"\r\n",
        "Content-Disposition: attachment; filename=\"hello.txt\"\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "aGVsbG8gd29ybGQ=\r\n",
        "--sep--\r\n",
        "epilogue\r\n",
        ".\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        ACCEPTED.concat().as_str(),
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "250 Ok\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    records = |records| {
        assert_eq!(records.len(), 1);
        let mail = &records[0].mail;

        assert_eq!(mail.subject.as_deref(), Some("multipart"));
        assert_eq!(mail.entity_count(), 3);

        assert_eq!(mail.parts[0].content_type, "text/plain");
        assert_eq!(mail.parts[0].charset.as_deref(), Some("us-ascii"));
        assert_eq!(mail.parts[0].transfer_encoding, TransferEncoding::SevenBit);
        assert_eq!(mail.parts[0].content, b"plain text".to_vec());

        let html = mail.part_by_type("text/html").unwrap();
        assert_eq!(html.transfer_encoding, TransferEncoding::QuotedPrintable);
        assert_eq!(html.content, "<p>café</p>".as_bytes().to_vec());

        assert_eq!(mail.attachments.len(), 1);
        assert_eq!(mail.attachments[0].filename, "hello.txt");
        assert_eq!(mail.attachments[0].content_type, "application/octet-stream");
        assert_eq!(mail.attachments[0].transfer_encoding, TransferEncoding::Base64);
        assert_eq!(mail.attachments[0].content, b"hello world".to_vec());
    }
}

run_test! {
    fn test_receiver_nested_multipart,
    input = [
        ENVELOPE.concat().as_str(),
        "Subject: nested\r\n",
        "Content-Type: multipart/mixed; boundary=outer\r\n",
        "\r\n",
        "--outer\r\n",
        "Content-Type: multipart/alternative; boundary=inner\r\n",
        "\r\n",
        "--inner\r\n",
        "\r\n",
        "text version\r\n",
        "--inner\r\n",
        "Content-Type: text/html\r\n",
        "\r\n",
        "<b>html version</b>\r\n",
        "--inner--\r\n",
        "--outer\r\n",
        "Content-Type: image/png\r\n",
        "Content-ID: <logo@doe.com>\r\n",
        "Content-Disposition: inline; filename=logo.png\r\n",
        "Content-Transfer-Encoding: base64\r\n",
        "\r\n",
        "iVBORw0K\r\n",
        "--outer--\r\n",
        ".\r\n",
    ].concat(),
    expected = [
        ACCEPTED.concat().as_str(),
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "250 Ok\r\n",
    ].concat(),
    records = |records| {
        let mail = &records[0].mail;

        assert_eq!(
            mail.parts
                .iter()
                .map(|part| part.content_type.as_str())
                .collect::<Vec<_>>(),
            vec!["text/plain", "text/html"]
        );
        assert_eq!(mail.parts[0].content, b"text version".to_vec());
        assert_eq!(mail.attachments[0].filename, "logo.png");
        assert_eq!(mail.attachments[0].content_id.as_deref(), Some("logo@doe.com"));
        assert_eq!(mail.attachments[0].content, b"\x89PNG\r\n".to_vec());
    }
}

run_test! {
    fn test_receiver_misplaced_boundary,
    input = [
        ENVELOPE.concat().as_str(),
        "Subject: broken\r\n",
        "Content-Type: multipart/mixed; boundary=\"foo\"\r\n",
        "\r\n",
        "no boundary here\r\n",
        ".\r\n",
        "MAIL FROM:<john@doe.com>\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        ACCEPTED.concat().as_str(),
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "554 5.6.0 Malformed message: Misplaced boundary in mime message, 'foo' never opens a part\r\n",
        "250 Ok\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    records = |records| {
        assert!(records.is_empty());
    }
}

run_test! {
    fn test_receiver_invalid_header,
    input = [
        ENVELOPE.concat().as_str(),
        "not a header\r\n",
        "\r\n",
        "body\r\n",
        ".\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        ACCEPTED.concat().as_str(),
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "554 5.6.0 Malformed message: parsing email failed: invalid header line 'not a header'\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    records = |records| {
        assert!(records.is_empty());
    }
}

run_test! {
    fn test_receiver_unknown_encoding,
    input = [
        ENVELOPE.concat().as_str(),
        "Content-Transfer-Encoding: x-uuencode\r\n",
        "\r\n",
        "begin 644 file\r\n",
        ".\r\n",
    ].concat(),
    expected = [
        ACCEPTED.concat().as_str(),
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "554 5.6.0 Malformed message: cannot decode content with encoding 'x-uuencode': unknown encoding\r\n",
    ].concat()
}

run_test! {
    fn test_receiver_headers_only,
    input = [
        ENVELOPE.concat().as_str(),
        "From: john@doe.com\r\n",
        "Subject: no body\r\n",
        ".\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        ACCEPTED.concat().as_str(),
        "354 Start mail input; end with <CRLF>.<CRLF>\r\n",
        "250 Ok\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat(),
    records = |records| {
        assert_eq!(records.len(), 1);
        let mail = &records[0].mail;

        assert_eq!(mail.subject.as_deref(), Some("no body"));
        assert_eq!(mail.headers.len(), 2);
        assert!(mail.parts[0].content.is_empty());
    }
}
