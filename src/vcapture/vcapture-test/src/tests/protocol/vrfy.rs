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

run_test! {
    fn test_receiver_unimplemented,
    input = [
        "VRFY john\r\n",
        "expn staff\r\n",
        "TURN\r\n",
        "HELO foobar\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "502 Command not implemented\r\n",
        "502 Command not implemented\r\n",
        "502 Command not implemented\r\n",
        "250 testserver.com\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat()
}

run_test! {
    fn test_receiver_unknown,
    input = [
        "XYZZY\r\n",
        "DATAX\r\n",
        "\r\n",
        "QUIT\r\n",
    ].concat(),
    expected = [
        "220 testserver.com Service ready\r\n",
        "500 Syntax error command unrecognized\r\n",
        "500 Syntax error command unrecognized\r\n",
        "500 Syntax error command unrecognized\r\n",
        "221 Service closing transmission channel\r\n",
    ].concat()
}

#[rstest::rstest]
#[case("VRFY john@doe.com\r\n", "502 Command not implemented\r\n")]
#[case("Expn\r\n", "502 Command not implemented\r\n")]
#[case("VRFYING\r\n", "500 Syntax error command unrecognized\r\n")]
#[case("STARTTLS\r\n", "500 Syntax error command unrecognized\r\n")]
#[case("AUTH PLAIN\r\n", "500 Syntax error command unrecognized\r\n")]
#[tokio::test]
async fn unsupported_before_helo(#[case] command: &str, #[case] reply: &str) {
    crate::receiver::test_receiver_inner(
        command.as_bytes(),
        ["220 testserver.com Service ready\r\n", reply].concat().as_bytes(),
        std::sync::Arc::new(crate::config::local_test()),
        crate::receiver::CancellationToken::new(),
    )
    .await;
}
