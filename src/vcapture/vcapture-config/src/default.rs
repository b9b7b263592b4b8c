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
    config::field::{
        FieldApp, FieldAppStorage, FieldQueueDelivery, FieldServer, FieldServerInterfaces,
        FieldServerLogs, FieldServerPool, FieldServerQueues, FieldServerSMTP, FieldServerSMTPError,
        FieldServerSMTPTimeoutClient, FieldServerShutdown, LogFormat,
    },
    Config,
};
use vcapture_common::{collection, CodeID, Reply, ReplyCode};

impl Default for Config {
    fn default() -> Self {
        Self {
            version_requirement: Self::default_version_requirement(),
            server: FieldServer::default(),
            app: FieldApp::default(),
        }
        .with_codes()
    }
}

impl Config {
    /// `>=1.0.0, <2.0.0`
    pub(crate) fn default_version_requirement() -> semver::VersionReq {
        let comparator = |op, major| semver::Comparator {
            op,
            major,
            minor: Some(0),
            patch: Some(0),
            pre: semver::Prerelease::EMPTY,
        };

        semver::VersionReq {
            comparators: vec![
                comparator(semver::Op::GreaterEq, 1),
                comparator(semver::Op::Less, 2),
            ],
        }
    }
}

impl Default for FieldServer {
    fn default() -> Self {
        Self {
            name: Self::hostname(),
            client_count_max: Self::default_client_count_max(),
            message_size_limit: Self::default_message_size_limit(),
            interfaces: FieldServerInterfaces::default(),
            pool: FieldServerPool::default(),
            shutdown: FieldServerShutdown::default(),
            queues: FieldServerQueues::default(),
            logs: FieldServerLogs::default(),
            smtp: FieldServerSMTP::default(),
        }
    }
}

impl FieldServer {
    pub(crate) fn hostname() -> String {
        hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "localhost".to_string())
    }

    pub(crate) const fn default_client_count_max() -> usize {
        16
    }

    pub(crate) const fn default_message_size_limit() -> usize {
        10_000_000
    }
}

impl Default for FieldServerInterfaces {
    fn default() -> Self {
        Self {
            addr: Self::default_addr(),
        }
    }
}

impl FieldServerInterfaces {
    pub(crate) fn default_addr() -> Vec<std::net::SocketAddr> {
        vec![std::net::SocketAddr::new(
            std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            vcapture_common::CAPTURE_PORT,
        )]
    }
}

impl Default for FieldServerShutdown {
    fn default() -> Self {
        Self {
            grace_period: Self::default_grace_period(),
        }
    }
}

impl FieldServerShutdown {
    pub(crate) const fn default_grace_period() -> std::time::Duration {
        std::time::Duration::from_secs(10)
    }
}

impl Default for FieldQueueDelivery {
    fn default() -> Self {
        Self {
            channel_size: Self::default_channel_size(),
        }
    }
}

impl FieldQueueDelivery {
    pub(crate) const fn default_channel_size() -> usize {
        1000
    }
}

impl Default for FieldServerLogs {
    fn default() -> Self {
        Self {
            filepath: Self::default_filepath(),
            format: LogFormat::default(),
            level: Self::default_level(),
        }
    }
}

impl FieldServerLogs {
    pub(crate) fn default_filepath() -> std::path::PathBuf {
        "/var/log/vcapture".into()
    }

    pub(crate) fn default_level() -> Vec<tracing_subscriber::filter::Directive> {
        vec![tracing_subscriber::filter::LevelFilter::INFO.into()]
    }
}

impl Default for FieldServerSMTPError {
    fn default() -> Self {
        Self {
            soft_count: 10,
            hard_count: 20,
            delay: std::time::Duration::from_millis(1000),
        }
    }
}

impl Default for FieldServerSMTPTimeoutClient {
    fn default() -> Self {
        Self {
            connect: std::time::Duration::from_secs(5 * 60),
            helo: std::time::Duration::from_secs(5 * 60),
            mail_from: std::time::Duration::from_secs(5 * 60),
            rcpt_to: std::time::Duration::from_secs(5 * 60),
            data: std::time::Duration::from_secs(5 * 60),
        }
    }
}

impl Default for FieldServerSMTP {
    fn default() -> Self {
        Self {
            rcpt_count_max: Self::default_rcpt_count_max(),
            error: FieldServerSMTPError::default(),
            timeout_client: FieldServerSMTPTimeoutClient::default(),
            codes: Self::default_smtp_codes(),
        }
    }
}

impl FieldServerSMTP {
    pub(crate) const fn default_rcpt_count_max() -> usize {
        1000
    }

    /// Every reply except [`CodeID::Ehlo`], generated from the server's settings.
    pub(crate) fn default_smtp_codes() -> std::collections::BTreeMap<CodeID, Reply> {
        let code = |code| ReplyCode::Code { code };
        let enhanced = |code, enhanced: &str| ReplyCode::Enhanced {
            code,
            enhanced: enhanced.to_string(),
        };

        collection! {
            CodeID::Greetings => Reply::new(code(220), "{name} Service ready"),
            CodeID::Help => Reply::new(
                code(214), "Commands supported: HELO EHLO MAIL RCPT DATA RSET NOOP QUIT HELP"
            ),
            CodeID::Closing => Reply::new(code(221), "Service closing transmission channel"),
            CodeID::Helo => Reply::new(code(250), "{name}"),
            CodeID::DataStart => Reply::new(code(354), "Start mail input; end with <CRLF>.<CRLF>"),
            CodeID::Ok => Reply::new(code(250), "Ok"),
            CodeID::Failure => Reply::new(
                code(451), "Requested action aborted: local error in processing"
            ),
            CodeID::UnrecognizedCommand => Reply::new(code(500), "Syntax error command unrecognized"),
            CodeID::SyntaxErrorParams => Reply::new(code(501), "Syntax error in parameters or arguments"),
            CodeID::Unimplemented => Reply::new(code(502), "Command not implemented"),
            CodeID::BadSequence => Reply::new(code(503), "Bad sequence of commands"),
            CodeID::LineTooLong => Reply::new(code(500), "Line too long"),
            CodeID::MessageSizeExceeded => Reply::new(
                enhanced(552, "4.3.1"), "Message size exceeds fixed maximum message size"
            ),
            CodeID::MalformedMessage => Reply::new(enhanced(554, "5.6.0"), "Malformed message"),
            CodeID::ConnectionMaxReached => Reply::new(code(554), "Cannot process connection, closing"),
            CodeID::TooManyError => Reply::new(code(451), "Too many errors from the client"),
            CodeID::Timeout => Reply::new(code(451), "Timeout - closing connection"),
            CodeID::TooManyRecipients => Reply::new(
                code(452), "Requested action not taken: too many recipients"
            ),
            CodeID::ShuttingDown => Reply::new(
                code(421), "Service not available, closing transmission channel"
            ),
        }
    }
}

impl Default for FieldAppStorage {
    fn default() -> Self {
        Self::Memory
    }
}
