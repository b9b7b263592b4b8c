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
use vcapture_common::{CodeID, Reply};

/// This structure contains all the field to configure the server at the startup.
///
/// This structure will be loaded from a configuration file `-c, --config`
/// argument of the program. See [`crate::Config::from_toml`].
///
/// All field are optional and defaulted if missing.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// vCapture's version requirement to parse this configuration file.
    pub version_requirement: semver::VersionReq,
    /// see [`field::FieldServer`]
    #[serde(default)]
    pub server: field::FieldServer,
    /// see [`field::FieldApp`]
    #[serde(default)]
    pub app: field::FieldApp,
}

/// The inner field of the `vCapture`'s configuration.
#[allow(clippy::module_name_repetitions)]
pub mod field {
    use super::{CodeID, Reply};

    /// This structure contains all the field to configure the server at the startup.
    #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldServer {
        /// Name of the server.
        ///
        /// Used with the response [`CodeID::Greetings`], and [`CodeID::Helo`],
        /// and [`CodeID::Ehlo`].
        #[serde(default = "FieldServer::hostname")]
        pub name: String,
        /// Maximum number of client served at the same time.
        ///
        /// The next clients wait in the listen backlog until a session ends.
        #[serde(default = "FieldServer::default_client_count_max")]
        pub client_count_max: usize,
        /// Maximum size in bytes of the message.
        #[serde(default = "FieldServer::default_message_size_limit")]
        pub message_size_limit: usize,
        /// see [`FieldServerInterfaces`]
        #[serde(default)]
        pub interfaces: FieldServerInterfaces,
        /// see [`FieldServerPool`]
        #[serde(default)]
        pub pool: FieldServerPool,
        /// see [`FieldServerShutdown`]
        #[serde(default)]
        pub shutdown: FieldServerShutdown,
        /// see [`FieldServerQueues`]
        #[serde(default)]
        pub queues: FieldServerQueues,
        /// see [`FieldServerLogs`]
        #[serde(default)]
        pub logs: FieldServerLogs,
        /// see [`FieldServerSMTP`]
        #[serde(default)]
        pub smtp: FieldServerSMTP,
    }

    /// Address served by `vCapture`. Either ipv4 or ipv6.
    #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldServerInterfaces {
        /// List of address for the protocol SMTP.
        ///
        /// An address without port listens on [`vcapture_common::CAPTURE_PORT`].
        #[serde(default = "FieldServerInterfaces::default_addr")]
        #[serde(deserialize_with = "crate::parser::socket_addr::deserialize")]
        pub addr: Vec<std::net::SocketAddr>,
    }

    /// The policy of the worker pool.
    #[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldServerPool {
        /// How long a client waits for a free slot before being replied
        /// [`CodeID::ConnectionMaxReached`].
        ///
        /// Wait forever if missing.
        #[serde(default, with = "humantime_serde")]
        pub acquire_timeout: Option<std::time::Duration>,
    }

    /// The stop sequence of the server.
    #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldServerShutdown {
        /// Delay given to the running sessions to end after the listener stopped,
        /// the remaining sessions are then dropped.
        #[serde(with = "humantime_serde")]
        #[serde(default = "FieldServerShutdown::default_grace_period")]
        pub grace_period: std::time::Duration,
    }

    /// The configuration of the `delivery queue`.
    #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldQueueDelivery {
        /// Size of the channel queue communicating the mails from the sessions to the receivers.
        ///
        /// A session waits for a free place before replying to the end of `DATA`.
        #[serde(default = "FieldQueueDelivery::default_channel_size")]
        pub channel_size: usize,
    }

    /// The configuration of the queues.
    #[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldServerQueues {
        /// see [`FieldQueueDelivery`]
        #[serde(default)]
        pub delivery: FieldQueueDelivery,
    }

    /// Output format of the logs.
    #[derive(
        Debug,
        Copy,
        Clone,
        Default,
        PartialEq,
        Eq,
        strum::Display,
        strum::EnumString,
        serde_with::DeserializeFromStr,
        serde_with::SerializeDisplay,
    )]
    #[strum(serialize_all = "lowercase")]
    pub enum LogFormat {
        /// Human readable, with the spans and their fields.
        #[default]
        Full,
        /// Shorter lines.
        Compact,
        /// One JSON object per line.
        Json,
    }

    /// The field related to the logs.
    #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldServerLogs {
        /// Directory of the server's log.
        ///
        /// A daily rolling file will be created at `{filepath}/vcapture.{YYYY-MM-DD}`.
        #[serde(default = "FieldServerLogs::default_filepath")]
        pub filepath: std::path::PathBuf,
        /// see [`LogFormat`]
        #[serde(default)]
        pub format: LogFormat,
        /// Customize the log level of the different part of the program.
        ///
        /// See <https://docs.rs/tracing-subscriber/0.3.16/tracing_subscriber/filter/struct.EnvFilter.html>
        #[serde(
            default = "FieldServerLogs::default_level",
            serialize_with = "crate::parser::tracing_directive::serialize",
            deserialize_with = "crate::parser::tracing_directive::deserialize"
        )]
        pub level: Vec<tracing_subscriber::filter::Directive>,
    }

    /// The error policy of the SMTP sessions.
    #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldServerSMTPError {
        /// The maximum number of errors before the client is delay between each response.
        ///
        /// `-1` to disable
        pub soft_count: i64,
        /// The maximum number of errors before the client is disconnected.
        ///
        /// `-1` to disable
        pub hard_count: i64,
        /// The delay used between each response, after `soft_count` errors.
        /// Unused if `soft_count` is `-1`.
        #[serde(with = "humantime_serde")]
        pub delay: std::time::Duration,
    }

    /// Maximum idle time of a client, per stage of the transaction.
    #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldServerSMTPTimeoutClient {
        /// Delay between the connection and the first `HELO/EHLO`
        #[serde(with = "humantime_serde")]
        pub connect: std::time::Duration,
        /// Delay between the last `HELO/EHLO` and the next `MAIL FROM`
        #[serde(with = "humantime_serde")]
        pub helo: std::time::Duration,
        /// Delay between the last `MAIL FROM` and the next `RCPT TO`
        #[serde(with = "humantime_serde")]
        pub mail_from: std::time::Duration,
        /// Delay between the last `RCPT TO` and the next `DATA`
        #[serde(with = "humantime_serde")]
        pub rcpt_to: std::time::Duration,
        /// Delay between each line of the message after the `DATA` command.
        #[serde(with = "humantime_serde")]
        pub data: std::time::Duration,
    }

    /// The SMTP dialog.
    #[serde_with::serde_as]
    #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldServerSMTP {
        /// Maximum number of recipients received in the envelop, extra recipient will produce an [`CodeID::TooManyRecipients`].
        #[serde(default = "FieldServerSMTP::default_rcpt_count_max")]
        pub rcpt_count_max: usize,
        /// SMTP's error policy.
        #[serde(default)]
        pub error: FieldServerSMTPError,
        /// SMTP's timeout policy.
        #[serde(default)]
        pub timeout_client: FieldServerSMTPTimeoutClient,
        /// Dictionary of the reply sent by the server during the SMTP transaction.
        ///
        /// `{name}` is replaced by [`FieldServer::name`]. Missing entries are defaulted.
        #[serde(default)]
        #[serde_as(as = "std::collections::BTreeMap<serde_with::DisplayFromStr, _>")]
        pub codes: std::collections::BTreeMap<CodeID, Reply>,
    }

    /// Where the captured mails are kept.
    #[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields, tag = "type", rename_all = "lowercase")]
    pub enum FieldAppStorage {
        /// In the memory of the process, lost at the stop.
        Memory,
        /// Two files per mail in a directory, `{uuid}.eml` and `{uuid}.json`.
        Fs {
            /// Directory of the mails, created if missing.
            dirpath: std::path::PathBuf,
        },
    }

    /// The configuration of the captured mails.
    #[derive(Debug, Default, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
    #[serde(deny_unknown_fields)]
    pub struct FieldApp {
        /// see [`FieldAppStorage`]
        #[serde(default)]
        pub storage: FieldAppStorage,
    }
}
