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
    field::{FieldAppStorage, LogFormat},
    Config,
};
use vcapture_common::{CodeID, Reply, ReplyCode};

#[test]
fn minimal() {
    let config = Config::from_toml(include_str!("config/minimal.toml")).unwrap();
    let default = Config::default();

    assert_eq!(config.version_requirement.to_string(), ">=1.0.0");
    pretty_assertions::assert_eq!(config.server, default.server);
    pretty_assertions::assert_eq!(config.app, default.app);
}

#[test]
fn full() {
    let config = Config::from_toml(include_str!("config/full.toml")).unwrap();
    let server = &config.server;

    assert_eq!(server.name, "capture.local");
    assert_eq!(server.client_count_max, 8);
    assert_eq!(server.message_size_limit, 20_000_000);
    pretty_assertions::assert_eq!(
        server.interfaces.addr,
        vec![
            "127.0.0.1:2525".parse().unwrap(),
            "[::1]:2525".parse().unwrap(),
            "0.0.0.0:2500".parse().unwrap(),
        ]
    );
    assert_eq!(
        server.pool.acquire_timeout,
        Some(std::time::Duration::from_secs(30))
    );
    assert_eq!(
        server.shutdown.grace_period,
        std::time::Duration::from_secs(5)
    );
    assert_eq!(server.queues.delivery.channel_size, 64);
    assert_eq!(server.logs.format, LogFormat::Json);
    assert_eq!(
        server
            .logs
            .level
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        vec!["warn", "vcapture_server=debug"]
    );
    assert_eq!(server.smtp.rcpt_count_max, 25);
    assert_eq!(server.smtp.error.soft_count, 3);
    assert_eq!(server.smtp.error.hard_count, 6);
    assert_eq!(
        server.smtp.error.delay,
        std::time::Duration::from_millis(500)
    );
    assert_eq!(
        server.smtp.timeout_client.data,
        std::time::Duration::from_secs(30)
    );
    assert_eq!(
        server.smtp.codes[&CodeID::Greetings],
        Reply::new(
            ReplyCode::Code { code: 220 },
            "capture.local mail capture ready"
        )
    );
    assert_eq!(
        server.smtp.codes[&CodeID::Help].to_string(),
        "214 see the documentation\r\n"
    );
    assert_eq!(
        server.smtp.codes[&CodeID::Ok].to_string(),
        "250 Ok\r\n"
    );
    assert_eq!(
        config.app.storage,
        FieldAppStorage::Fs {
            dirpath: "./tmp/mails".into()
        }
    );
}

#[rstest::rstest]
#[case::version_not_matched(r#"version_requirement = ">=2.0.0""#, "Version requirement not fulfilled")]
#[case::version_missing("[server]\nname = \"foo\"", "missing field `version_requirement`")]
#[case::unknown_field(
    "version_requirement = \">=1.0.0\"\n[server.smtp]\nfoo = 1",
    "server.smtp"
)]
#[case::unknown_storage(
    "version_requirement = \">=1.0.0\"\n[app.storage]\ntype = \"sql\"",
    "app.storage"
)]
#[case::ensure(
    "version_requirement = \">=1.0.0\"\n[server]\nclient_count_max = 0",
    "Maximum client count cannot be set to 0"
)]
fn invalid(#[case] input: &str, #[case] message: &str) {
    let error = Config::from_toml(input).unwrap_err().to_string();
    assert!(error.contains(message), "'{error}' should contain '{message}'");
}

#[test]
fn serialize_round_trip() {
    let config = Config::from_toml(include_str!("config/full.toml")).unwrap();
    let json = serde_json::to_string(&config).unwrap();
    pretty_assertions::assert_eq!(serde_json::from_str::<Config>(&json).unwrap(), config);
}
