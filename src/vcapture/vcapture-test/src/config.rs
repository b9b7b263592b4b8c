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
use vcapture_config::{field::FieldAppStorage, Config};

/// Get a config for local test
///
/// # Panics
///
/// * config cannot be built
#[must_use]
pub fn local_test() -> Config {
    Config::from_toml(
        r#"
version_requirement = ">=1.0.0"

[server]
name = "testserver.com"
client_count_max = 8

[server.interfaces]
addr = ["127.0.0.1:0"]

[server.shutdown]
grace_period = "1s"

[server.logs]
filepath = "./tmp/logs"
"#,
    )
    .unwrap()
}

/// [`local_test`] writing the mails in `dirpath`.
#[must_use]
pub fn with_fs_storage(dirpath: impl Into<std::path::PathBuf>) -> Config {
    let mut config = local_test();
    config.app.storage = FieldAppStorage::Fs {
        dirpath: dirpath.into(),
    };
    config
}

/// A simple message, as sent by most clients.
#[must_use]
pub fn local_msg() -> String {
    [
        "From: NoBody <nobody@domain.tld>\r\n",
        "Reply-To: Yuin <yuin@domain.tld>\r\n",
        "To: Hei <hei@domain.tld>\r\n",
        "Subject: Happy new year\r\n",
        "\r\n",
        "Be happy!\r\n",
    ]
    .concat()
}
