//! vCapture executable

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

#![doc(html_no_source)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]
//
#![warn(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
//

mod args;
pub use args::{Args, Commands};

///
pub mod tracing_subscriber;

use vcapture_config::Config;

/// Line by line difference between the default configuration and `config`,
/// both serialized in JSON. Lines are prefixed by `-` (default only),
/// `+` (`config` only) or a space.
///
/// # Errors
///
/// * the configuration cannot be serialized
pub fn config_diff(config: &Config) -> anyhow::Result<String> {
    let loaded = serde_json::to_string_pretty(config)?;
    let default = serde_json::to_string_pretty(&Config::default())?;

    Ok(diff::lines(&default, &loaded)
        .into_iter()
        .map(|line| match line {
            diff::Result::Left(left) => format!("-{left}\n"),
            diff::Result::Both(both, _) => format!(" {both}\n"),
            diff::Result::Right(right) => format!("+{right}\n"),
        })
        .collect())
}
