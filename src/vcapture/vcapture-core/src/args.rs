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

///
#[derive(clap::Parser)]
#[cfg_attr(test, derive(Debug, PartialEq, Eq))]
#[clap(about, author, version)]
pub struct Args {
    /// Path of the vCapture configuration file (toml format)
    #[clap(short, long, action)]
    pub config: Option<String>,

    ///
    #[clap(subcommand)]
    pub command: Option<Commands>,

    /// Also write the logs on the standard output
    #[clap(long, action)]
    pub stdout: bool,

    /// Stop the server after a duration (ex: "30s", "5min")
    #[clap(short, long, value_parser = humantime::parse_duration)]
    pub timeout: Option<std::time::Duration>,
}

///
#[derive(clap::Subcommand)]
#[cfg_attr(test, derive(Debug, PartialEq, Eq))]
pub enum Commands {
    /// Show the loaded config (as serialized json format)
    ConfigShow,
    /// Show the difference between the loaded config and the default one
    ConfigDiff,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case(&[""], None, None, false, None)]
    #[case(&["", "-c", "./config.toml"], Some("./config.toml"), None, false, None)]
    #[case(&["", "--config", "a.toml", "config-show"], Some("a.toml"), Some(Commands::ConfigShow), false, None)]
    #[case(&["", "config-diff"], None, Some(Commands::ConfigDiff), false, None)]
    #[case(&["", "--stdout", "-t", "1s"], None, None, true, Some(std::time::Duration::from_secs(1)))]
    #[case(&["", "--timeout", "2min 30s"], None, None, false, Some(std::time::Duration::from_secs(150)))]
    fn parse(
        #[case] input: &[&str],
        #[case] config: Option<&str>,
        #[case] command: Option<Commands>,
        #[case] stdout: bool,
        #[case] timeout: Option<std::time::Duration>,
    ) {
        pretty_assertions::assert_eq!(
            <Args as clap::Parser>::try_parse_from(input).unwrap(),
            Args {
                config: config.map(str::to_string),
                command,
                stdout,
                timeout,
            }
        );
    }

    #[rstest::rstest]
    #[case(&["", "--help"], clap::error::ErrorKind::DisplayHelp)]
    #[case(&["", "--version"], clap::error::ErrorKind::DisplayVersion)]
    #[case(&["", "--timeout", "soon"], clap::error::ErrorKind::ValueValidation)]
    #[case(&["", "--unknown"], clap::error::ErrorKind::UnknownArgument)]
    fn error(#[case] input: &[&str], #[case] kind: clap::error::ErrorKind) {
        assert_eq!(
            <Args as clap::Parser>::try_parse_from(input)
                .unwrap_err()
                .kind(),
            kind
        );
    }
}
