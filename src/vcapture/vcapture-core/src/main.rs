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
use anyhow::Context;
use vcapture::{Args, Commands};
use vcapture_config::Config;
use vcapture_server::{socket_bind_anyhow, start_runtime};

fn load_config(path: Option<&str>) -> anyhow::Result<Config> {
    path.map_or_else(
        || Ok(Config::default()),
        |path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read file '{path}'"))
                .and_then(|input| Config::from_toml(&input))
                .context("Cannot parse the configuration")
        },
    )
}

fn try_main() -> anyhow::Result<()> {
    let args = <Args as clap::Parser>::parse();

    let config = load_config(args.config.as_deref())?;

    if let Some(command) = &args.command {
        match command {
            Commands::ConfigShow => {
                let stringified = serde_json::to_string_pretty(&config)?;
                println!("Loaded configuration: {stringified}");
            }
            Commands::ConfigDiff => {
                print!("{}", vcapture::config_diff(&config)?);
            }
        }
        return Ok(());
    }

    vcapture::tracing_subscriber::initialize(&args, &config)?;

    let sockets = config
        .server
        .interfaces
        .addr
        .iter()
        .copied()
        .map(socket_bind_anyhow)
        .collect::<anyhow::Result<Vec<_>>>()?;

    tracing::info!(
        name = %config.server.name,
        version = env!("CARGO_PKG_VERSION"),
        "Starting vCapture server."
    );
    start_runtime(config, sockets, args.timeout)
}

fn main() {
    if let Err(error) = try_main() {
        eprintln!("ERROR: {error}");
        for cause in error.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
        std::process::exit(1);
    }
}
