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
use crate::Args;
use vcapture_config::{field::LogFormat, Config};

/// Name of the log files, rotated every day.
pub const LOG_FILE_PREFIX: &str = "vcapture.log";

fn fmt_layer<S, W>(
    format: LogFormat,
    writer: W,
) -> Box<dyn tracing_subscriber::Layer<S> + Send + Sync + 'static>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    use tracing_subscriber::Layer;

    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false);

    match format {
        LogFormat::Full => layer
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => layer
            .compact()
            .with_thread_ids(false)
            .with_target(false)
            .boxed(),
        LogFormat::Json => layer.json().with_current_span(true).boxed(),
    }
}

/// Build the filter of the configuration, `RUST_LOG` is not read.
#[must_use]
pub fn env_filter(config: &Config) -> tracing_subscriber::EnvFilter {
    config
        .server
        .logs
        .level
        .iter()
        .cloned()
        .fold(tracing_subscriber::EnvFilter::default(), |filter, directive| {
            filter.add_directive(directive)
        })
}

/// Initialize the tracing subsystem.
///
/// # Errors
///
/// * The logs directory in the configuration file cannot be created.
/// * Failed to initialize the tracing subsystem.
pub fn initialize(args: &Args, config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let logs = &config.server.logs;
    std::fs::DirBuilder::new()
        .recursive(true)
        .create(&logs.filepath)
        .map_err(|error| {
            anyhow::anyhow!(
                "cannot create the logs directory {:?}: {error}",
                logs.filepath
            )
        })?;

    let writer_backend = tracing_appender::rolling::daily(&logs.filepath, LOG_FILE_PREFIX);

    let subscriber = tracing_subscriber::registry()
        .with(env_filter(config))
        .with(fmt_layer(logs.format, writer_backend));

    if args.stdout {
        subscriber
            .with(fmt_layer(logs.format, std::io::stdout))
            .try_init()
    } else {
        subscriber.try_init()
    }
    .map_err(|e| anyhow::anyhow!("{e}"))
}
