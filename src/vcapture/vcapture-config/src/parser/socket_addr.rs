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

/// Read `ip:port`, or a bare `ip` served on [`vcapture_common::CAPTURE_PORT`].
fn parse(s: &str) -> anyhow::Result<std::net::SocketAddr> {
    <std::net::SocketAddr as std::str::FromStr>::from_str(s)
        .or_else(|_| {
            let ip = s.trim_start_matches('[').trim_end_matches(']');
            <std::net::IpAddr as std::str::FromStr>::from_str(ip)
                .map(|ip| std::net::SocketAddr::new(ip, vcapture_common::CAPTURE_PORT))
        })
        .map_err(|_| anyhow::anyhow!("invalid socket address: '{s}'"))
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<std::net::SocketAddr>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    <Vec<String> as serde::Deserialize>::deserialize(deserializer)?
        .iter()
        .map(|s| parse(s))
        .collect::<anyhow::Result<Vec<std::net::SocketAddr>>>()
        .map_err(serde::de::Error::custom)
}
