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

/// Identity of the client, as announced by `HELO` / `EHLO`.
#[derive(
    Debug,
    Clone,
    PartialOrd,
    Ord,
    PartialEq,
    Eq,
    Hash,
    serde_with::SerializeDisplay,
    serde_with::DeserializeFromStr,
)]
pub enum ClientName {
    /// Name of the client, not required to be a fqdn.
    Domain(String),
    /// IP address literal of the client.
    Ip4(std::net::Ipv4Addr),
    /// IP address literal of the client.
    Ip6(std::net::Ipv6Addr),
}

impl std::str::FromStr for ClientName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(literal) = s.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            return match literal.strip_prefix("IPv6:") {
                Some(ip6) => Ok(Self::Ip6(ip6.parse()?)),
                None => Ok(Self::Ip4(literal.parse()?)),
            };
        }

        if s.is_empty() || !s.bytes().all(|c| c.is_ascii_graphic()) {
            anyhow::bail!("'{s}' is not a valid client name")
        }
        Ok(Self::Domain(s.to_string()))
    }
}

impl std::fmt::Display for ClientName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Domain(domain) => write!(f, "{domain}"),
            Self::Ip4(ip) => write!(f, "[{ip}]"),
            Self::Ip6(ip) => write!(f, "[IPv6:{ip}]"),
        }
    }
}
