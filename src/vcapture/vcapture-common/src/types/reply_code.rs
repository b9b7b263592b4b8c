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

/// Codes as the start of each lines of a reply
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(untagged)]
pub enum ReplyCode {
    /// simple Reply Code as defined in RFC5321
    Code {
        // https://datatracker.ietf.org/doc/html/rfc5321#section-4.2
        /// code base
        code: u16,
    },
    /// enhanced codes
    Enhanced {
        // https://datatracker.ietf.org/doc/html/rfc3463
        /// code base
        code: u16,
        /// `class.subject.detail`
        enhanced: String,
    },
}

impl ReplyCode {
    /// The code is a transient (4yz) or permanent (5yz) failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.value() / 100 >= 4
    }

    /// Return the underlying value of the reply code
    #[must_use]
    pub fn value(&self) -> u16 {
        match self {
            Self::Code { code, .. } | Self::Enhanced { code, .. } => *code,
        }
    }

    /// Return the enhanced value of the reply code
    #[must_use]
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::Enhanced { enhanced, .. } => Some(enhanced),
            Self::Code { .. } => None,
        }
    }

    fn parse_code(word: &str) -> Option<u16> {
        (word.len() == 3)
            .then(|| word.parse::<u16>().ok())
            .flatten()
            .filter(|code| (200..600).contains(code))
    }

    fn parse_enhanced(word: &str) -> Option<String> {
        let mut enhanced = word.splitn(3, '.').map(str::parse::<u16>);
        let (a, b, c) = (
            enhanced.next()?.ok()?,
            enhanced.next()?.ok()?,
            enhanced.next()?.ok()?,
        );
        Some(format!("{a}.{b}.{c}"))
    }

    /// Parse one line of a reply, return the code and the remaining text.
    ///
    /// The separator following the code (or the enhanced code) is kept at the start of the text.
    pub(super) fn parse_line(s: &str) -> anyhow::Result<(Self, String)> {
        let code = s
            .get(..3)
            .and_then(Self::parse_code)
            .ok_or_else(|| anyhow::anyhow!("cannot parse {s:?}"))?;
        let rest = &s[3..];

        let enhanced = rest
            .get(1..)
            .and_then(|rest| rest.split(' ').next())
            .and_then(|word| Self::parse_enhanced(word).map(|enhanced| (enhanced, word.len())));

        Ok(match enhanced {
            Some((enhanced, len)) => {
                let text = rest[1 + len..].to_string();
                (Self::Enhanced { code, enhanced }, text)
            }
            None => (Self::Code { code }, rest.to_string()),
        })
    }
}

impl std::fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code { code } => f.write_fmt(format_args!("{code}")),
            Self::Enhanced { code, enhanced } => f.write_fmt(format_args!("{code} {enhanced}")),
        }
    }
}
