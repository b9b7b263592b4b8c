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
use crate::ReplyCode;

/// SMTP message send by the server to the client as defined in RFC5321#4.2
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    code: ReplyCode,
    text: Vec<String>,
    folded: String,
}

impl serde::Serialize for Reply {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.fold())
    }
}

impl<'de> serde::Deserialize<'de> for Reply {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct ReplyVisitor;

        impl<'de> serde::de::Visitor<'de> for ReplyVisitor {
            type Value = Reply;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("a reply string or a { code, enhanced, text } map")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                <Reply as std::str::FromStr>::from_str(v).map_err(serde::de::Error::custom)
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                #[derive(serde::Deserialize)]
                #[serde(field_identifier, rename_all = "lowercase")]
                enum Field {
                    Code,
                    Enhanced,
                    Text,
                }

                let mut text: Option<String> = None;
                let mut code = None;
                let mut enhanced = None;

                while let Some(key) = map.next_key()? {
                    match key {
                        Field::Code => {
                            if code.is_some() {
                                return Err(serde::de::Error::duplicate_field("code"));
                            }
                            code = Some(map.next_value()?);
                        }
                        Field::Text => {
                            if text.is_some() {
                                return Err(serde::de::Error::duplicate_field("text"));
                            }
                            text = Some(map.next_value()?);
                        }
                        Field::Enhanced => {
                            if enhanced.is_some() {
                                return Err(serde::de::Error::duplicate_field("enhanced"));
                            }
                            enhanced = Some(map.next_value()?);
                        }
                    }
                }
                let code = code.ok_or_else(|| serde::de::Error::missing_field("code"))?;
                let text = text.ok_or_else(|| serde::de::Error::missing_field("text"))?;

                Ok(Reply::new(
                    enhanced.map_or(ReplyCode::Code { code }, |enhanced| {
                        ReplyCode::Enhanced { code, enhanced }
                    }),
                    text,
                ))
            }
        }

        deserializer.deserialize_any(ReplyVisitor)
    }
}

impl Reply {
    /// Create a reply, each line of `text` is prefixed by the code.
    ///
    /// ```
    /// # use vcapture_common::{Reply, ReplyCode};
    /// let reply = Reply::new(ReplyCode::Code { code: 250 }, "capture.local\nPIPELINING");
    /// assert_eq!(reply.to_string(), "250-capture.local\r\n250 PIPELINING\r\n");
    /// ```
    pub fn new(code: ReplyCode, text: impl AsRef<str>) -> Self {
        let reply = Self {
            code,
            text: text
                .as_ref()
                .split('\n')
                .map(|line| line.trim_end_matches('\r').to_string())
                .collect(),
            folded: String::new(),
        };
        Self {
            folded: reply.fold(),
            ..reply
        }
    }

    ///
    #[must_use]
    pub const fn code(&self) -> &ReplyCode {
        &self.code
    }

    /// Lines of text, without the codes.
    #[must_use]
    pub fn text(&self) -> &[String] {
        &self.text
    }

    fn fold(&self) -> String {
        let last = self.text.len().saturating_sub(1);

        self.text
            .iter()
            .enumerate()
            .map(|(idx, line)| {
                let separator = if idx == last { ' ' } else { '-' };
                match &self.code {
                    ReplyCode::Code { code } => format!("{code}{separator}{line}\r\n"),
                    ReplyCode::Enhanced { code, enhanced } => {
                        format!("{code}{separator}{enhanced} {line}\r\n")
                    }
                }
            })
            .collect()
    }

    /// Create a new reply with:
    /// * `text` = `self.text` + `other.text`
    /// * `code` = `other.code`
    /// ```
    /// # use vcapture_common::Reply;
    /// let first = "554 5.6.0 Malformed message: invalid header line".parse::<Reply>().unwrap();
    /// let second = "451 Too many errors from the client".parse::<Reply>().unwrap();
    ///
    /// assert_eq!(
    ///   first.extended(&second).to_string(),
    ///   [
    ///     "451-Malformed message: invalid header line\r\n",
    ///     "451 Too many errors from the client\r\n"
    ///   ].concat()
    /// );
    /// ```
    pub fn extended(mut self, other: &Self) -> Self {
        self.text.extend(other.text.iter().cloned());
        let reply = Self {
            code: other.code.clone(),
            text: self.text,
            folded: String::new(),
        };
        Self {
            folded: reply.fold(),
            ..reply
        }
    }
}

impl std::str::FromStr for Reply {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines = s
            .split("\r\n")
            .filter(|s| !s.is_empty())
            .map(ReplyCode::parse_line);

        let mut first_code = None;
        let mut text = vec![];

        for line in lines {
            let (new_code, mut line) = line?;

            match (&first_code, new_code) {
                (Some(first), new) if *first == new => {}
                (Some(_), _) => anyhow::bail!("Reply codes are not consistent"),
                (None, anything) => first_code = Some(anything),
            }

            if !line.is_empty() {
                let c = line.remove(0);
                if !" -".contains(c) {
                    anyhow::bail!("invalid separator {c:?} in reply {s:?}");
                }
            }
            text.push(line);
        }

        let reply = Self {
            code: first_code.ok_or_else(|| anyhow::anyhow!("empty reply"))?,
            text,
            folded: String::new(),
        };
        Ok(Self {
            folded: reply.fold(),
            ..reply
        })
    }
}

impl std::fmt::Display for Reply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.folded)
    }
}

impl AsRef<str> for Reply {
    fn as_ref(&self) -> &str {
        &self.folded
    }
}
