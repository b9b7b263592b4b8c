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
use vcapture_common::{Address, ClientName};

/// Buffer received from the client, line terminator removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnparsedArgs(pub Vec<u8>);

/// A verb and its arguments.
pub type Command<Verb, Args> = (Verb, Args);

/// Information received from the client at the connection TCP/IP.
#[derive(Debug, Clone, Copy)]
pub struct AcceptArgs {
    /// Peer address of the connection.
    pub client_addr: std::net::SocketAddr,
    /// Address of the server which accepted the connection.
    pub server_addr: std::net::SocketAddr,
}

/// Information received from the client at the HELO command.
#[derive(Debug)]
pub struct HeloArgs {
    /// Name of the client.
    pub client_name: ClientName,
}

/// Information received from the client at the EHLO command.
#[derive(Debug)]
pub struct EhloArgs {
    /// Name of the client.
    pub client_name: ClientName,
}

/// Information received from the client at the MAIL FROM command.
#[derive(Debug)]
pub struct MailFromArgs {
    /// Sender address, `None` for the null reverse path `<>`.
    pub reverse_path: Option<Address>,
}

/// Information received from the client at the RCPT TO command.
#[derive(Debug)]
pub struct RcptToArgs {
    /// Recipient address.
    pub forward_path: Address,
}

/// Error while parsing the arguments of a command.
#[derive(Debug, thiserror::Error)]
pub enum ParseArgsError {
    /// Non-UTF8 buffer.
    #[error("{0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
    /// Invalid IP address.
    #[error("{0}")]
    BadTypeAddr(#[from] std::net::AddrParseError),
    /// The mailbox is not a valid address.
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    /// Missing or ill-formed argument.
    #[error("invalid arguments")]
    InvalidArgs,
    /// The command line is too long.
    #[error("line is not supposed to be longer than {expected} bytes but got {got}")]
    BufferTooLong {
        /// Maximum size expected.
        expected: usize,
        /// Actual size.
        got: usize,
    },
}

// NOTE: from [`[u8]::trim_ascii`]
const fn trim_ascii(slice: &[u8]) -> &[u8] {
    let mut bytes = slice;
    while let [first, rest @ ..] = bytes {
        if first.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    while let [rest @ .., last] = bytes {
        if last.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    bytes
}

fn parse_client_name(value: UnparsedArgs) -> Result<ClientName, ParseArgsError> {
    let value = String::from_utf8(trim_ascii(&value.0).to_vec())?;

    if let Some(ipv6) = value
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .filter(|s| s.get(..5).map_or(false, |tag| tag.eq_ignore_ascii_case("IPv6:")))
        .and_then(|s| s.get(5..))
    {
        return Ok(ClientName::Ip6(ipv6.parse()?));
    }
    if let Some(ipv4) = value.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return Ok(ClientName::Ip4(ipv4.parse()?));
    }

    value
        .parse::<ClientName>()
        .map_err(|_| ParseArgsError::InvalidArgs)
}

/// Extract the mailbox of a path, `<mailbox> [parameters]` or `mailbox [parameters]`.
///
/// ESMTP parameters are ignored.
fn parse_path(value: &UnparsedArgs) -> Result<String, ParseArgsError> {
    let value = trim_ascii(&value.0);

    let mailbox = match value.strip_prefix(b"<") {
        Some(rest) => {
            let end = rest
                .iter()
                .position(|c| *c == b'>')
                .ok_or(ParseArgsError::InvalidArgs)?;
            &rest[..end]
        }
        None => value
            .split(u8::is_ascii_whitespace)
            .next()
            .filter(|mailbox| !mailbox.is_empty())
            .ok_or(ParseArgsError::InvalidArgs)?,
    };

    Ok(String::from_utf8(mailbox.to_vec())?)
}

impl TryFrom<UnparsedArgs> for HeloArgs {
    type Error = ParseArgsError;

    fn try_from(value: UnparsedArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            client_name: parse_client_name(value)?,
        })
    }
}

impl TryFrom<UnparsedArgs> for EhloArgs {
    type Error = ParseArgsError;

    fn try_from(value: UnparsedArgs) -> Result<Self, Self::Error> {
        Ok(Self {
            client_name: parse_client_name(value)?,
        })
    }
}

impl TryFrom<UnparsedArgs> for MailFromArgs {
    type Error = ParseArgsError;

    fn try_from(value: UnparsedArgs) -> Result<Self, Self::Error> {
        let mailbox = parse_path(&value)?;
        if mailbox.is_empty() {
            return Ok(Self { reverse_path: None });
        }

        Ok(Self {
            reverse_path: Some(
                mailbox
                    .parse()
                    .map_err(|_| ParseArgsError::InvalidAddress(mailbox))?,
            ),
        })
    }
}

impl TryFrom<UnparsedArgs> for RcptToArgs {
    type Error = ParseArgsError;

    fn try_from(value: UnparsedArgs) -> Result<Self, Self::Error> {
        let mailbox = parse_path(&value)?;
        if mailbox.is_empty() {
            return Err(ParseArgsError::InvalidArgs);
        }

        Ok(Self {
            forward_path: mailbox
                .parse()
                .map_err(|_| ParseArgsError::InvalidAddress(mailbox))?,
        })
    }
}

/// SMTP Command.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, strum::AsRefStr, strum::EnumString, strum::EnumVariantNames,
)]
pub enum Verb {
    /// Used to identify the SMTP client to the SMTP server. (historical)
    #[strum(serialize = "HELO")]
    Helo,
    /// Used to identify the SMTP client to the SMTP server and request smtp extensions.
    #[strum(serialize = "EHLO")]
    Ehlo,
    /// This command is used to initiate a mail transaction in which the mail
    /// data is delivered to an SMTP server.
    #[strum(serialize = "MAIL FROM:")]
    MailFrom,
    /// This command is used to identify an individual recipient of the mail
    /// data; multiple recipients are specified by multiple uses of this
    /// command.
    #[strum(serialize = "RCPT TO:")]
    RcptTo,
    /// This command causes the mail data to be appended to the mail data
    /// buffer.
    #[strum(serialize = "DATA")]
    Data,
    /// This command specifies that the receiver MUST send a "221 OK" reply,
    /// and then close the transmission channel.
    #[strum(serialize = "QUIT")]
    Quit,
    /// This command specifies that the current mail transaction will be
    /// aborted. Any stored sender, recipients, and mail data MUST be
    /// discarded, and all buffers and state tables cleared.
    #[strum(serialize = "RSET")]
    Rset,
    /// This command causes the server to send helpful information to the
    /// client.
    #[strum(serialize = "HELP")]
    Help,
    /// This command does not affect any parameters or previously entered
    /// commands.
    #[strum(serialize = "NOOP")]
    Noop,
    /// Any other buffer received while expecting a command is considered an
    /// unknown.
    Unknown,
}

impl Verb {
    /// Split a command line (without its terminator) into a verb and its arguments.
    ///
    /// Verbs are case insensitive, and must be followed by a space or the end
    /// of the line, except the ones ending with `:`.
    #[must_use]
    pub fn parse_command(line: &[u8]) -> Command<Self, UnparsedArgs> {
        <Self as strum::VariantNames>::VARIANTS
            .iter()
            .filter(|verb| **verb != Self::Unknown.as_ref())
            .filter_map(|verb| {
                let rest = line
                    .get(..verb.len())
                    .filter(|head| head.eq_ignore_ascii_case(verb.as_bytes()))
                    .map(|_| &line[verb.len()..])?;
                let well_delimited =
                    verb.ends_with(':') || rest.is_empty() || rest.starts_with(b" ");
                well_delimited
                    .then(|| verb.parse::<Self>().ok())
                    .flatten()
                    .map(|parsed| (parsed, UnparsedArgs(trim_ascii(rest).to_vec())))
            })
            .next()
            .unwrap_or_else(|| (Self::Unknown, UnparsedArgs(line.to_vec())))
    }
}
