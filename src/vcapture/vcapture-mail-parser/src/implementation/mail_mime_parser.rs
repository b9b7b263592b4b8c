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
use crate::{
    helpers::{strip_line_terminator, trim_ascii_end},
    message::{
        mail::{Attachment, BodyPart, Mail, MailHeaders},
        mime_type::{MimeHeader, TransferEncoding},
    },
    MailParser, ParserError, ParserResult,
};

const MAX_DEPTH: usize = 32;

/// a mime parser, decoding the transfer encodings and flattening multiparts.
#[derive(Default)]
pub struct MailMimeParser {
    attachment_count: usize,
}

impl MailParser for MailMimeParser {
    #[tracing::instrument(name = "parse", skip_all, fields(lines = raw.len()))]
    fn parse_sync(&mut self, raw: Vec<Vec<u8>>) -> ParserResult<Mail> {
        let lines = raw
            .iter()
            .map(|line| strip_line_terminator(line))
            .collect::<Vec<_>>();

        let (headers, body) = split_headers(&lines)?;

        let mut mail = Mail {
            subject: headers.get("subject").map(str::to_string),
            date: headers.get("date").map(str::to_string),
            message_id: headers.get("message-id").map(str::to_string),
            ..Mail::default()
        };

        if !lines.is_empty() {
            self.attachment_count = 0;
            self.parse_entity(&headers, body, true, 0, &mut mail)?;
        }
        mail.headers = headers;

        tracing::trace!(
            parts = mail.parts.len(),
            attachments = mail.attachments.len(),
            "Message parsed."
        );

        Ok(mail)
    }
}

/// Split the header block from the body.
///
/// Folded lines are joined with a single space. The header block ends at the
/// first empty line, or at the end of the input.
fn split_headers<'a, 'b>(lines: &'a [&'b [u8]]) -> ParserResult<(MailHeaders, &'a [&'b [u8]])> {
    let mut headers = Vec::<(String, String)>::new();

    for (idx, line) in lines.iter().enumerate() {
        if line.is_empty() {
            return Ok((MailHeaders(headers), &lines[idx + 1..]));
        }

        if line.starts_with(b" ") || line.starts_with(b"\t") {
            let continuation = String::from_utf8_lossy(line);
            let continuation = continuation.trim();
            match headers.last_mut() {
                Some((_, value)) if value.is_empty() => value.push_str(continuation),
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(continuation);
                }
                None => {
                    return Err(ParserError::InvalidMail(
                        "folded line without a header to continue".to_string(),
                    ))
                }
            }
            continue;
        }

        let line = String::from_utf8_lossy(line);
        match line.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                headers.push((name.trim().to_string(), value.trim().to_string()));
            }
            _ => {
                return Err(ParserError::InvalidMail(format!(
                    "invalid header line '{line}'"
                )))
            }
        }
    }

    // a message without a body
    Ok((MailHeaders(headers), &lines[lines.len()..]))
}

/// Split a multipart body on `--boundary`, the preamble and epilogue are dropped.
fn split_multipart<'a, 'b>(
    body: &'a [&'b [u8]],
    boundary: &str,
) -> ParserResult<Vec<&'a [&'b [u8]]>> {
    let delimiter = format!("--{boundary}");
    let close = format!("--{boundary}--");

    let mut parts = vec![];
    let mut start = None;
    let mut closed = false;

    for (idx, line) in body.iter().enumerate() {
        let line = trim_ascii_end(line);
        if line == close.as_bytes() {
            if let Some(start) = start {
                parts.push(&body[start..idx]);
            }
            closed = true;
            break;
        } else if line == delimiter.as_bytes() {
            if let Some(start) = start {
                parts.push(&body[start..idx]);
            }
            start = Some(idx + 1);
        }
    }

    match (start, closed) {
        (None, _) => Err(ParserError::MisplacedBoundary(format!(
            "'{boundary}' never opens a part"
        ))),
        (Some(start), false) => {
            tracing::warn!(boundary, "Closing boundary not found.");
            parts.push(&body[start..]);
            Ok(parts)
        }
        (Some(_), true) => Ok(parts),
    }
}

fn mime_headers(headers: &MailHeaders, name: &str) -> Option<MimeHeader> {
    headers.get(name).map(|value| get_mime_header(name, value))
}

impl MailMimeParser {
    fn parse_entity(
        &mut self,
        headers: &MailHeaders,
        body: &[&[u8]],
        top_level: bool,
        depth: usize,
        mail: &mut Mail,
    ) -> ParserResult<()> {
        if depth > MAX_DEPTH {
            return Err(ParserError::InvalidMail(format!(
                "multipart nesting deeper than {MAX_DEPTH}"
            )));
        }

        let content_type = mime_headers(headers, "content-type");

        if let Some(content_type) = content_type
            .as_ref()
            .filter(|content_type| content_type.value.starts_with("multipart/"))
        {
            let boundary = content_type.args.get("boundary").ok_or_else(|| {
                ParserError::BoundaryNotFound(format!(
                    "'{}' without a boundary",
                    content_type.value
                ))
            })?;

            for part in split_multipart(body, boundary)? {
                let (part_headers, part_body) = split_headers(part)?;
                self.parse_entity(&part_headers, part_body, false, depth + 1, mail)?;
            }
            return Ok(());
        }

        let transfer_encoding = headers
            .get("content-transfer-encoding")
            .map(|encoding| {
                encoding
                    .parse::<TransferEncoding>()
                    .map_err(|_| ParserError::InvalidEncoding {
                        encoding: encoding.to_string(),
                        reason: "unknown encoding".to_string(),
                    })
            })
            .transpose()?
            .unwrap_or_default();

        let mut encoded = body.join(&b"\r\n"[..]);
        if top_level && !body.is_empty() {
            encoded.extend_from_slice(b"\r\n");
        }
        let content = transfer_encoding.decode(&encoded)?;

        let disposition = mime_headers(headers, "content-disposition");
        let filename = disposition
            .as_ref()
            .and_then(|disposition| disposition.args.get("filename"))
            .or_else(|| {
                content_type
                    .as_ref()
                    .and_then(|content_type| content_type.args.get("name"))
            })
            .cloned();
        let is_attachment = disposition
            .as_ref()
            .map_or(false, |disposition| disposition.value == "attachment")
            || filename.is_some();

        if is_attachment {
            self.attachment_count += 1;
            mail.attachments.push(Attachment {
                filename: filename
                    .unwrap_or_else(|| format!("attachment-{}", self.attachment_count)),
                content_type: content_type.map_or_else(
                    || "application/octet-stream".to_string(),
                    |content_type| content_type.value,
                ),
                transfer_encoding,
                content_id: headers.get("content-id").map(|id| {
                    id.trim_start_matches('<')
                        .trim_end_matches('>')
                        .to_string()
                }),
                content,
            });
        } else {
            let (content_type, charset) = content_type.map_or_else(
                || ("text/plain".to_string(), None),
                |mut content_type| (content_type.value, content_type.args.remove("charset")),
            );
            mail.parts.push(BodyPart {
                content_type,
                charset,
                transfer_encoding,
                content,
            });
        }

        Ok(())
    }
}

/// Split a structured header value into a [`MimeHeader`].
///
/// ```
/// let header = vcapture_mail_parser::get_mime_header(
///     "Content-Type",
///     r#"multipart/mixed; boundary="simple; boundary""#,
/// );
/// assert_eq!(header.value, "multipart/mixed");
/// assert_eq!(header.args["boundary"], "simple; boundary");
/// ```
#[must_use]
pub fn get_mime_header(name: &str, value: &str) -> MimeHeader {
    let mut sections = vec![];
    let mut current = String::new();
    let mut quoted = false;

    for c in value.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            ';' if !quoted => sections.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    sections.push(current);

    let mut sections = sections.into_iter();
    let value = sections
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    let args = sections
        .filter_map(|arg| {
            arg.split_once('=').map(|(key, value)| {
                (
                    key.trim().to_ascii_lowercase(),
                    value.trim().trim_matches('"').to_string(),
                )
            })
        })
        .collect();

    MimeHeader {
        name: name.to_ascii_lowercase(),
        value,
        args,
    }
}
