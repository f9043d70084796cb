//! Turns a [`RequestRecord`] into a phantom bullet:
//!
//! ```text
//! <request length> <case>\n
//! <METHOD> <url> HTTP/1.1\r\n<headers>[\r\nContent-Length: <n>\r\n\r\n<body>]\r\n\r\n
//! ```
//!
//! The length counts the bytes of the request only, not the tag line and not
//! the closing blank line.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;
use serde_json::{Map, Value};

use crate::diagnostics::{single_line, DiagnosticSink};
use crate::errors::SerializationError;
use crate::headers::{HeaderSet, CONTENT_LENGTH};
use crate::request_record::RequestRecord;

/// JSON layout with a space after `,` and `:`, e.g. `{"a": 1, "b": [1, 2]}`.
/// Non-ASCII characters are written as `\uXXXX` escapes, UTF-16 surrogate
/// pairs above U+FFFF, so a rendered body is always plain ASCII.
#[derive(Debug, Default, Clone, Copy)]
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut plain_start = 0;
        for (index, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(fragment[plain_start..index].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                writer.write_all(format!("\\u{:04x}", unit).as_bytes())?;
            }
            plain_start = index + ch.len_utf8();
        }
        writer.write_all(fragment[plain_start..].as_bytes())
    }
}

/// Renders a structured body. Keys keep their input order.
pub fn to_json_string(body: &Map<String, Value>) -> Result<String, serde_json::Error> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
    body.serialize(&mut serializer)?;
    // serde_json only ever writes valid utf-8
    String::from_utf8(buffer).map_err(|err| serde::ser::Error::custom(err.to_string()))
}

#[derive(Clone, Copy, Default)]
pub struct BulletSerializer<'a> {
    sink: Option<&'a dyn DiagnosticSink>,
}

impl<'a> BulletSerializer<'a> {
    pub fn new() -> BulletSerializer<'a> {
        BulletSerializer { sink: None }
    }

    pub fn with_sink(sink: &'a dyn DiagnosticSink) -> BulletSerializer<'a> {
        BulletSerializer { sink: Some(sink) }
    }

    /// Header block without `Content-Length`; a user supplied one is dropped.
    pub fn headers(&self, record: &RequestRecord) -> HeaderSet {
        let mut headers = HeaderSet::merged(record.extra_headers(), record.host(), record.port());
        headers.remove(CONTENT_LENGTH);
        headers
    }

    /// The HTTP/1.1 request text, without the bullet framing.
    pub fn request(&self, record: &RequestRecord) -> Result<String, SerializationError> {
        let body = record.body().render().map_err(|source| SerializationError {
            case: record.case().to_string(),
            source,
        })?;
        let mut headers = self.headers(record);
        let request_line = format!("{} {} HTTP/1.1", record.method(), record.url());

        if body.is_empty() {
            return Ok(format!("{}\r\n{}", request_line, headers.render()));
        }
        headers.insert(CONTENT_LENGTH, body.len().to_string());
        Ok(format!("{}\r\n{}\r\n\r\n{}", request_line, headers.render(), body))
    }

    /// The framed bullet, ready to be appended to an ammo file.
    pub fn bullet(&self, record: &RequestRecord) -> Result<String, SerializationError> {
        let request = self.request(record)?;
        let bullet = format!("{} {}\n{}\r\n\r\n", request.len(), record.case(), request);
        if let Some(sink) = self.sink {
            sink.debug(&single_line(&bullet));
        }
        Ok(bullet)
    }
}

impl std::fmt::Debug for BulletSerializer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulletSerializer")
            .field("sink", &self.sink.is_some())
            .finish()
    }
}
