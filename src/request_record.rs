use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::errors::RecordError;

pub const DEFAULT_PORT: u16 = 80;

/// Field names accepted in a raw request description.
pub const FIELDS: [&str; 7] = ["host", "url", "method", "port", "case", "extra_headers", "body"];

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }
}

impl Display for HttpMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Method names are matched exactly, "get" is not GET.
impl FromStr for HttpMethod {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| RecordError::UnknownMethod(s.to_string()))
    }
}

/// Request payload as it was given; rendered to text by the serializer.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Body {
    #[default]
    Empty,
    Text(String),
    Json(Map<String, Value>),
}

impl Body {
    /// Empty strings, empty mappings and `null` all mean "no body".
    pub fn from_value(value: &Value) -> Result<Body, RecordError> {
        match value {
            Value::Null => Ok(Body::Empty),
            Value::String(text) if text.is_empty() => Ok(Body::Empty),
            Value::String(text) => Ok(Body::Text(text.clone())),
            Value::Object(map) if map.is_empty() => Ok(Body::Empty),
            Value::Object(map) => Ok(Body::Json(map.clone())),
            other => Err(RecordError::InvalidField {
                field: "body",
                reason: format!("must be a string or a mapping, got {}", type_name(other)),
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Body::Empty)
    }

    /// Resolves the body to the text that goes on the wire.
    pub fn render(&self) -> Result<Cow<'_, str>, serde_json::Error> {
        match self {
            Body::Empty => Ok(Cow::Borrowed("")),
            Body::Text(text) => Ok(Cow::Borrowed(text)),
            Body::Json(map) => crate::bullet_serializer::to_json_string(map).map(Cow::Owned),
        }
    }
}

/// One validated request to turn into a bullet.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestRecord {
    host: String,
    url: String,
    method: HttpMethod,
    port: u16,
    case: String,
    extra_headers: Vec<(String, String)>,
    body: Body,
}

impl RequestRecord {
    pub fn new(
        host: impl Into<String>,
        url: impl Into<String>,
        method: HttpMethod,
    ) -> Result<RequestRecord, RecordError> {
        let host = non_empty("host", host.into())?;
        let url = non_empty("url", url.into())?;
        Ok(RequestRecord {
            case: url.clone(),
            host,
            url,
            method,
            port: DEFAULT_PORT,
            extra_headers: Vec::new(),
            body: Body::Empty,
        })
    }

    pub fn with_port(mut self, port: u16) -> Result<RequestRecord, RecordError> {
        if port == 0 {
            return Err(RecordError::PortOutOfRange(port.to_string()));
        }
        self.port = port;
        Ok(self)
    }

    /// An empty case falls back to the url.
    pub fn with_case(mut self, case: impl Into<String>) -> RequestRecord {
        let case = case.into();
        self.case = if case.is_empty() { self.url.clone() } else { case };
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> RequestRecord {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Body) -> RequestRecord {
        self.body = body;
        self
    }

    /// Decodes one raw request description. Every key must be one of [`FIELDS`].
    pub fn from_value(value: &Value) -> Result<RequestRecord, RecordError> {
        let fields = value.as_object().ok_or(RecordError::NotAMapping)?;

        let mut host = None;
        let mut url = None;
        let mut method = None;
        let mut port = None;
        let mut case = None;
        let mut extra_headers = None;
        let mut body = None;

        for (key, value) in fields {
            match key.as_str() {
                "host" => host = Some(required_string("host", value)?),
                "url" => url = Some(required_string("url", value)?),
                "method" => method = Some(required_string("method", value)?.parse::<HttpMethod>()?),
                "port" => port = parse_port(value)?,
                "case" => case = optional_string("case", value)?,
                "extra_headers" => extra_headers = Some(parse_headers(value)?),
                "body" => body = Some(Body::from_value(value)?),
                unknown => return Err(RecordError::UnknownField(unknown.to_string())),
            }
        }

        let mut record = RequestRecord::new(
            host.ok_or(RecordError::MissingField("host"))?,
            url.ok_or(RecordError::MissingField("url"))?,
            method.ok_or(RecordError::MissingField("method"))?,
        )?
        .with_port(port.unwrap_or(DEFAULT_PORT))?
        .with_case(case.unwrap_or_default())
        .with_body(body.unwrap_or_default());
        record.extra_headers = extra_headers.unwrap_or_default();
        Ok(record)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn case(&self) -> &str {
        &self.case
    }

    pub fn extra_headers(&self) -> &[(String, String)] {
        &self.extra_headers
    }

    pub fn body(&self) -> &Body {
        &self.body
    }
}

fn non_empty(field: &'static str, value: String) -> Result<String, RecordError> {
    if value.is_empty() {
        return Err(RecordError::InvalidField {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    Ok(value)
}

fn required_string(field: &'static str, value: &Value) -> Result<String, RecordError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        other => Err(RecordError::InvalidField {
            field,
            reason: format!("must be a string, got {}", type_name(other)),
        }),
    }
}

fn optional_string(field: &'static str, value: &Value) -> Result<Option<String>, RecordError> {
    match value {
        Value::Null => Ok(None),
        other => required_string(field, other).map(Some),
    }
}

fn parse_port(value: &Value) -> Result<Option<u16>, RecordError> {
    if value.is_null() {
        return Ok(None);
    }
    if !value.is_i64() && !value.is_u64() {
        return Err(RecordError::InvalidField {
            field: "port",
            reason: format!("must be an integer, got {}", type_name(value)),
        });
    }
    match value.as_u64().and_then(|port| u16::try_from(port).ok()) {
        Some(port) if port > 0 => Ok(Some(port)),
        _ => Err(RecordError::PortOutOfRange(value.to_string())),
    }
}

fn parse_headers(value: &Value) -> Result<Vec<(String, String)>, RecordError> {
    let map = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Object(map) => map,
        other => {
            return Err(RecordError::InvalidField {
                field: "extra_headers",
                reason: format!("must be a mapping, got {}", type_name(other)),
            })
        }
    };
    map.iter()
        .map(|(name, value)| match value {
            Value::String(text) => Ok((name.clone(), text.clone())),
            other => Err(RecordError::InvalidField {
                field: "extra_headers",
                reason: format!("value of `{}` must be a string, got {}", name, type_name(other)),
            }),
        })
        .collect()
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
