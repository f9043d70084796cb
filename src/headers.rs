//! Header names and the header block of a phantom request.
//!
//! The default headers are overlaid after the extra headers of a record, so a
//! user supplied `Host` or `Content-Type` never reaches the ammo file.

pub const HOST: &str = "Host";
pub const CONTENT_LENGTH: &str = "Content-Length";

/// Headers every bullet carries, after `Host`.
pub const DEFAULT_HEADERS: [(&str, &str); 4] = [
    ("User-Agent", "phantom"),
    ("Accept", "*/*"),
    ("Content-Type", "application/json"),
    ("Connection", "Close"),
];

/// `content-TYPE` -> `Content-Type`. Every `-` separated segment is lower cased
/// and gets its first letter upper cased. Only ASCII letters change case, so
/// applying it twice gives the same name.
pub fn canonicalize_header_name(name: &str) -> String {
    name.split('-')
        .map(|segment| {
            let mut segment = segment.to_ascii_lowercase();
            if let Some(first) = segment.get_mut(..1) {
                first.make_ascii_uppercase();
            }
            segment
        })
        .collect::<Vec<String>>()
        .join("-")
}

/// Ordered header block with canonical names, one value per name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    pub fn new() -> HeaderSet {
        HeaderSet::default()
    }

    /// Extra headers first, then `Host` and the defaults on top of them.
    pub fn merged<'a, I>(extra_headers: I, host: &str, port: u16) -> HeaderSet
    where
        I: IntoIterator<Item = &'a (String, String)>,
    {
        let mut headers = HeaderSet::new();
        for (name, value) in extra_headers {
            headers.insert(name, value.as_str());
        }
        headers.insert(HOST, format!("{}:{}", host, port));
        for (name, value) in DEFAULT_HEADERS {
            headers.insert(name, value);
        }
        headers
    }

    /// Replaces the value in place when the canonical name is already present.
    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        let name = canonicalize_header_name(name);
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let name = canonicalize_header_name(name);
        let position = self.entries.iter().position(|(existing, _)| *existing == name)?;
        Some(self.entries.remove(position).1)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let name = canonicalize_header_name(name);
        self.entries
            .iter()
            .find(|(existing, _)| *existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// `Name: value` lines joined by CRLF, without a trailing CRLF.
    pub fn render(&self) -> String {
        self.iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<String>>()
            .join("\r\n")
    }
}
