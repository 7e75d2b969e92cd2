use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

use crate::error::DaisyconError;

/// Everything except RFC 3986 unreserved characters.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// HTTP methods understood by the API.
///
/// `GetAsPost` is a GET whose payload is too large for a query string; it
/// travels as a POST carrying `X-HTTP-Method-Override: GET`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    GetAsPost,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Keywords accepted as the first chunk of a synthetic call name.
    pub const KEYWORDS: [&'static str; 4] = ["get", "post", "put", "delete"];

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "get" => Some(Method::Get),
            "post" => Some(Method::Post),
            "put" => Some(Method::Put),
            "delete" => Some(Method::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::GetAsPost => "GET-as-POST",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resource collections whose members are addressed by a numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Advertisers,
    Publishers,
    LeadGeneration,
}

impl Collection {
    const TABLE: [(&'static str, Collection); 3] = [
        ("advertisers", Collection::Advertisers),
        ("publishers", Collection::Publishers),
        ("leadgeneration", Collection::LeadGeneration),
    ];

    pub fn lookup(segment: &str) -> Option<Self> {
        Self::TABLE
            .iter()
            .find(|(name, _)| *name == segment)
            .map(|(_, c)| *c)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Advertisers => "advertisers",
            Collection::Publishers => "publishers",
            Collection::LeadGeneration => "leadgeneration",
        }
    }
}

/// A fully resolved API request, ready for the executor.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub payload: Map<String, Value>,
}

/// Typed construction of a [`Request`].
///
/// The entity id, when given, is inserted right after the first segment;
/// that segment must be one of the known collections. Each segment is
/// percent-encoded on its own, so `/` or `?` inside one cannot change the
/// path shape; empty and dot-only segments are rejected.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    segments: Vec<String>,
    entity_id: Option<u64>,
    payload: Map<String, Value>,
}

impl RequestBuilder {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            segments: Vec::new(),
            entity_id: None,
            payload: Map::new(),
        }
    }

    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments.extend(segments.into_iter().map(Into::into));
        self
    }

    pub fn entity_id(mut self, id: u64) -> Self {
        self.entity_id = Some(id);
        self
    }

    pub fn payload(mut self, payload: Map<String, Value>) -> Self {
        self.payload = payload;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.payload.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Request, DaisyconError> {
        let mut parts = self.segments;
        if let Some(id) = self.entity_id {
            let collection = parts.first().map(String::as_str).unwrap_or_default();
            if Collection::lookup(collection).is_none() || id == 0 {
                return Err(DaisyconError::MissingIdentifier {
                    collection: collection.to_string(),
                    got: id.to_string(),
                });
            }
            parts.insert(1, id.to_string());
        }
        let encoded = parts
            .iter()
            .map(String::as_str)
            .map(encode_segment)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Request {
            method: self.method,
            path: format!("/{}", encoded.join("/")),
            payload: self.payload,
        })
    }
}

fn encode_segment(segment: &str) -> Result<String, DaisyconError> {
    if segment.is_empty() || segment.chars().all(|c| c == '.') {
        return Err(DaisyconError::InvalidSegment {
            segment: segment.to_string(),
        });
    }
    Ok(utf8_percent_encode(segment, PATH_SEGMENT).to_string())
}

/// Build a request from its parts in one call.
pub fn build_request(
    method: Method,
    segments: &[&str],
    entity_id: Option<u64>,
    payload: Map<String, Value>,
) -> Result<Request, DaisyconError> {
    let mut builder = RequestBuilder::new(method)
        .segments(segments.iter().copied())
        .payload(payload);
    if let Some(id) = entity_id {
        builder = builder.entity_id(id);
    }
    builder.build()
}
