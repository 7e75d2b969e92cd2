//! Maps synthetic call names such as `getPublishersMedia` onto requests.

use serde_json::{Map, Value};

use crate::error::DaisyconError;
use crate::request::{Collection, Method, Request, RequestBuilder};

/// Resolve a call name and its positional arguments into a [`Request`].
///
/// The first word of the name is the HTTP method, the remaining words are
/// path segments. A call into a known collection with further segments
/// consumes the first argument as the entity id. A trailing JSON object is
/// the payload; every other argument becomes an extra path segment.
pub fn resolve(name: &str, args: &[Value]) -> Result<Request, DaisyconError> {
    let chunks = split_words(name);
    let (keyword, rest) = chunks.split_first().ok_or_else(|| DaisyconError::UnknownMethod {
        name: name.to_string(),
        suggestion: None,
    })?;

    let method = Method::from_keyword(keyword).ok_or_else(|| DaisyconError::UnknownMethod {
        name: name.to_string(),
        suggestion: suggest_keyword(keyword),
    })?;

    let mut args = args;
    let mut builder = RequestBuilder::new(method).segments(rest.iter().cloned());

    if let Some(collection) = rest.first().and_then(|c| Collection::lookup(c)) {
        if rest.len() > 1 {
            let (first, remaining) = args.split_first().ok_or_else(|| {
                DaisyconError::MissingIdentifier {
                    collection: collection.as_str().to_string(),
                    got: "nothing".to_string(),
                }
            })?;
            let id = parse_entity_id(first).ok_or_else(|| DaisyconError::MissingIdentifier {
                collection: collection.as_str().to_string(),
                got: first.to_string(),
            })?;
            builder = builder.entity_id(id);
            args = remaining;
        }
    }

    let (segments, payload) = match args.split_last() {
        Some((Value::Object(map), before)) => (before, map.clone()),
        _ => (args, Map::new()),
    };

    builder
        .segments(segments.iter().map(segment_text))
        .payload(payload)
        .build()
}

/// Split a camel-cased name into lowercase words.
///
/// A new word starts at an uppercase letter that follows a lowercase letter
/// or digit, so `getPublishersMedia` gives `get`, `publishers`, `media`.
pub fn split_words(name: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in name.chars() {
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.extend(ch.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn parse_entity_id(value: &Value) -> Option<u64> {
    let id = match value {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    (id > 0).then_some(id)
}

fn segment_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Suggest a method keyword within Levenshtein distance 2 of `input`.
fn suggest_keyword(input: &str) -> Option<String> {
    Method::KEYWORDS
        .iter()
        .map(|k| (strsim::levenshtein(input, k), *k))
        .filter(|(dist, _)| *dist <= 2)
        .min_by_key(|(dist, _)| *dist)
        .map(|(_, k)| k.to_string())
}
