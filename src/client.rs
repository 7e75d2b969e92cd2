use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use serde_json::{Map, Value};

use crate::config::{load_config, ClientConfig};
use crate::error::DaisyconError;
use crate::oauth::TokenManager;
use crate::request::{Method, Request};
use crate::resolver::resolve;

/// GET payloads whose query string reaches this size go out as POST with a
/// method-override header instead.
pub const MAX_QUERY_BYTES: usize = 3000;

pub const METHOD_OVERRIDE_HEADER: &str = "X-HTTP-Method-Override";

/// Status, decoded body and `X-` headers of a successful call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Option<Value>,
    pub headers: BTreeMap<String, String>,
}

/// Client for the REST API.
///
/// Calls are independent; the only state shared between them is the token
/// file behind the [`TokenManager`].
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
    http: reqwest::Client,
    tokens: TokenManager,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, DaisyconError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );

        if config.danger_accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled");
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("daisycon-rs/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout())
            .danger_accept_invalid_certs(config.danger_accept_invalid_certs)
            .build()?;

        let tokens = TokenManager::new(&config, http.clone());
        Ok(Self {
            config,
            http,
            tokens,
        })
    }

    /// Build a client from the discovered config file and environment.
    pub fn from_config(cli_config: Option<&str>) -> Result<Self, DaisyconError> {
        Self::new(load_config(cli_config)?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Resolve a call name such as `getPublishersMedia` and execute it.
    pub async fn call(&self, name: &str, args: &[Value]) -> Result<Option<Value>, DaisyconError> {
        let request = resolve(name, args)?;
        Ok(self.execute(&request, false).await?.body)
    }

    pub async fn execute(
        &self,
        request: &Request,
        skip_auth: bool,
    ) -> Result<ApiResponse, DaisyconError> {
        let url = absolute_url(self.config.api_base_url(), &request.path);

        let (method, query) = match request.method {
            Method::Get => plan_get(&request.payload),
            other => (other, String::new()),
        };

        let mut builder = match method {
            Method::Get => self.http.get(with_query(&url, &query)),
            Method::GetAsPost => self
                .http
                .post(&url)
                .header(METHOD_OVERRIDE_HEADER, "GET")
                .json(&request.payload),
            Method::Post => self.http.post(&url),
            Method::Put => self.http.put(&url),
            Method::Delete => self.http.delete(&url),
        };
        if matches!(method, Method::Post | Method::Put | Method::Delete)
            && !request.payload.is_empty()
        {
            builder = builder.json(&request.payload);
        }

        if !skip_auth {
            let token = self.tokens.bearer().await?;
            builder = builder.bearer_auth(token);
        }

        tracing::debug!("{method} {url}");
        let response = builder.send().await?;

        let status = response.status();
        let headers = capture_headers(response.headers());
        let bytes = response.bytes().await?;
        let body = decode_body(&bytes);

        classify(status, body.as_ref(), &bytes)?;
        Ok(ApiResponse {
            status: status.as_u16(),
            body,
            headers,
        })
    }
}

fn absolute_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

fn with_query(url: &str, query: &str) -> String {
    if query.is_empty() {
        url.to_string()
    } else if url.contains('?') {
        format!("{url}&{query}")
    } else {
        format!("{url}?{query}")
    }
}

/// Decide how a GET travels: with its query string, or as a POST carrying
/// the payload once the query reaches [`MAX_QUERY_BYTES`].
fn plan_get(payload: &Map<String, Value>) -> (Method, String) {
    let query = encode_query(payload);
    if query.len() >= MAX_QUERY_BYTES {
        (Method::GetAsPost, String::new())
    } else {
        (Method::Get, query)
    }
}

/// Form-encode a payload. Nested values use bracket keys: `a[b]=1`, `a[0]=x`.
/// Null values are omitted.
pub fn encode_query(payload: &Map<String, Value>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in payload {
        append_pairs(&mut serializer, key, value);
    }
    serializer.finish()
}

fn append_pairs(
    serializer: &mut url::form_urlencoded::Serializer<'_, String>,
    key: &str,
    value: &Value,
) {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            serializer.append_pair(key, if *b { "true" } else { "false" });
        }
        Value::Number(n) => {
            serializer.append_pair(key, &n.to_string());
        }
        Value::String(s) => {
            serializer.append_pair(key, s);
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                append_pairs(serializer, &format!("{key}[{i}]"), item);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                append_pairs(serializer, &format!("{key}[{k}]"), v);
            }
        }
    }
}

fn capture_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut captured = BTreeMap::new();
    for (name, value) in headers {
        let name = name.as_str();
        if !name.starts_with("x-") {
            continue;
        }
        let Ok(value) = value.to_str() else { continue };
        captured
            .entry(name.to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    captured
}

fn decode_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("Response body is not JSON: {e}");
            None
        }
    }
}

/// Map a status code to success or the matching error.
pub fn classify(status: StatusCode, body: Option<&Value>, raw: &[u8]) -> Result<(), DaisyconError> {
    let code = status.as_u16();
    if matches!(code, 200 | 201 | 202 | 204) {
        return Ok(());
    }

    let message = error_message(body, raw)
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_default();
    Err(match code {
        400 => DaisyconError::BadRequest {
            status: code,
            message,
        },
        403 => DaisyconError::Forbidden {
            status: code,
            message,
        },
        404 => DaisyconError::NotFound {
            status: code,
            message,
        },
        500 | 503 => DaisyconError::InternalServer {
            status: code,
            message,
        },
        _ => DaisyconError::UnsupportedStatus {
            status: code,
            message,
        },
    })
}

fn error_message(body: Option<&Value>, raw: &[u8]) -> Option<String> {
    if let Some(body) = body {
        if let Some(msg) = message_from_value(body) {
            return Some(msg);
        }
    }
    let text = String::from_utf8_lossy(raw);
    let text = text.trim();
    if text.is_empty() || body.is_some() {
        return None;
    }
    Some(text.chars().take(200).collect())
}

fn message_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => ["message", "error_description", "error"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(message_from_value),
        Value::Array(items) => items.first().and_then(message_from_value),
        _ => None,
    }
}
