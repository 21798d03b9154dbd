//! HTTP-shaped request and response types.

use crate::{error::HttpError, message::Message, records::null_as_default};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    str::FromStr,
};

/// The `Content-Type` header name.
pub const CONTENT_TYPE: &str = "Content-Type";

// ============================================================================
// Method
// ============================================================================

/// The methods a path route can be registered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    /// All supported methods.
    pub const ALL: [Method; 7] = [
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Options,
    ];

    /// Upper-case wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The method string is not one of the supported methods.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method {0:?}")]
pub struct UnsupportedMethod(pub String);

impl FromStr for Method {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnsupportedMethod(s.to_string()))
    }
}

// ============================================================================
// Request
// ============================================================================

/// An HTTP-style request as delivered by the platform's gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    pub http_method: String,
    pub path: String,
    /// The gateway's route template, when it sends one.
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub query_string_parameters: HashMap<String, String>,
    /// Named segments captured by the path router.
    #[serde(default, deserialize_with = "null_as_default")]
    pub path_parameters: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stage_variables: HashMap<String, String>,
    #[serde(default)]
    pub request_context: Value,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl HttpRequest {
    /// Create a request for `method` and `path` with nothing else set.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            http_method: method.as_str().to_string(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// The parsed method.
    pub fn method(&self) -> Result<Method, UnsupportedMethod> {
        self.http_method.parse()
    }

    /// A header value, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// A captured path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path_parameters.get(name).map(String::as_str)
    }

    /// A query string parameter.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_string_parameters.get(name).map(String::as_str)
    }

    /// Set a header, builder style.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the body, builder style.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

impl Message for HttpRequest {}

fn find_header<'a, I, K>(headers: I, name: &str) -> Option<&'a str>
where
    I: IntoIterator<Item = (&'a K, &'a String)>,
    K: AsRef<str> + 'a + ?Sized,
{
    headers
        .into_iter()
        .find(|(key, _)| key.as_ref().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

// ============================================================================
// Response
// ============================================================================

/// The response contract for HTTP-shaped invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new(200)
    }
}

impl HttpResponse {
    /// An empty response with the given status.
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: BTreeMap::new(),
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    /// An empty `200 OK`.
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// A `text/plain` response.
    pub fn text(body: impl Into<String>) -> Self {
        Self::ok()
            .with_header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .with_body(body)
    }

    /// An `application/json` response.
    pub fn json(body: &Value) -> Self {
        Self::ok()
            .with_header(CONTENT_TYPE, "application/json")
            .with_body(body.to_string())
    }

    /// The `404 Not Found` the path router answers with by default.
    pub fn not_found() -> Self {
        Self::text("Not Found").with_status(404)
    }

    /// Set the status, builder style.
    pub fn with_status(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    /// Set a header, builder style.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Set the body, builder style.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set a header, replacing any existing header of the same name
    /// regardless of case.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers
            .retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
        self.headers.insert(name, value.into());
    }

    /// A header value, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// The currently-set content type.
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
    }

    /// Copy headers from `self` into `response` where `response` does not
    /// already set them, returning `response`.
    ///
    /// Used to carry headers that middleware placed on the draft response
    /// into the response the handler produced.
    pub fn merge_into(&self, mut response: HttpResponse) -> HttpResponse {
        for (name, value) in &self.headers {
            if response.header(name).is_none() {
                response.headers.insert(name.clone(), value.clone());
            }
        }
        response
    }

    /// Render `error` as a response whose body format follows `content_type`.
    ///
    /// The status is taken from [`HttpError`] when the error is one, and is
    /// 500 otherwise. Formats: JSON, HTML, XML, and plain text for anything
    /// else.
    pub fn from_error(
        content_type: Option<&str>,
        error: &(dyn std::error::Error + 'static),
    ) -> Self {
        let status = error
            .downcast_ref::<HttpError>()
            .map(|e| e.status)
            .unwrap_or(500);
        let message = error.to_string();
        let format = ErrorFormat::from_content_type(content_type);

        let body = match format {
            ErrorFormat::Json => json!({ "error": message, "status": status }).to_string(),
            ErrorFormat::Html => format!(
                "<!DOCTYPE html><html><head><title>{status} {reason}</title></head>\
                 <body><h1>{status} {reason}</h1><p>{message}</p></body></html>",
                reason = reason_phrase(status),
                message = escape_markup(&message),
            ),
            ErrorFormat::Xml => format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                 <error><status>{status}</status><message>{}</message></error>",
                escape_markup(&message),
            ),
            ErrorFormat::Text => message,
        };

        Self::new(status)
            .with_header(CONTENT_TYPE, format.content_type())
            .with_body(body)
    }
}

impl Message for HttpResponse {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ErrorFormat {
    Text,
    Json,
    Html,
    Xml,
}

impl ErrorFormat {
    fn from_content_type(content_type: Option<&str>) -> Self {
        let Some(content_type) = content_type else {
            return ErrorFormat::Text;
        };
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence == "application/json" || essence.ends_with("+json") {
            ErrorFormat::Json
        } else if essence == "text/html" || essence == "application/xhtml+xml" {
            ErrorFormat::Html
        } else if essence == "application/xml" || essence == "text/xml" || essence.ends_with("+xml")
        {
            ErrorFormat::Xml
        } else {
            ErrorFormat::Text
        }
    }

    fn content_type(&self) -> &'static str {
        match self {
            ErrorFormat::Text => "text/plain; charset=utf-8",
            ErrorFormat::Json => "application/json",
            ErrorFormat::Html => "text/html; charset=utf-8",
            ErrorFormat::Xml => "application/xml",
        }
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Error",
    }
}

fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
