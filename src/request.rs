use crate::error::{Error, Result};
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported HTTP method: {0}")]
pub struct UnsupportedMethod(pub String);

impl HttpMethod {
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

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            _ => Err(UnsupportedMethod(s.to_string())),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = UnsupportedMethod;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HttpMethod> for Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum RequestBody {
    Json(Value),
    Text(String),
    Form(BTreeMap<String, String>),
}

/// Per-request options recognized by the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Appended to the URL's query string.
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    #[serde(default)]
    pub body: Option<RequestBody>,

    /// Overrides the client-wide timeout for this request only.
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl RequestOptions {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// One outbound HTTP request to issue as part of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawRequestSpec")]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub url: String,
    #[serde(flatten)]
    pub options: RequestOptions,
}

// Flat on-disk shape. `flatten` cannot be combined with
// `deny_unknown_fields`, so misspelled keys are caught here instead.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRequestSpec {
    #[serde(default = "default_method")]
    method: HttpMethod,
    url: String,
    #[serde(default)]
    headers: BTreeMap<String, String>,
    #[serde(default)]
    params: BTreeMap<String, String>,
    #[serde(default)]
    body: Option<RequestBody>,
    #[serde(default)]
    timeout_ms: Option<u64>,
}

impl From<RawRequestSpec> for RequestSpec {
    fn from(raw: RawRequestSpec) -> Self {
        Self {
            method: raw.method,
            url: raw.url,
            options: RequestOptions {
                headers: raw.headers,
                params: raw.params,
                body: raw.body,
                timeout_ms: raw.timeout_ms,
            },
        }
    }
}

fn default_method() -> HttpMethod {
    HttpMethod::Get
}

impl RequestSpec {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            options: RequestOptions::default(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }

    /// Checks the request without touching the network. `index` is the
    /// position reported in the error.
    pub fn validate(&self, index: usize) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::malformed(index, "URL is empty"));
        }

        let url = Url::parse(&self.url)
            .map_err(|e| Error::malformed(index, format!("invalid URL '{}': {}", self.url, e)))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::malformed(
                index,
                format!("unsupported scheme '{}' in {}", url.scheme(), self.url),
            ));
        }

        for (name, value) in &self.options.headers {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| Error::malformed(index, format!("invalid header name '{}'", name)))?;
            HeaderValue::from_str(value).map_err(|_| {
                Error::malformed(index, format!("invalid value for header '{}'", name))
            })?;
        }

        Ok(())
    }

    pub(crate) fn build(&self, client: &Client) -> RequestBuilder {
        let mut builder = client.request(self.method.into(), self.url.as_str());

        if !self.options.params.is_empty() {
            builder = builder.query(&self.options.params);
        }
        for (name, value) in &self.options.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &self.options.body {
            Some(RequestBody::Json(value)) => builder.json(value),
            Some(RequestBody::Text(text)) => builder.body(text.clone()),
            Some(RequestBody::Form(fields)) => builder.form(fields),
            None => builder,
        };
        if let Some(timeout) = self.options.timeout_duration() {
            builder = builder.timeout(timeout);
        }

        builder
    }
}

impl<S: Into<String>> From<(HttpMethod, S)> for RequestSpec {
    fn from((method, url): (HttpMethod, S)) -> Self {
        RequestSpec::new(method, url)
    }
}

impl<S: Into<String>> From<(HttpMethod, S, RequestOptions)> for RequestSpec {
    fn from((method, url, options): (HttpMethod, S, RequestOptions)) -> Self {
        RequestSpec::new(method, url).with_options(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_methods_case_insensitively() {
        assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Delete".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
        assert!("FETCH".parse::<HttpMethod>().is_err());
    }

    #[test]
    fn rejects_empty_url() {
        let err = RequestSpec::get("  ").validate(3).unwrap_err();
        match err {
            Error::MalformedSpec { index, .. } => assert_eq!(index, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_relative_and_non_http_urls() {
        assert!(RequestSpec::get("/relative/path").validate(0).is_err());
        assert!(RequestSpec::get("ftp://example.com/file").validate(0).is_err());
        assert!(RequestSpec::get("https://example.com/ok").validate(0).is_ok());
    }

    #[test]
    fn rejects_bad_header_names() {
        let spec = RequestSpec::get("http://localhost/")
            .with_options(RequestOptions::default().header("bad header", "x"));
        assert!(spec.validate(0).is_err());
    }

    #[test]
    fn builds_from_tuples() {
        let spec: RequestSpec = (HttpMethod::Put, "http://localhost/a").into();
        assert_eq!(spec.method, HttpMethod::Put);
        assert_eq!(spec.url, "http://localhost/a");

        let options = RequestOptions::default().param("q", "1");
        let spec: RequestSpec = (HttpMethod::Get, "http://localhost/b", options.clone()).into();
        assert_eq!(spec.options, options);
    }

    #[test]
    fn deserializes_flattened_options() {
        let spec: RequestSpec = serde_json::from_str(
            r#"{"method": "post", "url": "http://localhost/x", "timeout_ms": 250,
                "headers": {"X-Id": "7"}, "body": {"type": "text", "data": "hi"}}"#,
        )
        .unwrap();
        assert_eq!(spec.method, HttpMethod::Post);
        assert_eq!(spec.options.timeout_duration(), Some(Duration::from_millis(250)));
        assert_eq!(spec.options.headers.get("X-Id").map(String::as_str), Some("7"));
        assert_eq!(spec.options.body, Some(RequestBody::Text("hi".into())));
    }

    #[test]
    fn rejects_misspelled_keys() {
        let err = serde_json::from_str::<RequestSpec>(
            r#"{"url": "http://localhost/x", "header": {"X-Id": "7"}}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("header"));
    }

    #[test]
    fn serializes_options_inline() {
        let spec = RequestSpec::get("http://localhost/x")
            .with_options(RequestOptions::default().param("q", "1"));
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["params"]["q"], "1");
        let back: RequestSpec = serde_json::from_value(json).unwrap();
        assert_eq!(back, spec);
    }
}
