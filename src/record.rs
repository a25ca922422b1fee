use crate::request::HttpMethod;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Connection refused, DNS or TLS failure.
    Connect,
    Timeout,
    Redirect,
    /// The response started but its body could not be read.
    Body,
    Request,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Connect => "connect",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Redirect => "redirect",
            ErrorKind::Body => "body",
            ErrorKind::Request => "request",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CapturedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn from_reqwest(err: &reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connect
        } else if err.is_redirect() {
            ErrorKind::Redirect
        } else if err.is_body() || err.is_decode() {
            ErrorKind::Body
        } else {
            ErrorKind::Request
        };
        Self::new(kind, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Outcome {
    Success { status: u16, body: String },
    Failure(CapturedError),
}

/// The settled result of one request, at the same index as its spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    pub index: usize,
    pub method: HttpMethod,
    pub url: String,
    /// Seconds. `None` when the request failed before any timing was taken.
    pub elapsed: Option<f64>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl ResponseRecord {
    pub fn success(
        index: usize,
        method: HttpMethod,
        url: impl Into<String>,
        elapsed: f64,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self {
            index,
            method,
            url: url.into(),
            elapsed: Some(elapsed),
            outcome: Outcome::Success {
                status,
                body: body.into(),
            },
        }
    }

    pub fn failure(
        index: usize,
        method: HttpMethod,
        url: impl Into<String>,
        elapsed: Option<f64>,
        error: CapturedError,
    ) -> Self {
        Self {
            index,
            method,
            url: url.into(),
            elapsed,
            outcome: Outcome::Failure(error),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match &self.outcome {
            Outcome::Success { status, .. } => Some(*status),
            Outcome::Failure(_) => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success { body, .. } => Some(body),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&CapturedError> {
        match &self.outcome {
            Outcome::Failure(err) => Some(err),
            Outcome::Success { .. } => None,
        }
    }
}
