use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The page did not signal readiness within the page-load budget.
    LoadTimeout { after: Duration },
    InvalidUrl,
    HttpStatus(u16),
    /// Transport-level timeout inside the browsing context.
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    UnsupportedContentType { content_type: String },
    Decode,
    Extraction,
    ContextClosed,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::LoadTimeout { after } => {
                write!(f, "page load timeout after {}s", after.as_secs_f64())
            }
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::UnsupportedContentType { content_type } => {
                write!(f, "unsupported content type {content_type}")
            }
            FailureKind::Decode => write!(f, "decode error"),
            FailureKind::Extraction => write!(f, "extraction error"),
            FailureKind::ContextClosed => write!(f, "browsing context closed"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Failure of one page visit. Always recoverable at the item level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at {url}: {message}")]
pub struct LoadError {
    pub kind: FailureKind,
    pub url: String,
    pub message: String,
}

impl LoadError {
    pub fn new(kind: FailureKind, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.kind, FailureKind::LoadTimeout { .. } | FailureKind::Timeout)
    }
}

/// Raised by an extractor that could not make sense of a loaded page.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("extraction failed: {0}")]
pub struct ExtractError(pub String);

impl ExtractError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
