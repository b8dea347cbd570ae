// ABOUTME: Error types for ptgen including the ErrorCode enum, GenError struct and RequestError enum.
// ABOUTME: GenError is an internal fault; RequestError is a malformed inbound request.

use std::fmt;

/// Error codes representing different categories of internal faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Fetch,
    Timeout,
    Decode,
    Extract,
    Cache,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::Fetch => "fetch error",
            ErrorCode::Timeout => "timeout",
            ErrorCode::Decode => "decode error",
            ErrorCode::Extract => "extraction error",
            ErrorCode::Cache => "cache error",
        };
        write!(f, "{}", s)
    }
}

/// An internal fault raised while fetching, parsing or normalizing upstream content.
///
/// Ordinary "not found" outcomes never use this type; they are encoded as
/// unsuccessful records by the site extractors.
#[derive(Debug, thiserror::Error)]
pub struct GenError {
    pub code: ErrorCode,
    pub url: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for GenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ptgen: {} {}: {}", self.op, self.url, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

impl GenError {
    fn new(
        code: ErrorCode,
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            url: url.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a Fetch error.
    pub fn fetch(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Fetch, url, op, source)
    }

    /// Create a Timeout error.
    pub fn timeout(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Timeout, url, op, source)
    }

    /// Create a Decode error (unparseable JSON or JSONP body).
    pub fn decode(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Decode, url, op, source)
    }

    /// Create an Extract error (upstream document has an unexpected shape).
    pub fn extract(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Extract, url, op, source)
    }

    /// Create a Cache error.
    pub fn cache(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Cache, url, op, source)
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is a Timeout error.
    pub fn is_timeout(&self) -> bool {
        self.code == ErrorCode::Timeout
    }

    /// Returns true if this is a Decode error.
    pub fn is_decode(&self) -> bool {
        self.code == ErrorCode::Decode
    }

    /// Returns true if this is an Extract error.
    pub fn is_extract(&self) -> bool {
        self.code == ErrorCode::Extract
    }

    /// Returns true if this is a Cache error.
    pub fn is_cache(&self) -> bool {
        self.code == ErrorCode::Cache
    }
}

/// An inbound request that cannot be dispatched to any extractor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RequestError {
    #[error("Miss key of `site` or `sid` , or input unsupported resource `url`.")]
    MissingParameters,
    #[error("Unknown value of key `site`.")]
    UnsupportedSite(String),
    #[error("Unknown value of key `source`.")]
    UnknownSource(String),
    #[error("Miss search function for `source`: {0}.")]
    MissingSearch(String),
}
