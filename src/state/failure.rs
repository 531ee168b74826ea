/// Failure classes reported by fetch attempts
use std::fmt;

/// How a single fetch attempt failed
///
/// Transport failures and parse failures are terminal for the attempt. Write
/// failures are the only class that can put a task back on the retry queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    /// TCP/TLS connection could not be established in time
    ConnectTimeout,

    /// The server stopped sending before the read timeout
    SocketTimeout,

    /// The link could not be parsed as a request URI
    MalformedUri,

    /// Any status other than 200, or a protocol-level failure
    HttpError,

    /// Anything the transport could not classify
    Unknown,

    /// The HTML body could not be decoded
    Parse,

    /// A download could not be persisted
    Write,
}

impl FailureKind {
    /// Returns all failure kinds
    pub fn all() -> [Self; 7] {
        [
            Self::ConnectTimeout,
            Self::SocketTimeout,
            Self::MalformedUri,
            Self::HttpError,
            Self::Unknown,
            Self::Parse,
            Self::Write,
        ]
    }

    /// Returns a short snake_case name for logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConnectTimeout => "connect_timeout",
            Self::SocketTimeout => "socket_timeout",
            Self::MalformedUri => "malformed_uri",
            Self::HttpError => "http_error",
            Self::Unknown => "unknown",
            Self::Parse => "parse",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
