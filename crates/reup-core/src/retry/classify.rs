//! Coarse error kinds for call sites that talk HTTP.

/// What a failed remote call means for the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credential rejected; refresh it, then retry.
    Unauthorized,
    /// Connection or name-resolution failure; throttle, then retry.
    Connection,
    /// Server asked us to slow down (429); handled like `Connection`.
    Throttled,
    /// Anything else. Terminal.
    Other,
}

impl ErrorKind {
    /// Whether the limiter should shrink in response to this kind.
    pub fn throttles(self) -> bool {
        matches!(self, ErrorKind::Connection | ErrorKind::Throttled)
    }
}

/// Classify an HTTP status code.
pub fn classify_http_status(code: u16) -> ErrorKind {
    match code {
        401 | 403 => ErrorKind::Unauthorized,
        429 => ErrorKind::Throttled,
        _ => ErrorKind::Other,
    }
}
