use std::{fmt, io};

use thiserror::Error;

/// Which header block blew past its configured limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderSide {
    Request,
    Response,
}

impl fmt::Display for HeaderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderSide::Request => write!(f, "request"),
            HeaderSide::Response => write!(f, "response"),
        }
    }
}

/// Everything that can end a transaction early. All of these are scoped
/// to one connection; none of them outlive it.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The request target could not be decomposed into host/port/path.
    #[error("invalid request target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: &'static str },

    /// Connecting to the origin failed: refused, unresolvable, or timed out.
    #[error("origin {addr} unreachable: {source}")]
    UpstreamUnreachable {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// A header block grew past its configured byte limit.
    #[error("{side} headers exceed the {limit}-byte limit")]
    OversizedHeaders { side: HeaderSide, limit: usize },

    /// The origin closed before the response header terminator arrived.
    #[error("origin closed before finishing its response headers")]
    ShortHeaders,

    /// The origin delivered fewer body bytes than its headers declared.
    #[error("origin sent {got} body bytes but declared {declared}")]
    ShortBody { declared: usize, got: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}
