//! Low-level HTTP/1.0 networking layer.
//!
//! Everything here works on raw bytes: a stream trait the rest of the
//! workspace shares, buffered line reading and relay primitives over
//! `BytesMut`, request-line tokenizing, and the synthesized error
//! responses the proxy sends on its own behalf.

use tokio::io::{AsyncRead, AsyncWrite};

pub mod request;
pub mod responses;
pub mod stream;

pub trait ClientStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T> ClientStream for T where T: AsyncRead + AsyncWrite + Unpin + Send {}
