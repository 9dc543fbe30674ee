//! The forwarding engine: request-target decomposition, header rewrite,
//! origin connect, and the byte-for-byte response relay.

mod error;
mod relay;

pub use error::{HeaderSide, RelayError};
pub use relay::target::{DEFAULT_PORT, Target};
pub use relay::{RelaySummary, serve};
