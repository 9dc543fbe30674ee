use std::io;

use tokio::net::TcpStream;
use tokio::time::{Duration, timeout};
use tracing::debug;

use super::target::Target;
use crate::error::RelayError;

/// Opens the origin connection, bounding the attempt with the configured
/// timeout. Refusal, failed resolution and timeout all surface as
/// `UpstreamUnreachable`; there is no retry.
pub(super) async fn connect(
    target: &Target,
    connect_timeout: Duration,
) -> Result<TcpStream, RelayError> {
    let addr = target.addr();
    debug!(target: "puente::relay", origin = %addr, "Connecting to origin");

    match timeout(connect_timeout, TcpStream::connect(&addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(RelayError::UpstreamUnreachable { addr, source: e }),
        Err(_) => Err(RelayError::UpstreamUnreachable {
            addr,
            source: io::Error::new(io::ErrorKind::TimedOut, "connect timed out"),
        }),
    }
}
