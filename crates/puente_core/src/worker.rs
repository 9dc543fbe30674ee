//! Per-connection transaction handler.
//!
//! Reads one request line, validates the method, hands GET/HEAD to the
//! relay engine and maps relay failures onto client-visible error
//! responses. One transaction per connection; the socket dies when this
//! returns, success or not.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::BytesMut;
use puente_config::PuenteConfig;
use puente_http::request::RequestLine;
use puente_http::responses::{send_400, send_431, send_501, send_502};
use puente_http::{ClientStream, stream};
use puente_relay::{HeaderSide, RelayError};
use tracing::{debug, info, instrument, warn};

/// Entry point for a "logical worker" that handles a single connection.
#[instrument(
    skip(stream, cfg),
    fields(
        client = %client_addr,
    )
)]
pub async fn handle_connection(
    mut stream: Box<dyn ClientStream>,
    client_addr: SocketAddr,
    cfg: Arc<PuenteConfig>,
) -> anyhow::Result<()> {
    debug!(target: "puente::worker", "Handling new client connection");

    let mut buf = BytesMut::new();

    // 1) Read the request line
    let line = match stream::read_line(
        &mut stream,
        &mut buf,
        cfg.limits.max_request_header_bytes(),
    )
    .await
    {
        Ok(Some(line)) => line,
        Ok(None) => {
            debug!(target: "puente::worker", "Client closed without sending a request line");
            return Ok(());
        }
        Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
            warn!(target: "puente::worker", "Request line exceeds the header limit");
            send_431(stream.as_mut()).await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // 2) Parse it
    let request = RequestLine::parse(&String::from_utf8_lossy(&line));
    debug!(
        target: "puente::worker",
        method = %request.method,
        request_target = %request.target,
        version = %request.version,
        "Parsed request line"
    );

    // 3) Gate the method before any upstream contact
    if !request.method_supported() {
        warn!(
            target: "puente::worker",
            method = %request.method,
            "Rejecting unsupported method"
        );
        send_501(stream.as_mut(), &request.method).await?;
        return Ok(());
    }

    // 4) Relay, mapping failures to what the client may still receive
    match puente_relay::serve(stream.as_mut(), &mut buf, &request, &cfg).await {
        Ok(summary) => {
            info!(
                target: "puente::worker",
                method = %request.method,
                request_target = %request.target,
                header_bytes = summary.response_header_bytes,
                body_bytes = summary.response_body_bytes,
                "Transaction complete"
            );
        }
        Err(RelayError::InvalidTarget { ref reason, .. }) => {
            warn!(
                target: "puente::worker",
                request_target = %request.target,
                reason = %reason,
                "Rejecting unparseable request target"
            );
            send_400(stream.as_mut(), &request.target).await?;
        }
        Err(RelayError::UpstreamUnreachable { ref addr, ref source }) => {
            warn!(
                target: "puente::worker",
                origin = %addr,
                error = %source,
                "Origin unreachable; answering 502"
            );
            send_502(stream.as_mut(), addr).await?;
        }
        Err(RelayError::OversizedHeaders {
            side: HeaderSide::Request,
            limit,
        }) => {
            warn!(
                target: "puente::worker",
                limit,
                "Request headers over the limit; answering 431"
            );
            send_431(stream.as_mut()).await?;
        }
        Err(e) => {
            // Response bytes may already be on the wire; nothing sane can
            // be synthesized at this point.
            warn!(
                target: "puente::worker",
                error = %e,
                "Transaction aborted mid-relay"
            );
        }
    }

    Ok(())
}
