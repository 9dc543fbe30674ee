use std::io;

use bytes::BytesMut;
use puente_config::{PuenteConfig, RelayLimits};
use puente_http::request::RequestLine;
use puente_http::{ClientStream, stream};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::{HeaderSide, RelayError};

mod headers;
pub(crate) mod target;
mod upstream;

use target::Target;

/// What one transaction moved on the response path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySummary {
    pub response_header_bytes: usize,
    pub response_body_bytes: usize,
}

/// Runs one full transaction: decompose the target, finish reading the
/// client's header block, send the rewritten request upstream in a single
/// write, then relay the origin's response back verbatim.
///
/// `client_buf` must be positioned right after the request line so the
/// header scan picks up where the caller stopped. The origin socket lives
/// and dies inside this call; the caller tears down the client side.
pub async fn serve(
    client: &mut dyn ClientStream,
    client_buf: &mut BytesMut,
    request: &RequestLine,
    cfg: &PuenteConfig,
) -> Result<RelaySummary, RelayError> {
    let target = Target::parse(&request.target)?;

    let set = headers::read_header_set(client, client_buf, cfg.limits().max_request_header_bytes())
        .await?;
    let outbound = headers::assemble_outbound(request, &target, &set, cfg.rewrite());

    let mut origin = upstream::connect(&target, cfg.limits().connect_timeout()).await?;
    origin.write_all(&outbound).await?;

    debug!(
        target: "puente::relay",
        origin = %target.addr(),
        path = %target.path,
        outbound_bytes = outbound.len(),
        "Sent rewritten request upstream"
    );

    relay_response(client, &mut origin, request, cfg.limits()).await
}

/// Forwards the origin's response: headers line-by-line and byte-exact,
/// then the body per method and declared length.
async fn relay_response(
    client: &mut dyn ClientStream,
    origin: &mut TcpStream,
    request: &RequestLine,
    limits: &RelayLimits,
) -> Result<RelaySummary, RelayError> {
    let mut origin_buf = BytesMut::new();
    let limit = limits.max_response_header_bytes();

    let mut header_bytes = 0usize;
    let mut content_length: Option<usize> = None;
    let mut status_seen = false;

    loop {
        let line = match stream::read_line(origin, &mut origin_buf, limit).await {
            Ok(Some(line)) => line,
            Ok(None) => return Err(RelayError::ShortHeaders),
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                return Err(RelayError::OversizedHeaders {
                    side: HeaderSide::Response,
                    limit,
                });
            }
            Err(e) => return Err(e.into()),
        };

        header_bytes += line.len();
        if header_bytes > limit {
            return Err(RelayError::OversizedHeaders {
                side: HeaderSide::Response,
                limit,
            });
        }

        client.write_all(&line).await?;

        if !status_seen {
            status_seen = true;
            debug!(
                target: "puente::relay",
                status_line = %String::from_utf8_lossy(&line).trim_end(),
                "Received origin status line"
            );
        } else if let Some(len) = parse_content_length(&line) {
            // Repeated headers: the last parseable value wins.
            content_length = Some(len);
        }

        if line.as_ref() == b"\r\n" {
            break;
        }
    }

    let mut body_bytes = 0usize;
    if request.is_get() {
        match content_length {
            Some(declared) => {
                body_bytes = stream::copy_exact(origin, &mut origin_buf, client, declared).await?;
                if body_bytes < declared {
                    return Err(RelayError::ShortBody {
                        declared,
                        got: body_bytes,
                    });
                }
            }
            None => {
                debug!(
                    target: "puente::relay",
                    "No usable Content-Length; relaying until the origin closes"
                );
                body_bytes = stream::copy_until_eof(origin, &mut origin_buf, client).await?;
            }
        }
    }

    client.flush().await?;

    Ok(RelaySummary {
        response_header_bytes: header_bytes,
        response_body_bytes: body_bytes,
    })
}

/// Case-insensitive scan of one raw header line for a `Content-Length`
/// key. A value that does not parse is reported and treated as absent.
fn parse_content_length(line: &[u8]) -> Option<usize> {
    let lower = String::from_utf8_lossy(line).to_ascii_lowercase();
    let rest = lower.strip_prefix("content-length:")?;
    match rest.trim().parse::<usize>() {
        Ok(len) => Some(len),
        Err(_) => {
            warn!(
                target: "puente::relay",
                value = %rest.trim(),
                "Ignoring unparseable Content-Length"
            );
            None
        }
    }
}
