use tokio::io::AsyncWriteExt;

use crate::ClientStream;

/// Sends a self-contained HTTP/1.0 error response with a small HTML body.
/// `cause` names the offending piece of the request (method, target, ...).
pub async fn send_error(
    stream: &mut dyn ClientStream,
    code: &str,
    reason: &str,
    detail: &str,
    cause: &str,
) -> anyhow::Result<()> {
    let body = format!(
        "<html><title>Puente Error</title><body bgcolor=\"ffffff\">\r\n\
         {code}: {reason}\r\n\
         <p>{detail}: {cause}\r\n\
         <hr><em>The puente proxy</em>\r\n"
    );

    let head = format!(
        "HTTP/1.0 {code} {reason}\r\n\
         Content-type: text/html\r\n\
         Content-length: {}\r\n\
         \r\n",
        body.len()
    );

    stream.write_all(head.as_bytes()).await?;
    stream.write_all(body.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

pub async fn send_400(stream: &mut dyn ClientStream, target: &str) -> anyhow::Result<()> {
    send_error(
        stream,
        "400",
        "Bad request",
        "Puente cannot parse this request target",
        target,
    )
    .await
}

pub async fn send_431(stream: &mut dyn ClientStream) -> anyhow::Result<()> {
    send_error(
        stream,
        "431",
        "Request header fields too large",
        "Puente refuses to buffer this header block",
        "request headers",
    )
    .await
}

pub async fn send_501(stream: &mut dyn ClientStream, method: &str) -> anyhow::Result<()> {
    send_error(
        stream,
        "501",
        "Not implemented",
        "Puente does not implement this method",
        method,
    )
    .await
}

pub async fn send_502(stream: &mut dyn ClientStream, origin: &str) -> anyhow::Result<()> {
    send_error(
        stream,
        "502",
        "Bad gateway",
        "Puente could not reach the origin server",
        origin,
    )
    .await
}
