use std::io;

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::ClientStream;

/// Pulls one read off the stream into `buf`. Returns the number of bytes
/// read; 0 means the peer closed its write side.
pub async fn read_more(stream: &mut dyn ClientStream, buf: &mut BytesMut) -> io::Result<usize> {
    let mut tmp = [0u8; 4096];
    let n = stream.read(&mut tmp).await?;
    if n > 0 {
        buf.extend_from_slice(&tmp[..n]);
    }
    Ok(n)
}

/// Splits one CRLF-terminated line (terminator included) off the front of
/// `buf`, reading more from the stream as needed.
///
/// `Ok(None)` means EOF arrived before a complete line; any partial tail
/// is left in `buf` for the caller to inspect. Errors with `InvalidData`
/// when `buf` grows past `max_buffered` without a CRLF showing up.
pub async fn read_line(
    stream: &mut dyn ClientStream,
    buf: &mut BytesMut,
    max_buffered: usize,
) -> io::Result<Option<Bytes>> {
    loop {
        if let Some(end) = find_crlf(buf) {
            return Ok(Some(buf.split_to(end + 2).freeze()));
        }
        if buf.len() > max_buffered {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "header line exceeds the configured limit",
            ));
        }
        if read_more(stream, buf).await? == 0 {
            return Ok(None);
        }
    }
}

/// Relays exactly `count` bytes from `from` into `to`, draining leftovers
/// already sitting in `from_buf` first. Stops early if `from` reaches EOF;
/// the caller compares the returned count against what it asked for.
/// Bytes read past `count` stay in `from_buf`.
pub async fn copy_exact(
    from: &mut dyn ClientStream,
    from_buf: &mut BytesMut,
    to: &mut dyn ClientStream,
    count: usize,
) -> io::Result<usize> {
    let mut remaining = count;
    while remaining > 0 {
        if !from_buf.is_empty() {
            let take = remaining.min(from_buf.len());
            to.write_all(&from_buf[..take]).await?;
            from_buf.advance(take);
            remaining -= take;
            continue;
        }
        if read_more(from, from_buf).await? == 0 {
            break;
        }
    }
    Ok(count - remaining)
}

/// Relays from `from` into `to` until EOF, draining `from_buf` first.
/// Returns the number of bytes forwarded.
pub async fn copy_until_eof(
    from: &mut dyn ClientStream,
    from_buf: &mut BytesMut,
    to: &mut dyn ClientStream,
) -> io::Result<usize> {
    let mut total = 0usize;
    loop {
        if !from_buf.is_empty() {
            to.write_all(&from_buf[..]).await?;
            total += from_buf.len();
            from_buf.clear();
        }
        if read_more(from, from_buf).await? == 0 {
            return Ok(total);
        }
    }
}

pub fn find_crlf(buf: &BytesMut) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}
