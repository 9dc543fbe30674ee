use bytes::{Bytes, BytesMut};
use puente_config::RewriteProfile;
use puente_http::request::RequestLine;
use puente_http::{ClientStream, stream};
use tracing::debug;

use super::target::Target;
use crate::error::{HeaderSide, RelayError};

pub(super) const CONNECTION_LINE: &str = "Connection: close\r\n";
pub(super) const PROXY_CONNECTION_LINE: &str = "Proxy-Connection: close\r\n";

/// Client header lines partitioned by rewrite rule: the first `Host` line
/// is kept aside verbatim, the always-synthesized keys are dropped, and
/// everything else passes through untouched, in arrival order.
#[derive(Debug, Default)]
pub(super) struct HeaderSet {
    host: Option<Bytes>,
    passthrough: Vec<Bytes>,
}

impl HeaderSet {
    fn absorb(&mut self, line: Bytes) {
        if line_has_key(&line, "Host") {
            // First occurrence wins; later Host lines are dropped.
            if self.host.is_none() {
                self.host = Some(line);
            }
        } else if line_has_key(&line, "Connection")
            || line_has_key(&line, "Proxy-Connection")
            || line_has_key(&line, "User-Agent")
        {
            // Always synthesized; the client's copies never go upstream.
        } else {
            self.passthrough.push(line);
        }
    }
}

/// Reads client header lines until the blank terminator or EOF, enforcing
/// the request-header byte limit. A partial line cut off by EOF is
/// discarded; the lines collected before it still count.
pub(super) async fn read_header_set(
    client: &mut dyn ClientStream,
    buf: &mut BytesMut,
    limit: usize,
) -> Result<HeaderSet, RelayError> {
    let mut set = HeaderSet::default();
    let mut used = 0usize;

    loop {
        let line = match stream::read_line(client, buf, limit).await {
            Ok(line) => line,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                return Err(RelayError::OversizedHeaders {
                    side: HeaderSide::Request,
                    limit,
                });
            }
            Err(e) => return Err(e.into()),
        };

        let Some(line) = line else {
            debug!(target: "puente::relay", "Client closed before the header terminator");
            return Ok(set);
        };

        used += line.len();
        if used > limit {
            return Err(RelayError::OversizedHeaders {
                side: HeaderSide::Request,
                limit,
            });
        }

        if line.as_ref() == b"\r\n" {
            return Ok(set);
        }
        set.absorb(line);
    }
}

/// Builds the outbound header block in its fixed order: request line,
/// Host, the two close overrides, User-Agent, passthrough, blank line.
/// The request line is always rewritten to HTTP/1.0, whatever version
/// the client spoke.
pub(super) fn assemble_outbound(
    request: &RequestLine,
    target: &Target,
    set: &HeaderSet,
    profile: &RewriteProfile,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(256);

    out.extend_from_slice(format!("{} {} HTTP/1.0\r\n", request.method, target.path).as_bytes());

    match &set.host {
        Some(line) => out.extend_from_slice(line),
        None => out.extend_from_slice(format!("Host: {}\r\n", target.host).as_bytes()),
    }

    out.extend_from_slice(CONNECTION_LINE.as_bytes());
    out.extend_from_slice(PROXY_CONNECTION_LINE.as_bytes());
    out.extend_from_slice(format!("User-Agent: {}\r\n", profile.user_agent()).as_bytes());

    for line in &set.passthrough {
        out.extend_from_slice(line);
    }

    out.extend_from_slice(b"\r\n");
    out
}

/// `line` starts with `key` followed directly by a colon, ignoring case.
fn line_has_key(line: &[u8], key: &str) -> bool {
    line.len() > key.len()
        && line[key.len()] == b':'
        && line[..key.len()].eq_ignore_ascii_case(key.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    fn set_of(lines: &[&str]) -> HeaderSet {
        let mut set = HeaderSet::default();
        for line in lines {
            set.absorb(Bytes::copy_from_slice(line.as_bytes()));
        }
        set
    }

    fn assembled(request_line: &str, target: &str, lines: &[&str]) -> String {
        let request = RequestLine::parse(request_line);
        let target = Target::parse(target).unwrap();
        let out = assemble_outbound(&request, &target, &set_of(lines), &RewriteProfile::default());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn fixed_order_with_synthesized_host() {
        let out = assembled("GET http://example.test/index.html HTTP/1.0", "http://example.test/index.html", &[]);
        let profile = RewriteProfile::default();
        let expected = format!(
            "GET /index.html HTTP/1.0\r\nHost: example.test\r\nConnection: close\r\nProxy-Connection: close\r\nUser-Agent: {}\r\n\r\n",
            profile.user_agent()
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn client_host_is_kept_verbatim_first_wins() {
        let out = assembled(
            "GET http://example.test/ HTTP/1.1",
            "http://example.test/",
            &["Host: first.test\r\n", "Host: second.test\r\n"],
        );
        assert!(out.contains("Host: first.test\r\n"));
        assert!(!out.contains("second.test"));
        assert_eq!(out.matches("Host:").count(), 1);
    }

    #[test]
    fn request_line_is_forced_to_http10() {
        let out = assembled("GET http://h/ HTTP/1.1", "http://h/", &[]);
        assert!(out.starts_with("GET / HTTP/1.0\r\n"));
    }

    #[test]
    fn synthesized_keys_are_dropped_case_insensitively() {
        let out = assembled(
            "GET http://h/ HTTP/1.0",
            "http://h/",
            &[
                "connection: keep-alive\r\n",
                "PROXY-CONNECTION: keep-alive\r\n",
                "user-agent: curl/8.0\r\n",
            ],
        );
        assert_eq!(out.matches("onnection:").count(), 2);
        assert!(out.contains("Connection: close\r\n"));
        assert!(out.contains("Proxy-Connection: close\r\n"));
        assert!(!out.contains("keep-alive"));
        assert!(!out.contains("curl"));
    }

    #[test]
    fn passthrough_preserves_order_and_bytes() {
        let out = assembled(
            "GET http://h/ HTTP/1.0",
            "http://h/",
            &[
                "Accept: */*\r\n",
                "X-Weird:   spacing kept \r\n",
                "Cookie: a=b\r\n",
            ],
        );
        let accept = out.find("Accept: */*\r\n").unwrap();
        let weird = out.find("X-Weird:   spacing kept \r\n").unwrap();
        let cookie = out.find("Cookie: a=b\r\n").unwrap();
        assert!(accept < weird && weird < cookie);
    }

    #[test]
    fn lines_without_a_matching_key_pass_through() {
        let out = assembled(
            "GET http://h/ HTTP/1.0",
            "http://h/",
            &["Hostile: yes\r\n", "Host : spaced\r\n", "garbage line\r\n"],
        );
        assert!(out.contains("Hostile: yes\r\n"));
        assert!(out.contains("Host : spaced\r\n"));
        assert!(out.contains("garbage line\r\n"));
        // The spaced variant is not a Host line, so one gets synthesized.
        assert!(out.contains("Host: h\r\n"));
    }

    #[test]
    fn rewrite_is_idempotent_on_its_own_output() {
        let request = RequestLine::parse("GET http://example.test/a HTTP/1.0");
        let target = Target::parse("http://example.test/a").unwrap();
        let profile = RewriteProfile::default();

        let first = assemble_outbound(
            &request,
            &target,
            &set_of(&["Host: example.test\r\n", "Accept: text/html\r\n"]),
            &profile,
        );

        // Feed the produced header lines (minus request line and blank
        // terminator) back through the partition.
        let text = String::from_utf8(first.clone()).unwrap();
        let mut set = HeaderSet::default();
        for line in text.split_inclusive("\r\n").skip(1) {
            if line == "\r\n" {
                break;
            }
            set.absorb(Bytes::copy_from_slice(line.as_bytes()));
        }
        let second = assemble_outbound(&request, &target, &set, &profile);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn read_header_set_stops_at_terminator_and_keeps_leftovers() {
        let (mut near, mut far) = tokio::io::duplex(1024);
        far.write_all(b"Host: x\r\nAccept: */*\r\n\r\ntrailing bytes")
            .await
            .unwrap();
        drop(far);

        let mut buf = BytesMut::new();
        let set = read_header_set(&mut near, &mut buf, 4096).await.unwrap();
        assert!(set.host.is_some());
        assert_eq!(set.passthrough.len(), 1);
        assert_eq!(&buf[..], b"trailing bytes");
    }

    #[tokio::test]
    async fn read_header_set_tolerates_eof_without_terminator() {
        let (mut near, mut far) = tokio::io::duplex(1024);
        far.write_all(b"Accept: */*\r\n").await.unwrap();
        drop(far);

        let mut buf = BytesMut::new();
        let set = read_header_set(&mut near, &mut buf, 4096).await.unwrap();
        assert!(set.host.is_none());
        assert_eq!(set.passthrough.len(), 1);
    }

    #[tokio::test]
    async fn read_header_set_enforces_the_byte_limit() {
        let (mut near, mut far) = tokio::io::duplex(8192);
        let mut block = Vec::new();
        for i in 0..64 {
            block.extend_from_slice(format!("X-Filler-{i}: {}\r\n", "v".repeat(64)).as_bytes());
        }
        far.write_all(&block).await.unwrap();
        drop(far);

        let mut buf = BytesMut::new();
        let err = read_header_set(&mut near, &mut buf, 512).await.unwrap_err();
        assert!(matches!(
            err,
            RelayError::OversizedHeaders {
                side: HeaderSide::Request,
                ..
            }
        ));
    }
}
