use crate::error::RelayError;

pub const DEFAULT_PORT: u16 = 80;

/// Origin coordinates recovered from a request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Target {
    /// Decomposes a request target into host, port and path with a single
    /// left-to-right scan. A `:` before the first `/` always wins over
    /// path-only parsing; a scheme separator (`//`), when present, is
    /// skipped before the scan starts.
    pub fn parse(raw: &str) -> Result<Self, RelayError> {
        let rest = match raw.find("//") {
            Some(idx) => &raw[idx + 2..],
            None => raw,
        };

        let colon = rest.find(':');
        let slash = rest.find('/');

        let (host, port, path) = match (colon, slash) {
            (Some(c), s) if s.is_none_or(|s| c < s) => {
                let port_end = s.unwrap_or(rest.len());
                let port = parse_port(&rest[c + 1..port_end]).ok_or_else(|| {
                    RelayError::InvalidTarget {
                        target: raw.to_string(),
                        reason: "port is not an integer between 1 and 65535",
                    }
                })?;
                (&rest[..c], port, s.map_or("/", |s| &rest[s..]))
            }
            (_, Some(s)) => (&rest[..s], DEFAULT_PORT, &rest[s..]),
            (_, None) => (rest, DEFAULT_PORT, "/"),
        };

        if host.is_empty() {
            return Err(RelayError::InvalidTarget {
                target: raw.to_string(),
                reason: "empty host",
            });
        }

        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    /// `host:port` form used for the upstream connect.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    raw.parse::<u16>().ok().filter(|port| *port != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> Target {
        Target::parse(raw).expect("expected a valid target")
    }

    #[test]
    fn full_url_with_port_and_query() {
        let t = parsed("http://www.example.com:8080/a/b?c=1");
        assert_eq!(t.host, "www.example.com");
        assert_eq!(t.port, 8080);
        assert_eq!(t.path, "/a/b?c=1");
    }

    #[test]
    fn schemeless_with_port_and_query() {
        let t = parsed("www.example.com:8080/a/b?c=1");
        assert_eq!(t.host, "www.example.com");
        assert_eq!(t.port, 8080);
        assert_eq!(t.path, "/a/b?c=1");
    }

    #[test]
    fn scheme_and_path_default_port() {
        let t = parsed("http://example.test/index.html");
        assert_eq!(t.host, "example.test");
        assert_eq!(t.port, DEFAULT_PORT);
        assert_eq!(t.path, "/index.html");
    }

    #[test]
    fn bare_host_defaults_everything() {
        let t = parsed("www.example.com");
        assert_eq!(t.host, "www.example.com");
        assert_eq!(t.port, 80);
        assert_eq!(t.path, "/");
    }

    #[test]
    fn port_without_path_defaults_path() {
        let t = parsed("http://host:8080");
        assert_eq!(t.host, "host");
        assert_eq!(t.port, 8080);
        assert_eq!(t.path, "/");
    }

    #[test]
    fn colon_after_slash_belongs_to_the_path() {
        let t = parsed("host/a:b");
        assert_eq!(t.host, "host");
        assert_eq!(t.port, 80);
        assert_eq!(t.path, "/a:b");
    }

    #[test]
    fn addr_joins_host_and_port() {
        assert_eq!(parsed("example.test:81/x").addr(), "example.test:81");
    }

    #[test]
    fn empty_host_is_rejected() {
        for raw in ["", "/only/path", ":8080/x", "http://"] {
            let err = Target::parse(raw).unwrap_err();
            assert!(
                matches!(err, RelayError::InvalidTarget { .. }),
                "{raw:?} should be invalid"
            );
        }
    }

    #[test]
    fn bad_ports_are_rejected() {
        for raw in ["host:0/x", "host:65536", "host:-1/x", "host:80x/x", "host:/x"] {
            let err = Target::parse(raw).unwrap_err();
            assert!(
                matches!(err, RelayError::InvalidTarget { .. }),
                "{raw:?} should be invalid"
            );
        }
    }

    #[test]
    fn scan_skips_the_first_scheme_separator() {
        let t = parsed("https://secure.example.com/login");
        assert_eq!(t.host, "secure.example.com");
        assert_eq!(t.path, "/login");
    }
}
