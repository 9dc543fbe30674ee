/// First line of a client request (`GET http://host/path HTTP/1.0`),
/// split on ASCII whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub version: String,
}

impl RequestLine {
    /// Tokenizes a raw request line. Missing tokens fall back to harmless
    /// placeholders; later stages reject what they cannot use.
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        let method = parts.next().unwrap_or("-").to_string();
        let target = parts.next().unwrap_or("/").to_string();
        let version = parts.next().unwrap_or("HTTP/1.0").to_string();

        Self {
            method,
            target,
            version,
        }
    }

    /// Only GET and HEAD are relayed upstream.
    pub fn method_supported(&self) -> bool {
        self.is_get() || self.is_head()
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    pub fn is_head(&self) -> bool {
        self.method.eq_ignore_ascii_case("HEAD")
    }
}
