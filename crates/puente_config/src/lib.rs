use std::time::Duration;

// =======================================================
// RELAY LIMITS + DEFAULTS
// =======================================================
#[derive(Debug, Clone)]
pub struct RelayLimits {
    // Limits (bytes)
    pub max_request_header_bytes: usize,
    pub max_response_header_bytes: usize,

    // Timeouts (seconds)
    pub connect_timeout_secs: u64,

    // Accept loop
    pub max_connections: usize,
}

impl Default for RelayLimits {
    fn default() -> Self {
        Self {
            max_request_header_bytes: 64 * 1024,
            max_response_header_bytes: 64 * 1024,
            connect_timeout_secs: 5,
            max_connections: 1024,
        }
    }
}

impl RelayLimits {
    pub fn max_request_header_bytes(&self) -> usize {
        self.max_request_header_bytes
    }

    pub fn max_response_header_bytes(&self) -> usize {
        self.max_response_header_bytes
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

// =======================================================
// HEADER REWRITE PROFILE + DEFAULTS
// =======================================================
/// Values the rewriter stamps onto every outbound request.
#[derive(Debug, Clone)]
pub struct RewriteProfile {
    /// `User-Agent` sent upstream regardless of what the client supplied.
    pub user_agent: String,
}

impl Default for RewriteProfile {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) \
                         Gecko/20120305 Firefox/10.0.3"
                .into(),
        }
    }
}

impl RewriteProfile {
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

// =======================================================
// PUENTE CONFIG (main config)
// =======================================================
#[derive(Debug, Clone, Default)]
pub struct PuenteConfig {
    pub limits: RelayLimits,
    pub rewrite: RewriteProfile,
}

impl PuenteConfig {
    pub fn limits(&self) -> &RelayLimits {
        &self.limits
    }

    pub fn rewrite(&self) -> &RewriteProfile {
        &self.rewrite
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = PuenteConfig::default();
        assert_eq!(cfg.limits.max_request_header_bytes(), 64 * 1024);
        assert_eq!(cfg.limits.connect_timeout(), Duration::from_secs(5));
        assert!(cfg.rewrite.user_agent().starts_with("Mozilla/5.0"));
    }
}
