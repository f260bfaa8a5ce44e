use std::{env, time::Duration};

use tracing::warn;

/// Blocks at least this long (in chars) are always tables.
pub const DEFAULT_NARRATIVE_MAX_LEN: usize = 1600;
/// Symbols containing this marker carry a two-row column header.
pub const DEFAULT_BREAKPOINTS_MARKER: &str = "_breakpoints";

pub const DEFAULT_BASE_URL: &str = "https://invespar.com/";
pub const DOWNLOAD_PREFIX: &str = "ajax/download/";
pub const LISTING_PATH: &str = "research/";

const MAX_RETRIES: usize = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const RETRY_DELAY: Duration = Duration::from_millis(500);

/// Tunables of the document parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub narrative_max_len: usize,
    pub breakpoints_marker: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            narrative_max_len: DEFAULT_NARRATIVE_MAX_LEN,
            breakpoints_marker: DEFAULT_BREAKPOINTS_MARKER.to_string(),
        }
    }
}

impl ParseOptions {
    /// Number of header rows the table bodies of `symbol` start with.
    pub fn header_depth(&self, symbol: &str) -> usize {
        if !self.breakpoints_marker.is_empty() && symbol.contains(&self.breakpoints_marker) {
            2
        } else {
            1
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Provider root, always ending in `/`.
    pub base_url: String,
    pub max_attempts: usize,
    pub timeout: Duration,
    pub retry_delay: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_attempts: MAX_RETRIES,
            timeout: REQUEST_TIMEOUT,
            retry_delay: RETRY_DELAY,
        }
    }
}

impl FetchConfig {
    /// Defaults overridden by `FACTORLIB_BASE_URL`, `FACTORLIB_MAX_ATTEMPTS`
    /// and `FACTORLIB_TIMEOUT_SECS`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(base) = env::var("FACTORLIB_BASE_URL") {
            cfg = cfg.with_base_url(&base);
        }
        if let Some(n) = read_env_number("FACTORLIB_MAX_ATTEMPTS") {
            cfg.max_attempts = (n as usize).max(1);
        }
        if let Some(secs) = read_env_number("FACTORLIB_TIMEOUT_SECS") {
            cfg.timeout = Duration::from_secs(secs);
        }
        cfg
    }

    pub fn with_base_url(mut self, base: &str) -> Self {
        let mut base = base.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        self.base_url = base;
        self
    }

    pub fn download_prefix(&self) -> String {
        format!("{}{}", self.base_url, DOWNLOAD_PREFIX)
    }

    pub fn listing_url(&self) -> String {
        format!("{}{}", self.base_url, LISTING_PATH)
    }
}

fn read_env_number(key: &str) -> Option<u64> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(n) => Some(n),
        Err(e) => {
            warn!(key, value = %raw, "ignoring invalid setting: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_depth_follows_breakpoints_marker() {
        let opts = ParseOptions::default();
        assert_eq!(opts.header_depth("ME_breakpoints"), 2);
        assert_eq!(opts.header_depth("FourFactors"), 1);
        assert_eq!(opts.header_depth("breakpoints"), 1);
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let cfg = FetchConfig::default().with_base_url("http://localhost:8080");
        assert_eq!(cfg.base_url, "http://localhost:8080/");
        assert_eq!(cfg.download_prefix(), "http://localhost:8080/ajax/download/");
        assert_eq!(cfg.listing_url(), "http://localhost:8080/research/");
    }

    #[test]
    fn defaults_match_provider() {
        let cfg = FetchConfig::default();
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.timeout, Duration::from_secs(5));
        assert_eq!(
            cfg.download_prefix(),
            "https://invespar.com/ajax/download/"
        );
    }
}
