use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables for a lookup pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupConfig {
    /// Registrar referrals the transport follows for domain queries.
    pub max_domain_follow: u8,
    /// Referrals followed for IP, ASN and CIDR queries.
    pub max_resource_follow: u8,
    pub timeout: Duration,
    /// Expiry applied by the bundled stores; `None` keeps entries forever.
    pub cache_ttl: Option<Duration>,
    /// Directory for the on-disk store; `None` lets the caller pick a default.
    pub cache_dir: Option<PathBuf>,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            max_domain_follow: 0,
            max_resource_follow: 5,
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: None,
            cache_dir: None,
        }
    }
}

impl LookupConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_domain_follow(mut self, follow: u8) -> Self {
        self.max_domain_follow = follow;
        self
    }

    pub fn with_max_resource_follow(mut self, follow: u8) -> Self {
        self.max_resource_follow = follow;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Defaults overlaid with `MAX_WHOIS_FOLLOW`, `MAX_IP_WHOIS_FOLLOW`,
    /// `WHOIS_TIMEOUT_SECS`, `WHOIS_CACHE_TTL_SECS` and `WHOIS_CACHE_DIR`.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(follow) = parse_var(&var, "MAX_WHOIS_FOLLOW") {
            config.max_domain_follow = follow;
        }
        if let Some(follow) = parse_var(&var, "MAX_IP_WHOIS_FOLLOW") {
            config.max_resource_follow = follow;
        }
        if let Some(secs) = parse_var(&var, "WHOIS_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&var, "WHOIS_CACHE_TTL_SECS") {
            config.cache_ttl = Some(Duration::from_secs(secs));
        }
        if let Some(dir) = var("WHOIS_CACHE_DIR").filter(|dir| !dir.trim().is_empty()) {
            config.cache_dir = Some(PathBuf::from(dir.trim()));
        }

        config
    }
}

fn parse_var<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = var(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparsable environment value");
            None
        }
    }
}
