use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use super::servers::{get_tld, get_whois_server, IANA_WHOIS_SERVER};
use crate::error::{Result, WhoislyError};
use crate::lookup::LookupOptions;
use crate::validation::extract_domain;

const WHOIS_PORT: u16 = 43;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RESPONSE_SIZE: usize = 1024 * 1024; // 1MB

static REFERRAL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?im)^\s*Registrar WHOIS Server:[ \t]*(\S+)",
        r"(?im)^\s*Whois Server:[ \t]*(\S+)",
        r"(?im)^\s*ReferralServer:[ \t]*whois://(\S+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("Invalid referral regex"))
    .collect()
});

/// Speaks the WHOIS wire protocol on behalf of the lookup orchestrator.
#[async_trait]
pub trait WhoisTransport: Send + Sync {
    /// Sends `name` and returns the raw response text.
    ///
    /// `options.server` overrides routing; otherwise the transport picks a server.
    async fn query(&self, name: &str, options: &LookupOptions) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct WhoisClient {
    timeout: Duration,
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WhoisClient {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn query_server(&self, server: &str, query: &str) -> Result<String> {
        self.query_addr(&format!("{}:{}", server, WHOIS_PORT), query)
            .await
    }

    /// One request/response exchange with `addr` (`host:port`); errors name the address.
    async fn query_addr(&self, addr: &str, query: &str) -> Result<String> {
        let mut stream = timeout(self.timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| WhoislyError::Timeout(format!("Connection to {} timed out", addr)))?
            .map_err(|e| WhoislyError::WhoisError(format!("Failed to connect to {}: {}", addr, e)))?;

        // Send query with CRLF
        let query_bytes = format!("{}\r\n", query);
        timeout(self.timeout, stream.write_all(query_bytes.as_bytes()))
            .await
            .map_err(|_| WhoislyError::Timeout(format!("Write to {} timed out", addr)))?
            .map_err(|e| WhoislyError::WhoisError(format!("Failed to send query to {}: {}", addr, e)))?;

        let mut response = Vec::new();
        let mut buf = [0u8; 4096];

        loop {
            match timeout(self.timeout, stream.read(&mut buf)).await {
                Ok(Ok(0)) => break, // EOF
                Ok(Ok(n)) => {
                    response.extend_from_slice(&buf[..n]);
                    if response.len() > MAX_RESPONSE_SIZE {
                        return Err(WhoislyError::WhoisError("Response too large".to_string()));
                    }
                }
                Ok(Err(e)) => {
                    return Err(WhoislyError::WhoisError(format!(
                        "Read from {} failed: {}",
                        addr, e
                    )));
                }
                Err(_) => {
                    // Timeout on read - if we have data, return it
                    if !response.is_empty() {
                        break;
                    }
                    return Err(WhoislyError::Timeout(format!("Read from {} timed out", addr)));
                }
            }
        }

        if response.is_empty() {
            return Err(WhoislyError::WhoisError(format!(
                "Empty response from {}",
                addr
            )));
        }

        Ok(decode_response(response))
    }
}

#[async_trait]
impl WhoisTransport for WhoisClient {
    #[instrument(skip(self, options), fields(name = %name))]
    async fn query(&self, name: &str, options: &LookupOptions) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WhoislyError::InvalidQuery("empty query".to_string()));
        }

        let mut server = match &options.server {
            Some(server) => server.to_lowercase(),
            None => default_server(name).to_string(),
        };
        debug!(server = %server, follow = options.follow, "Querying WHOIS server");

        let mut response = self.query_server(&server, name).await?;
        let mut visited = HashSet::from([server.clone()]);

        for depth in 0..options.follow {
            let referral = match extract_referral(&response) {
                Some(referral) if !visited.contains(&referral) => referral,
                _ => break,
            };
            debug!(from = %server, to = %referral, depth, "Following registrar referral");

            match self.query_server(&referral, name).await {
                Ok(next) => {
                    visited.insert(referral.clone());
                    server = referral;
                    response = next;
                }
                Err(e) => {
                    warn!(server = %referral, error = %e, "Registrar referral failed, keeping previous response");
                    break;
                }
            }
        }

        Ok(response)
    }
}

/// Server used when the caller pins none: the TLD table for domains, IANA otherwise.
fn default_server(name: &str) -> &'static str {
    extract_domain(name)
        .and_then(|domain| get_tld(&domain).and_then(get_whois_server))
        .unwrap_or(IANA_WHOIS_SERVER)
}

/// Finds the next server a registry response points at, if any.
fn extract_referral(response: &str) -> Option<String> {
    REFERRAL_PATTERNS.iter().find_map(|re| {
        let server = re
            .captures(response)?
            .get(1)?
            .as_str()
            .trim_end_matches('/')
            .to_lowercase();
        let host = server.split(':').next().unwrap_or(&server).to_string();
        host.contains('.').then_some(host)
    })
}

// Try UTF-8, fall back to Latin-1
fn decode_response(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&c| c as char).collect(),
    }
}
