//! Lookup orchestration: route the query, follow an IANA referral, parse.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, instrument, warn};

use crate::config::LookupConfig;
use crate::validation::extract_domain;
use crate::whois::parsers::ParserRegistry;
use crate::whois::{pinned_server, WhoisClient, WhoisRecord, WhoisTransport};

const IANA_MARKER: &str = "% IANA WHOIS server";
/// The root is consulted once; a referral found in the referred answer is not followed.
const MAX_IANA_HOPS: usize = 1;

static REFER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"refer:\s+(\S+)").expect("Invalid refer regex"));

/// Per-query instructions for the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupOptions {
    /// Server to ask; `None` leaves routing to the transport.
    pub server: Option<String>,
    /// Registrar referrals the transport may follow on its own.
    pub follow: u8,
}

impl LookupOptions {
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = Some(server.into());
        self
    }
}

/// Chooses the follow depth by query type and applies pinned suffix servers.
pub fn lookup_options(query: &str, config: &LookupConfig) -> LookupOptions {
    let follow = if extract_domain(query).is_some() {
        config.max_domain_follow
    } else {
        config.max_resource_follow
    };

    LookupOptions {
        server: pinned_server(query).map(String::from),
        follow,
    }
}

/// Envelope returned for every lookup; exactly one of `result` and `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupOutcome {
    pub status: bool,
    /// Seconds spent on the network, `0` when served from cache.
    pub time: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<WhoisRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
}

impl LookupOutcome {
    pub fn success(result: WhoisRecord, time: f64) -> Self {
        Self {
            status: true,
            time,
            result: Some(result),
            error: None,
            cached: None,
        }
    }

    pub fn failure(error: impl Into<String>, time: f64) -> Self {
        Self {
            status: false,
            time,
            result: None,
            error: Some(error.into()),
            cached: None,
        }
    }
}

/// Issues a query through a transport and turns the answer into a [`LookupOutcome`].
pub struct WhoisLookup<T: WhoisTransport> {
    transport: T,
    parsers: ParserRegistry,
    config: LookupConfig,
}

impl WhoisLookup<WhoisClient> {
    /// A lookup over TCP using the configured timeout.
    pub fn with_config(config: LookupConfig) -> Self {
        let client = WhoisClient::new().with_timeout(config.timeout);
        Self::new(client, config)
    }
}

impl<T: WhoisTransport> WhoisLookup<T> {
    pub fn new(transport: T, config: LookupConfig) -> Self {
        Self {
            transport,
            parsers: ParserRegistry::new(),
            config,
        }
    }

    pub fn with_parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = parsers;
        self
    }

    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Never fails: transport errors come back as `status: false` with the error text.
    #[instrument(skip(self), fields(query = %query))]
    pub async fn lookup(&self, query: &str) -> LookupOutcome {
        self.lookup_with(query, lookup_options(query, &self.config))
            .await
    }

    /// Like [`lookup`](Self::lookup) with caller-supplied options.
    pub async fn lookup_with(&self, query: &str, options: LookupOptions) -> LookupOutcome {
        let started = Instant::now();
        debug!(server = ?options.server, follow = options.follow, "Issuing WHOIS query");

        let raw = match self.transport.query(query, &options).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "WHOIS query failed");
                return LookupOutcome::failure(e.to_string(), started.elapsed().as_secs_f64());
            }
        };

        let raw = self.follow_iana_referral(query, &options, raw).await;
        let time = started.elapsed().as_secs_f64();

        LookupOutcome::success(self.parsers.parse(&raw, query), time)
    }

    async fn follow_iana_referral(&self, query: &str, options: &LookupOptions, raw: String) -> String {
        let mut raw = raw;

        for _ in 0..MAX_IANA_HOPS {
            let server = match iana_referral(&raw) {
                Some(server) => server,
                None => break,
            };
            debug!(server = %server, "Following IANA referral");

            let hop = options.clone().with_server(server.clone());
            match self.transport.query(query, &hop).await {
                Ok(referred) => raw = referred,
                Err(e) => {
                    warn!(server = %server, error = %e, "IANA referral failed, using root response");
                    break;
                }
            }
        }

        raw
    }
}

/// Extracts the referred server from an IANA root answer.
fn iana_referral(raw: &str) -> Option<String> {
    if !raw.contains(IANA_MARKER) || !raw.contains("refer:") {
        return None;
    }
    REFER_PATTERN
        .captures(raw)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
