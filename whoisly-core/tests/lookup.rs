use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use whoisly_core::whois::parse_generic;
use whoisly_core::{
    clean_query, CacheStore, CachedLookup, LookupConfig, LookupOptions, MemoryStore, Result,
    WhoisLookup, WhoisTransport, WhoislyError,
};

const IANA_ROOT: &str = "\
% IANA WHOIS server
% for more information on IANA, visit http://www.iana.org
% This query returned 1 object

refer:        whois.example-registry.net

domain:       EXAMPLE
organisation: Example Registry Services
status:       ACTIVE
";

const REGISTRY: &str = "\
Domain Name: EXAMPLE.EXAMPLE
Registrar: Example Registrar, Inc.
Registrar URL: http://www.example-registrar.com
Creation Date: 2001-09-15T00:00:00Z
Registry Expiry Date: not-a-date
Status: clientTransferProhibited
Status: ok (some text)
EPPStatus: clientTransferProhibited
Name Server: NS1.EXAMPLE.EXAMPLE
Name Server: NS1.EXAMPLE.EXAMPLE
";

/// Scripted transport: the root answer for default routing, the registry
/// answer (or an error) for the referred server.
struct ScriptedTransport {
    referred_fails: bool,
    servers: Mutex<Vec<Option<String>>>,
    names: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn new(referred_fails: bool) -> Self {
        Self {
            referred_fails,
            servers: Mutex::new(Vec::new()),
            names: Mutex::new(Vec::new()),
        }
    }

    fn names(&self) -> Vec<String> {
        self.names.lock().unwrap().clone()
    }

    fn servers(&self) -> Vec<Option<String>> {
        self.servers.lock().unwrap().clone()
    }
}

#[async_trait]
impl WhoisTransport for ScriptedTransport {
    async fn query(&self, name: &str, options: &LookupOptions) -> Result<String> {
        self.names.lock().unwrap().push(name.to_string());
        self.servers.lock().unwrap().push(options.server.clone());
        match options.server.as_deref() {
            None => Ok(IANA_ROOT.to_string()),
            Some(_) if self.referred_fails => {
                Err(WhoislyError::Timeout("Read timed out".to_string()))
            }
            Some(_) => Ok(REGISTRY.to_string()),
        }
    }
}

#[tokio::test]
async fn referral_is_followed_once_and_result_is_normalized() {
    let lookup = WhoisLookup::new(ScriptedTransport::new(false), LookupConfig::default());

    let outcome = lookup.lookup("example.example").await;

    assert_eq!(
        lookup.transport().servers(),
        vec![None, Some("whois.example-registry.net".to_string())]
    );
    assert!(outcome.status);

    let record = outcome.result.unwrap();
    assert_eq!(record.registrar.as_deref(), Some("Example Registrar, Inc."));
    assert_eq!(record.creation_date.as_deref(), Some("2001-09-15T00:00:00Z"));
    assert_eq!(record.expiration_date.as_deref(), Some("not-a-date"));
    assert_eq!(record.name_servers.len(), 2);

    let statuses: Vec<(&str, &str)> = record
        .status
        .iter()
        .map(|s| (s.status.as_str(), s.url.as_str()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (
                "clientTransferProhibited",
                "https://icann.org/epp#clientTransferProhibited"
            ),
            ("ok", "some text"),
        ]
    );
}

#[tokio::test]
async fn failed_referral_keeps_root_answer() {
    let lookup = WhoisLookup::new(ScriptedTransport::new(true), LookupConfig::default());

    let outcome = lookup.lookup("example.example").await;

    assert!(outcome.status);
    assert_eq!(outcome.result.unwrap(), parse_generic(IANA_ROOT));
    assert_eq!(lookup.transport().servers().len(), 2);
}

#[tokio::test]
async fn second_lookup_is_served_from_cache() {
    let store = Arc::new(MemoryStore::new());
    let cached = CachedLookup::new(
        WhoisLookup::new(ScriptedTransport::new(false), LookupConfig::default()),
        Arc::clone(&store),
    );

    let first = cached.lookup("example.example").await;
    assert_eq!(first.cached, Some(false));
    assert!(store.get("whois:example.example").await.unwrap().is_some());

    let second = cached.lookup("example.example").await;
    assert_eq!(second.cached, Some(true));
    assert_eq!(second.time, 0.0);
    assert_eq!(second.result, first.result);

    // Only the first call reached the transport (root plus one referral)
    assert_eq!(cached.inner().transport().servers().len(), 2);

    // Keys are case-sensitive
    let upper = cached.lookup("EXAMPLE.example").await;
    assert_eq!(upper.cached, Some(false));
}

#[tokio::test]
async fn cleaned_spellings_share_one_cache_entry() {
    let store = Arc::new(MemoryStore::new());
    let cached = CachedLookup::new(
        WhoisLookup::new(ScriptedTransport::new(false), LookupConfig::default()),
        Arc::clone(&store),
    );

    let url = clean_query("https://www.Example.com/path");
    assert_eq!(url, "example.com");

    let first = cached.lookup(&url).await;
    assert_eq!(first.cached, Some(false));
    assert!(store.get("whois:example.com").await.unwrap().is_some());

    let second = cached.lookup(&clean_query("  EXAMPLE.COM. ")).await;
    assert_eq!(second.cached, Some(true));

    // Both transport calls carried the cleaned name
    let names = cached.inner().transport().names();
    assert_eq!(names, vec!["example.com".to_string(), "example.com".to_string()]);
}

#[test]
fn parser_is_total_and_deterministic() {
    let inputs = [
        "",
        "no colons at all",
        ":::",
        "\u{0}\u{1}binary:\u{fffd}",
        REGISTRY,
        "Network:ID: irrelevant\nNetwork:NetName: FOO",
    ];

    for raw in inputs {
        let first = parse_generic(raw);
        assert_eq!(first, parse_generic(raw));
        assert_eq!(first.raw_whois_content, raw);

        let json = serde_json::to_value(&first).unwrap();
        for (name, _) in first.scalar_fields() {
            assert!(json[name].is_string(), "{} missing for {:?}", name, raw);
        }
    }

    assert_eq!(
        parse_generic("Network:ID: irrelevant\nNetwork:NetName: FOO").net_name.as_deref(),
        Some("FOO")
    );
}
