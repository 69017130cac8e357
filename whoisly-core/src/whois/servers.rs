use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Root server; it answers every query with a `refer:` line when it is not authoritative.
pub const IANA_WHOIS_SERVER: &str = "whois.iana.org";

/// Default servers for common TLDs, saving the round trip through IANA.
pub static WHOIS_SERVERS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();

    m.insert("com", "whois.verisign-grs.com");
    m.insert("net", "whois.verisign-grs.com");
    m.insert("org", "whois.pir.org");
    m.insert("info", "whois.nic.info");
    m.insert("biz", "whois.nic.biz");
    m.insert("app", "whois.nic.google");
    m.insert("dev", "whois.nic.google");
    m.insert("io", "whois.nic.io");
    m.insert("co", "whois.nic.co");
    m.insert("me", "whois.nic.me");
    m.insert("cc", "ccwhois.verisign-grs.com");
    m.insert("tv", "tvwhois.verisign-grs.com");
    m.insert("xyz", "whois.nic.xyz");
    m.insert("ai", "whois.nic.ai");
    m.insert("de", "whois.denic.de");
    m.insert("uk", "whois.nic.uk");
    m.insert("cn", "whois.cnnic.cn");
    m.insert("jp", "whois.jprs.jp");
    m.insert("eu", "whois.eu");
    m.insert("nl", "whois.domain-registry.nl");

    m
});

/// Suffixes whose default registry server routes incorrectly, pinned to the
/// server that actually answers for them.
static PINNED_SUFFIX_SERVERS: &[(&str, &str)] = &[
    (".ing", "whois.nic.google"),
    (".page", "whois.nic.google"),
    (".new", "whois.nic.google"),
    (".shop", "whois.nic.shop"),
];

pub fn get_whois_server(tld: &str) -> Option<&'static str> {
    WHOIS_SERVERS.get(tld.to_lowercase().as_str()).copied()
}

pub fn get_tld(domain: &str) -> Option<&str> {
    domain.rsplit_once('.').map(|(_, tld)| tld)
}

/// Returns the pinned server when `query` ends with one of the pinned suffixes.
pub fn pinned_server(query: &str) -> Option<&'static str> {
    let query = query.trim().trim_end_matches('.').to_lowercase();
    PINNED_SUFFIX_SERVERS
        .iter()
        .find(|(suffix, _)| query.ends_with(suffix))
        .map(|(_, server)| *server)
}
