//! Parser for .de domains (DENIC format).
//!
//! DENIC uses its own key names and groups contact data into bracketed
//! sections. The generic pass already understands `Status:` and `Changed:`;
//! this parser adds the rest.
//!
//! Example DENIC response:
//! ```text
//! Domain: example.de
//! Nserver: ns1.example.de 192.0.2.1
//! Nserver: ns2.example.de
//! Status: connect
//! Changed: 2023-01-15T10:30:00+01:00
//!
//! [Holder]
//! Name: Max Mustermann
//! CountryCode: DE
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use super::RegistryParser;
use crate::whois::canonical::{Provenance, Slot};
use crate::whois::parser::{canonicalize, finish};
use crate::whois::record::WhoisRecord;

static DOMAIN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Domain:\s*(.+)$").expect("Invalid DENIC domain regex"));

static NSERVER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Nserver:\s*(.+)$").expect("Invalid DENIC nserver regex"));

static SECTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[(.+)\]$").expect("Invalid DENIC section regex"));

static CONTACT_FIELD_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(Name|Organisation|City|CountryCode):\s*(.+)$")
        .expect("Invalid DENIC contact field regex")
});

static DNSKEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^Dnskey:\s*\S").expect("Invalid DENIC dnskey regex"));

/// Parser for .de domains using the DENIC format.
#[derive(Debug, Clone, Default)]
pub struct DenicParser;

impl DenicParser {
    pub fn new() -> Self {
        Self
    }
}

impl RegistryParser for DenicParser {
    fn supported_tlds(&self) -> &[&str] {
        &["de"]
    }

    fn parse(&self, raw: &str, _query: &str) -> WhoisRecord {
        let mut builder = canonicalize(raw);
        let mut nameservers = Vec::new();
        let mut in_holder_section = false;

        for line in raw.lines() {
            let line = line.trim();

            if line.is_empty() {
                in_holder_section = false;
                continue;
            }

            if let Some(caps) = SECTION_PATTERN.captures(line) {
                in_holder_section = caps[1].eq_ignore_ascii_case("holder");
                continue;
            }

            if let Some(caps) = DOMAIN_PATTERN.captures(line) {
                builder.commit(Slot::Domain, caps[1].trim().to_string(), Provenance::Exact);
            }

            // DENIC may include glue addresses after the hostname
            if let Some(caps) = NSERVER_PATTERN.captures(line) {
                if let Some(ns) = caps[1].split_whitespace().next() {
                    nameservers.push(ns.to_string());
                }
            }

            if DNSKEY_PATTERN.is_match(line) {
                builder.commit(
                    Slot::Dnssec,
                    "signedDelegation".to_string(),
                    Provenance::Exact,
                );
            }

            if in_holder_section {
                if let Some(caps) = CONTACT_FIELD_PATTERN.captures(line) {
                    let value = caps[2].trim().to_string();
                    let slot = match caps[1].to_lowercase().as_str() {
                        "city" => Slot::RegistrantProvince,
                        "countrycode" => Slot::RegistrantCountry,
                        _ => Slot::RegistrantOrganization,
                    };
                    builder.commit(slot, value, Provenance::Exact);
                }
            }
        }

        if !nameservers.is_empty() {
            builder.record_mut().name_servers = nameservers;
        }

        finish(builder)
    }
}
