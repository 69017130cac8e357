//! Parser for .uk domains (Nominet format).
//!
//! Nominet uses a section-based format: a header line ending in a colon,
//! followed by the values indented underneath it.
//!
//! Example Nominet response:
//! ```text
//! Domain name:
//!     example.co.uk
//!
//! Registrar:
//!     Example Registrar Ltd [Tag = EXAMPLE]
//!     URL: https://registrar.example
//!
//! Name servers:
//!     ns1.example.co.uk
//!     ns2.example.co.uk
//! ```
//!
//! Inline dates such as `Registered on: 01-January-2020` are already handled
//! by the generic synonym pass.

use once_cell::sync::Lazy;
use regex::Regex;

use super::RegistryParser;
use crate::whois::canonical::{normalize_date, Provenance, Slot};
use crate::whois::parser::{canonicalize, finish};
use crate::whois::record::{StatusEntry, WhoisRecord};

static SECTION_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][A-Za-z' ]*):\s*$").expect("Invalid Nominet section regex")
});

static REGISTRAR_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*\[Tag = [^\]]*\]").expect("Invalid Nominet tag regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Domain,
    Registrant,
    Registrar,
    RegistrationDate,
    ExpiryDate,
    LastUpdated,
    NameServers,
    Status,
    Dnssec,
    Other,
}

impl Section {
    fn from_header(header: &str) -> Self {
        match header.to_lowercase().as_str() {
            "domain name" => Section::Domain,
            "registrant" => Section::Registrant,
            "registrar" => Section::Registrar,
            "registration date" => Section::RegistrationDate,
            "expiry date" => Section::ExpiryDate,
            "last updated" => Section::LastUpdated,
            "name servers" => Section::NameServers,
            "registration status" => Section::Status,
            "dnssec" => Section::Dnssec,
            _ => Section::Other,
        }
    }
}

/// Parser for .uk domains using the Nominet format.
#[derive(Debug, Clone, Default)]
pub struct NominetParser;

impl NominetParser {
    pub fn new() -> Self {
        Self
    }
}

impl RegistryParser for NominetParser {
    fn supported_tlds(&self) -> &[&str] {
        &[
            "uk", "co.uk", "org.uk", "me.uk", "ltd.uk", "plc.uk", "net.uk", "sch.uk",
        ]
    }

    fn parse(&self, raw: &str, _query: &str) -> WhoisRecord {
        let mut builder = canonicalize(raw);
        let mut nameservers = Vec::new();
        let mut statuses = Vec::new();
        // Current section and the indentation of its header line
        let mut current: Option<(Section, usize)> = None;

        for line in raw.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                current = None;
                continue;
            }
            let indent = line.len() - line.trim_start().len();

            if let Some(caps) = SECTION_HEADER.captures(trimmed) {
                current = Some((Section::from_header(&caps[1]), indent));
                continue;
            }

            let section = match current {
                Some((section, header_indent)) if indent > header_indent => section,
                _ => {
                    current = None;
                    continue;
                }
            };

            match section {
                Section::Domain => {
                    builder.commit(Slot::Domain, trimmed.to_string(), Provenance::Exact);
                }
                // The first line is the holder's name
                Section::Registrant => {
                    if !is_redacted(trimmed) {
                        builder.commit(
                            Slot::RegistrantOrganization,
                            trimmed.to_string(),
                            Provenance::Synonym,
                        );
                    }
                }
                Section::Registrar => {
                    if let Some(url) = trimmed.strip_prefix("URL:") {
                        builder.commit(Slot::RegistrarUrl, url.trim().to_string(), Provenance::Exact);
                    } else {
                        let name = REGISTRAR_TAG.replace(trimmed, "").trim().to_string();
                        builder.commit(Slot::Registrar, name, Provenance::Exact);
                    }
                }
                Section::RegistrationDate => {
                    builder.commit(Slot::CreationDate, normalize_date(trimmed), Provenance::Exact);
                }
                Section::ExpiryDate => {
                    builder.commit(Slot::ExpirationDate, normalize_date(trimmed), Provenance::Exact);
                }
                Section::LastUpdated => {
                    builder.commit(Slot::UpdatedDate, normalize_date(trimmed), Provenance::Exact);
                }
                Section::NameServers => {
                    if let Some(ns) = trimmed.split_whitespace().next() {
                        nameservers.push(ns.to_string());
                    }
                }
                Section::Status => statuses.push(StatusEntry::new(trimmed, "")),
                Section::Dnssec => {
                    builder.commit(Slot::Dnssec, trimmed.to_string(), Provenance::Exact);
                }
                Section::Other => {}
            }
        }

        let record = builder.record_mut();
        if !nameservers.is_empty() {
            record.name_servers = nameservers;
        }
        record.status.extend(statuses);

        finish(builder)
    }
}

/// Checks if a value is a privacy/redaction placeholder.
fn is_redacted(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower.contains("redacted")
        || lower.contains("data protected")
        || lower.contains("not disclosed")
        || lower.contains("withheld")
}
