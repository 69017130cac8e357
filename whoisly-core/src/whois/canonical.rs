//! Field canonicalization for free-text WHOIS responses.
//!
//! Registries disagree on nearly every key name, so each `key: value` line is
//! routed through two tiers:
//!
//! 1. An exact-key table mapping a lower-cased key to a field-update [`Rule`].
//! 2. A substring synonym pass that runs on every line afterwards and only fills
//!    fields nothing has populated yet.
//!
//! [`RecordBuilder`] records the [`Provenance`] of every scalar field so the
//! precedence between the two tiers does not depend on line order: an exact key
//! always replaces a synonym match, a synonym match never replaces anything.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use super::record::{StatusEntry, WhoisRecord};

static EPP_STATUS_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(client|server)[A-Z][a-z]+[A-Z][a-z]+").expect("Invalid EPP status regex")
});

const EMAIL_FORM_BOILERPLATE: &str = "Select Request Email Form at ";

/// Scalar fields of a [`WhoisRecord`] that the canonicalizer can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Domain,
    Registrar,
    RegistrarUrl,
    IanaId,
    WhoisServer,
    CreationDate,
    ExpirationDate,
    UpdatedDate,
    RegistrantOrganization,
    RegistrantProvince,
    RegistrantCountry,
    RegistrantPhone,
    RegistrantEmail,
    Dnssec,
    Cidr,
    InetNum,
    Inet6Num,
    NetRange,
    NetName,
    NetType,
    OriginAs,
}

impl Slot {
    const COUNT: usize = 21;

    fn field<'a>(&self, record: &'a mut WhoisRecord) -> &'a mut Option<String> {
        match self {
            Slot::Domain => &mut record.domain,
            Slot::Registrar => &mut record.registrar,
            Slot::RegistrarUrl => &mut record.registrar_url,
            Slot::IanaId => &mut record.iana_id,
            Slot::WhoisServer => &mut record.whois_server,
            Slot::CreationDate => &mut record.creation_date,
            Slot::ExpirationDate => &mut record.expiration_date,
            Slot::UpdatedDate => &mut record.updated_date,
            Slot::RegistrantOrganization => &mut record.registrant_organization,
            Slot::RegistrantProvince => &mut record.registrant_province,
            Slot::RegistrantCountry => &mut record.registrant_country,
            Slot::RegistrantPhone => &mut record.registrant_phone,
            Slot::RegistrantEmail => &mut record.registrant_email,
            Slot::Dnssec => &mut record.dnssec,
            Slot::Cidr => &mut record.cidr,
            Slot::InetNum => &mut record.inet_num,
            Slot::Inet6Num => &mut record.inet6_num,
            Slot::NetRange => &mut record.net_range,
            Slot::NetName => &mut record.net_name,
            Slot::NetType => &mut record.net_type,
            Slot::OriginAs => &mut record.origin_as,
        }
    }
}

/// Where the current value of a scalar field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provenance {
    #[default]
    Unset,
    /// Filled by a weak key: a substring synonym or a fill-only exact key.
    Synonym,
    /// Written by an exact key from the table.
    Exact,
}

/// Value transformation applied before a field is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Verbatim,
    Date,
    Phone,
    Email,
}

impl Transform {
    fn apply(self, value: &str) -> String {
        match self {
            Transform::Verbatim => value.to_string(),
            Transform::Date => normalize_date(value),
            Transform::Phone => normalize_phone(value),
            Transform::Email => normalize_email(value),
        }
    }
}

/// What a recognized key does to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Overwrites the field; the last matching line wins.
    Set(Slot, Transform),
    /// Writes the field only while it is still unset.
    Fill(Slot, Transform),
    /// Appends a status entry; `epp` forces the ICANN glossary link.
    Status { epp: bool },
    /// Appends a name server.
    NameServer,
}

/// Looks up the rule for an exact, lower-cased key.
pub fn exact_rule(key: &str) -> Option<Rule> {
    use Transform::*;

    let rule = match key {
        "domain name" => Rule::Set(Slot::Domain, Verbatim),
        "registrar" => Rule::Set(Slot::Registrar, Verbatim),
        "registrar url" => Rule::Set(Slot::RegistrarUrl, Verbatim),
        "iana id" | "registrar iana id" => Rule::Set(Slot::IanaId, Verbatim),
        "whois server" | "whois" | "registrar whois server" => {
            Rule::Set(Slot::WhoisServer, Verbatim)
        }
        "updated date" | "changed" => Rule::Set(Slot::UpdatedDate, Date),
        "creation date" | "domain name commencement date" => Rule::Set(Slot::CreationDate, Date),
        "expiration date" | "registrar registration expiration date" | "registry expiry date" => {
            Rule::Set(Slot::ExpirationDate, Date)
        }
        "status" | "domain status" => Rule::Status { epp: false },
        "eppstatus" | "epp status" => Rule::Status { epp: true },
        "name server" | "nameservers" | "nserver" => Rule::NameServer,
        "registrant name"
        | "registrant organization"
        | "organization"
        | "organisation"
        | "org-name"
        | "registrant" => Rule::Set(Slot::RegistrantOrganization, Verbatim),
        "descr" => Rule::Fill(Slot::RegistrantOrganization, Verbatim),
        "registrant state/province" | "city" => Rule::Set(Slot::RegistrantProvince, Verbatim),
        "registrant country" | "country" => Rule::Set(Slot::RegistrantCountry, Verbatim),
        "registrant phone" | "registrar abuse contact phone" => {
            Rule::Set(Slot::RegistrantPhone, Phone)
        }
        "orgtechphone" => Rule::Set(Slot::RegistrantPhone, Verbatim),
        "registrant email" => Rule::Set(Slot::RegistrantEmail, Email),
        "email" => Rule::Set(Slot::RegistrantEmail, Verbatim),
        "e-mail" => Rule::Fill(Slot::RegistrantEmail, Verbatim),
        "dnssec" => Rule::Set(Slot::Dnssec, Verbatim),
        "cidr" => Rule::Set(Slot::Cidr, Verbatim),
        "inetnum" => Rule::Set(Slot::InetNum, Verbatim),
        "inet6num" => Rule::Set(Slot::Inet6Num, Verbatim),
        "netrange" => Rule::Set(Slot::NetRange, Verbatim),
        "netname" | "network-name" => Rule::Set(Slot::NetName, Verbatim),
        "nettype" => Rule::Set(Slot::NetType, Verbatim),
        "originas" | "origin" => Rule::Set(Slot::OriginAs, Verbatim),
        _ => return None,
    };

    Some(rule)
}

struct SynonymGroup {
    slot: Slot,
    terms: &'static [&'static str],
    transform: Transform,
}

/// Substring synonyms, checked in order. The first group whose term occurs in
/// the key and whose field is still unset receives the value.
static SYNONYM_GROUPS: &[SynonymGroup] = &[
    SynonymGroup {
        slot: Slot::Domain,
        terms: &["domain name"],
        transform: Transform::Verbatim,
    },
    SynonymGroup {
        slot: Slot::Registrar,
        terms: &["registrar"],
        transform: Transform::Verbatim,
    },
    SynonymGroup {
        slot: Slot::RegistrantEmail,
        terms: &["contact email"],
        transform: Transform::Verbatim,
    },
    SynonymGroup {
        slot: Slot::RegistrantPhone,
        terms: &["contact phone"],
        transform: Transform::Verbatim,
    },
    SynonymGroup {
        slot: Slot::CreationDate,
        terms: &[
            "creation",
            "created",
            "created date",
            "registration time",
            "registered",
            "commencement",
        ],
        transform: Transform::Date,
    },
    SynonymGroup {
        slot: Slot::ExpirationDate,
        terms: &["expiration", "expiry", "expire", "expire date"],
        transform: Transform::Date,
    },
    SynonymGroup {
        slot: Slot::UpdatedDate,
        terms: &["updated", "update", "last update", "last updated", "last-modified"],
        transform: Transform::Date,
    },
    SynonymGroup {
        slot: Slot::RegistrantOrganization,
        terms: &["account name", "registrant org"],
        transform: Transform::Verbatim,
    },
];

/// Splits a trimmed line into a lower-cased key and its value.
///
/// The value keeps any further colons (URLs, phone prefixes). Lines of the form
/// `Network:Key: value` drop the leading `Network` segment first.
pub fn split_line(line: &str) -> Option<(String, String)> {
    let mut segments: Vec<&str> = line.split(':').collect();
    if segments.len() < 2 {
        return None;
    }
    if segments.len() >= 3 && segments[0].trim().eq_ignore_ascii_case("network") {
        segments.remove(0);
    }

    let key = segments[0].trim().to_lowercase();
    let value = segments[1..].join(":").trim().to_string();
    Some((key, value))
}

/// Converts a registry date to RFC 3339 UTC, or returns the input unchanged.
pub fn normalize_date(value: &str) -> String {
    match parse_date(value) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        None => value.to_string(),
    }
}

fn parse_date(date_str: &str) -> Option<DateTime<Utc>> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    let offset_formats = [
        "%Y-%m-%dT%H:%M:%S%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%d %H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S %z",
    ];
    for fmt in &offset_formats {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let cleaned = trimmed
        .replace(" (UTC)", "")
        .replace(" UTC", "")
        .replace(" GMT", "");
    let cleaned = cleaned.trim_end_matches('Z');

    let datetime_formats = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S",
        "%Y.%m.%d %H:%M:%S",
        "%d.%m.%Y %H:%M:%S",
        "%d-%b-%Y %H:%M:%S",
    ];
    for fmt in &datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cleaned, fmt) {
            return Some(dt.and_utc());
        }
    }

    let date_formats = [
        "%Y-%m-%d",
        "%Y.%m.%d",
        "%Y/%m/%d",
        "%d-%b-%Y",
        "%d-%B-%Y",
        "%d %B %Y",
        "%d %b %Y",
        "%d.%m.%Y",
        "%d/%m/%Y",
        "%b %d %Y",
    ];
    for fmt in &date_formats {
        if let Ok(d) = NaiveDate::parse_from_str(cleaned, fmt) {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}

/// Splits a status value into its token and explanatory remainder.
///
/// EPP-shaped tokens, and any token from an EPP-flagged key, always link to the
/// ICANN glossary; otherwise the remainder (parentheses removed) is the link.
pub fn analyze_status(value: &str, epp_flagged: bool) -> StatusEntry {
    let (code, rest) = match value.split_once(' ') {
        Some((code, rest)) => (code, rest.trim_start()),
        None => (value, ""),
    };

    if epp_flagged || EPP_STATUS_CODE.is_match(code) {
        return StatusEntry::epp(code);
    }

    let url = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or(rest);
    StatusEntry::new(code, url)
}

/// Drops a leading `tel:` and turns the country-code dot into a space.
pub fn normalize_phone(value: &str) -> String {
    let value = value.strip_prefix("tel:").unwrap_or(value).trim_start();
    value.replacen('.', " ", 1)
}

pub fn normalize_email(value: &str) -> String {
    value.replacen(EMAIL_FORM_BOILERPLATE, "", 1).trim().to_string()
}

/// Accumulates canonicalized lines into a [`WhoisRecord`].
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    record: WhoisRecord,
    provenance: [Provenance; Slot::COUNT],
}

impl RecordBuilder {
    pub fn new(raw: &str) -> Self {
        Self {
            record: WhoisRecord::empty(raw),
            provenance: [Provenance::Unset; Slot::COUNT],
        }
    }

    pub fn provenance(&self, slot: Slot) -> Provenance {
        self.provenance[slot as usize]
    }

    /// Canonicalizes one trimmed line; lines without a key are ignored.
    pub fn apply_line(&mut self, line: &str) {
        if let Some((key, value)) = split_line(line) {
            self.apply(&key, &value);
        }
    }

    /// Applies the exact-key rule for `key`, then the synonym pass.
    pub fn apply(&mut self, key: &str, value: &str) {
        if let Some(rule) = exact_rule(key) {
            self.apply_rule(rule, value);
        }
        self.apply_synonyms(key, value);
    }

    fn apply_rule(&mut self, rule: Rule, value: &str) {
        match rule {
            Rule::Set(slot, transform) => {
                self.commit(slot, transform.apply(value), Provenance::Exact)
            }
            Rule::Fill(slot, transform) => {
                self.commit(slot, transform.apply(value), Provenance::Synonym)
            }
            Rule::Status { epp } => {
                if !value.is_empty() {
                    self.record.status.push(analyze_status(value, epp));
                }
            }
            Rule::NameServer => {
                if !value.is_empty() {
                    self.record.name_servers.push(value.to_string());
                }
            }
        }
    }

    fn apply_synonyms(&mut self, key: &str, value: &str) {
        let group = SYNONYM_GROUPS.iter().find(|group| {
            self.provenance(group.slot) == Provenance::Unset
                && group.terms.iter().any(|term| key.contains(term))
        });

        if let Some(group) = group {
            self.commit(group.slot, group.transform.apply(value), Provenance::Synonym);
        }
    }

    /// Writes `value` into `slot` if `tier` is allowed to replace what is there.
    pub fn commit(&mut self, slot: Slot, value: String, tier: Provenance) {
        if value.is_empty() {
            return;
        }
        let current = self.provenance(slot);
        let allowed = match tier {
            Provenance::Exact => true,
            Provenance::Synonym => current == Provenance::Unset,
            Provenance::Unset => false,
        };
        if allowed {
            *slot.field(&mut self.record) = Some(value);
            self.provenance[slot as usize] = tier;
        }
    }

    pub fn record_mut(&mut self) -> &mut WhoisRecord {
        &mut self.record
    }

    pub fn finish(self) -> WhoisRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(lines: &[&str]) -> WhoisRecord {
        let mut builder = RecordBuilder::new("");
        for line in lines {
            builder.apply_line(line);
        }
        builder.finish()
    }

    #[test]
    fn test_split_line_keeps_colons_in_value() {
        assert_eq!(
            split_line("Registrar URL: http://www.example.com:8080"),
            Some((
                "registrar url".to_string(),
                "http://www.example.com:8080".to_string()
            ))
        );
        assert_eq!(split_line("no delimiter here"), None);
    }

    #[test]
    fn test_split_line_strips_network_prefix() {
        assert_eq!(
            split_line("Network:NetName: FOO"),
            Some(("netname".to_string(), "FOO".to_string()))
        );
        // Two segments only: "network" stays the key
        assert_eq!(
            split_line("Network: 192.0.2.0/24"),
            Some(("network".to_string(), "192.0.2.0/24".to_string()))
        );
    }

    #[test]
    fn test_normalize_date_iso_passthrough() {
        assert_eq!(normalize_date("2001-09-15T00:00:00Z"), "2001-09-15T00:00:00Z");
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("2020-01-15"), "2020-01-15T00:00:00Z");
        assert_eq!(normalize_date("15-Jan-2020"), "2020-01-15T00:00:00Z");
        assert_eq!(normalize_date("2003-03-17 12:20:05"), "2003-03-17T12:20:05Z");
        assert_eq!(
            normalize_date("2023-01-15T10:30:00+01:00"),
            "2023-01-15T09:30:00Z"
        );
        assert_eq!(normalize_date("2019-04-01 08:00:00 UTC"), "2019-04-01T08:00:00Z");
        assert_eq!(
            normalize_date("1997-09-15T04:00:00.123Z"),
            "1997-09-15T04:00:00.123Z"
        );
    }

    #[test]
    fn test_normalize_date_keeps_unparseable_text() {
        assert_eq!(normalize_date("not-a-date"), "not-a-date");
        assert_eq!(normalize_date("before 1995"), "before 1995");
        assert_eq!(normalize_date(""), "");
    }

    #[test]
    fn test_analyze_status_epp_shape() {
        let entry = analyze_status(
            "clientTransferProhibited https://www.icann.org/epp#clientTransferProhibited",
            false,
        );
        assert_eq!(entry.status, "clientTransferProhibited");
        assert_eq!(entry.url, "https://icann.org/epp#clientTransferProhibited");
    }

    #[test]
    fn test_analyze_status_parenthesized_remainder() {
        let entry = analyze_status("ok (some text)", false);
        assert_eq!(entry, StatusEntry::new("ok", "some text"));

        let bare = analyze_status("active", false);
        assert_eq!(bare, StatusEntry::new("active", ""));
    }

    #[test]
    fn test_analyze_status_epp_flag_forces_glossary() {
        let entry = analyze_status("ok https://registry.example/status", true);
        assert_eq!(entry, StatusEntry::epp("ok"));
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("tel:+1.5555551234"), "+1 5555551234");
        assert_eq!(normalize_phone("+44.2071234567"), "+44 2071234567");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(
            normalize_email("Select Request Email Form at https://example.com/contact"),
            "https://example.com/contact"
        );
        assert_eq!(normalize_email("admin@example.com"), "admin@example.com");
    }

    #[test]
    fn test_exact_rule_table() {
        assert_eq!(
            exact_rule("registry expiry date"),
            Some(Rule::Set(Slot::ExpirationDate, Transform::Date))
        );
        assert_eq!(exact_rule("epp status"), Some(Rule::Status { epp: true }));
        assert_eq!(exact_rule("nserver"), Some(Rule::NameServer));
        assert_eq!(
            exact_rule("descr"),
            Some(Rule::Fill(Slot::RegistrantOrganization, Transform::Verbatim))
        );
        assert_eq!(exact_rule("favourite colour"), None);
    }

    #[test]
    fn test_last_exact_key_wins() {
        let record = build(&["Registrant: Alice Corp", "Organization: Bob Inc"]);
        assert_eq!(record.registrant_organization.as_deref(), Some("Bob Inc"));
    }

    #[test]
    fn test_synonym_never_replaces_exact() {
        let record = build(&["Registrant: Alice Corp", "Account Name: Bob Inc"]);
        assert_eq!(record.registrant_organization.as_deref(), Some("Alice Corp"));
    }

    #[test]
    fn test_exact_replaces_earlier_synonym() {
        let mut builder = RecordBuilder::new("");
        builder.apply_line("Tech Contact Email: tech@example.com");
        assert_eq!(builder.provenance(Slot::RegistrantEmail), Provenance::Synonym);

        builder.apply_line("Email: owner@example.com");
        assert_eq!(builder.provenance(Slot::RegistrantEmail), Provenance::Exact);
        assert_eq!(
            builder.finish().registrant_email.as_deref(),
            Some("owner@example.com")
        );
    }

    #[test]
    fn test_fill_only_keys() {
        let record = build(&["Organization: Example Org", "descr: Some description"]);
        assert_eq!(record.registrant_organization.as_deref(), Some("Example Org"));

        let record = build(&["descr: First", "descr: Second"]);
        assert_eq!(record.registrant_organization.as_deref(), Some("First"));

        let record = build(&["e-mail: first@example.com", "e-mail: second@example.com"]);
        assert_eq!(record.registrant_email.as_deref(), Some("first@example.com"));
    }

    #[test]
    fn test_synonym_dates() {
        let record = build(&[
            "Registration Time: 2003-03-17 12:20:05",
            "Expire Date: 2030-03-17",
            "Last-Modified: 2024-02-01",
        ]);
        assert_eq!(record.creation_date.as_deref(), Some("2003-03-17T12:20:05Z"));
        assert_eq!(record.expiration_date.as_deref(), Some("2030-03-17T00:00:00Z"));
        assert_eq!(record.updated_date.as_deref(), Some("2024-02-01T00:00:00Z"));
    }

    #[test]
    fn test_empty_values_do_not_commit() {
        let record = build(&["Registrant Organization:", "Name Server:", "Domain Status:"]);
        assert!(record.registrant_organization.is_none());
        assert!(record.name_servers.is_empty());
        assert!(record.status.is_empty());
    }

    #[test]
    fn test_network_registry_keys() {
        let record = build(&[
            "NetRange:       192.0.2.0 - 192.0.2.255",
            "CIDR:           192.0.2.0/24",
            "NetName:        EXAMPLE-NET",
            "NetType:        Direct Allocation",
            "OriginAS:       AS64496",
            "OrgTechPhone:   +1-555-555-0100",
        ]);
        assert_eq!(record.net_range.as_deref(), Some("192.0.2.0 - 192.0.2.255"));
        assert_eq!(record.cidr.as_deref(), Some("192.0.2.0/24"));
        assert_eq!(record.net_name.as_deref(), Some("EXAMPLE-NET"));
        assert_eq!(record.net_type.as_deref(), Some("Direct Allocation"));
        assert_eq!(record.origin_as.as_deref(), Some("AS64496"));
        assert_eq!(record.registrant_phone.as_deref(), Some("+1-555-555-0100"));
    }
}
