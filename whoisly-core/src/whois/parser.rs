use super::canonical::RecordBuilder;
use super::record::WhoisRecord;
use super::status::dedup_statuses;

/// Runs every trimmed, non-empty line of `raw` through the canonicalizer.
///
/// Registry-specific parsers start from this builder and overlay their own
/// fields before calling [`finish`].
pub fn canonicalize(raw: &str) -> RecordBuilder {
    let mut builder = RecordBuilder::new(raw);
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .for_each(|line| builder.apply_line(line));
    builder
}

/// Finalizes a builder: status entries are ordered and de-duplicated.
pub fn finish(builder: RecordBuilder) -> WhoisRecord {
    let mut record = builder.finish();
    record.status = dedup_statuses(std::mem::take(&mut record.status));
    record
}

/// Parses raw WHOIS text into a [`WhoisRecord`].
///
/// Never fails: text without recognizable lines yields a record whose scalar
/// fields are all absent, with the input kept in `raw_whois_content`.
pub fn parse_generic(raw: &str) -> WhoisRecord {
    finish(canonicalize(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::whois::record::StatusEntry;

    const VERISIGN_SAMPLE: &str = r#"
   Domain Name: EXAMPLE.COM
   Registry Domain ID: 2336799_DOMAIN_COM-VRSN
   Registrar WHOIS Server: whois.iana.org
   Registrar URL: http://res-dom.iana.org
   Updated Date: 2024-08-14T07:01:34Z
   Creation Date: 1995-08-14T04:00:00Z
   Registry Expiry Date: 2025-08-13T04:00:00Z
   Registrar: RESERVED-Internet Assigned Numbers Authority
   Registrar IANA ID: 376
   Domain Status: clientDeleteProhibited https://icann.org/epp#clientDeleteProhibited
   Domain Status: clientTransferProhibited https://icann.org/epp#clientTransferProhibited
   Name Server: A.IANA-SERVERS.NET
   Name Server: B.IANA-SERVERS.NET
   DNSSEC: signedDelegation
>>> Last update of whois database: 2024-10-01T12:00:00Z <<<
"#;

    #[test]
    fn test_parse_verisign_style_response() {
        let record = parse_generic(VERISIGN_SAMPLE);

        assert_eq!(record.domain.as_deref(), Some("EXAMPLE.COM"));
        assert_eq!(
            record.registrar.as_deref(),
            Some("RESERVED-Internet Assigned Numbers Authority")
        );
        assert_eq!(record.registrar_url.as_deref(), Some("http://res-dom.iana.org"));
        assert_eq!(record.whois_server.as_deref(), Some("whois.iana.org"));
        assert_eq!(record.iana_id.as_deref(), Some("376"));
        assert_eq!(record.creation_date.as_deref(), Some("1995-08-14T04:00:00Z"));
        assert_eq!(record.updated_date.as_deref(), Some("2024-08-14T07:01:34Z"));
        assert_eq!(record.expiration_date.as_deref(), Some("2025-08-13T04:00:00Z"));
        assert_eq!(record.dnssec.as_deref(), Some("signedDelegation"));
        assert_eq!(
            record.name_servers,
            vec!["A.IANA-SERVERS.NET", "B.IANA-SERVERS.NET"]
        );
        assert_eq!(record.status.len(), 2);
        assert_eq!(record.raw_whois_content, VERISIGN_SAMPLE);
    }

    #[test]
    fn test_status_ordering_and_dedup() {
        let raw = "Status: clientTransferProhibited\nStatus: ok (some text)\nEPPStatus: clientTransferProhibited";
        let record = parse_generic(raw);

        assert_eq!(
            record.status,
            vec![
                StatusEntry::epp("clientTransferProhibited"),
                StatusEntry::new("ok", "some text"),
            ]
        );
    }

    #[test]
    fn test_network_prefixed_lines() {
        let record = parse_generic("Network:ID: irrelevant\nNetwork:NetName: FOO");
        assert_eq!(record.net_name.as_deref(), Some("FOO"));
    }

    #[test]
    fn test_dates() {
        let record = parse_generic("Creation Date: 2001-09-15T00:00:00Z");
        assert_eq!(record.creation_date.as_deref(), Some("2001-09-15T00:00:00Z"));

        let record = parse_generic("Creation Date: not-a-date");
        assert_eq!(record.creation_date.as_deref(), Some("not-a-date"));
    }

    #[test]
    fn test_name_servers_keep_duplicates() {
        let record = parse_generic("nserver: ns1.example.net\nName Server: ns1.example.net");
        assert_eq!(record.name_servers, vec!["ns1.example.net", "ns1.example.net"]);
    }

    #[test]
    fn test_garbage_input_never_fails() {
        let inputs = [
            "",
            "\n\n\n",
            "::::",
            "\u{0}\u{1}\u{2}binary:\u{ff}",
            "no colons anywhere in this text",
            "% IANA WHOIS server\n% for more information on IANA, visit http://www.iana.org",
        ];

        for input in inputs {
            let record = parse_generic(input);
            assert_eq!(record.raw_whois_content, input);
            for (name, value) in record.scalar_fields() {
                if let Some(v) = value {
                    assert!(!v.is_empty(), "{} populated with empty text", name);
                }
            }
        }
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(parse_generic(VERISIGN_SAMPLE), parse_generic(VERISIGN_SAMPLE));
    }

    #[test]
    fn test_arin_style_response() {
        let raw = r#"
NetRange:       8.8.8.0 - 8.8.8.255
CIDR:           8.8.8.0/24
NetName:        GOGL
NetType:        Direct Allocation
Organization:   Google LLC (GOGL)
RegDate:        2014-03-14
Updated:        2014-03-14
City:           Mountain View
StateProv:      CA
Country:        US
OrgAbuseEmail:  network-abuse@google.com
"#;
        let record = parse_generic(raw);

        assert_eq!(record.net_range.as_deref(), Some("8.8.8.0 - 8.8.8.255"));
        assert_eq!(record.cidr.as_deref(), Some("8.8.8.0/24"));
        assert_eq!(record.registrant_organization.as_deref(), Some("Google LLC (GOGL)"));
        assert_eq!(record.registrant_province.as_deref(), Some("Mountain View"));
        assert_eq!(record.registrant_country.as_deref(), Some("US"));
        assert_eq!(record.updated_date.as_deref(), Some("2014-03-14T00:00:00Z"));
        assert!(record.domain.is_none());
    }
}
