//! The canonical shape every registry response is normalized into.
//!
//! Scalar fields are `Option<String>` internally. The string `"Unknown"` only
//! exists at the serialization boundary: absent fields are written as
//! `"Unknown"`, and `"Unknown"` is read back as absent.

use serde::{Deserialize, Serialize};

/// Placeholder rendered for fields no registry line populated.
pub const UNKNOWN: &str = "Unknown";

/// Base of the ICANN EPP status glossary; the status code is appended as the anchor.
pub const EPP_GLOSSARY_URL: &str = "https://icann.org/epp#";

const EPP_GLOSSARY_MARKER: &str = "icann.org/epp";

/// A single registry status token and its explanatory link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    pub status: String,
    pub url: String,
}

impl StatusEntry {
    pub fn new(status: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            url: url.into(),
        }
    }

    /// Entry whose link points at the ICANN EPP glossary anchor for `code`.
    pub fn epp(code: &str) -> Self {
        Self::new(code, format!("{}{}", EPP_GLOSSARY_URL, code))
    }

    /// Returns true when the link points into the ICANN EPP glossary.
    pub fn is_epp_linked(&self) -> bool {
        self.url.contains(EPP_GLOSSARY_MARKER)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhoisRecord {
    #[serde(default, with = "unknown")]
    pub domain: Option<String>,
    #[serde(default, with = "unknown")]
    pub registrar: Option<String>,
    #[serde(rename = "registrarURL", default, with = "unknown")]
    pub registrar_url: Option<String>,
    #[serde(default, with = "unknown")]
    pub iana_id: Option<String>,
    #[serde(default, with = "unknown")]
    pub whois_server: Option<String>,
    #[serde(default, with = "unknown")]
    pub creation_date: Option<String>,
    #[serde(default, with = "unknown")]
    pub expiration_date: Option<String>,
    #[serde(default, with = "unknown")]
    pub updated_date: Option<String>,
    #[serde(default)]
    pub status: Vec<StatusEntry>,
    #[serde(default)]
    pub name_servers: Vec<String>,
    #[serde(default, with = "unknown")]
    pub registrant_organization: Option<String>,
    #[serde(default, with = "unknown")]
    pub registrant_province: Option<String>,
    #[serde(default, with = "unknown")]
    pub registrant_country: Option<String>,
    #[serde(default, with = "unknown")]
    pub registrant_phone: Option<String>,
    #[serde(default, with = "unknown")]
    pub registrant_email: Option<String>,
    #[serde(default, with = "unknown")]
    pub dnssec: Option<String>,
    #[serde(default, with = "unknown")]
    pub cidr: Option<String>,
    #[serde(default, with = "unknown")]
    pub inet_num: Option<String>,
    #[serde(default, with = "unknown")]
    pub inet6_num: Option<String>,
    #[serde(default, with = "unknown")]
    pub net_range: Option<String>,
    #[serde(default, with = "unknown")]
    pub net_name: Option<String>,
    #[serde(default, with = "unknown")]
    pub net_type: Option<String>,
    #[serde(rename = "originAS", default, with = "unknown")]
    pub origin_as: Option<String>,
    #[serde(default)]
    pub raw_whois_content: String,
}

impl WhoisRecord {
    /// An all-absent record carrying only the source text.
    pub fn empty(raw: &str) -> Self {
        Self {
            raw_whois_content: raw.to_string(),
            ..Self::default()
        }
    }

    /// Every scalar field paired with its external name, in declaration order.
    pub fn scalar_fields(&self) -> [(&'static str, &Option<String>); 21] {
        [
            ("domain", &self.domain),
            ("registrar", &self.registrar),
            ("registrarURL", &self.registrar_url),
            ("ianaId", &self.iana_id),
            ("whoisServer", &self.whois_server),
            ("creationDate", &self.creation_date),
            ("expirationDate", &self.expiration_date),
            ("updatedDate", &self.updated_date),
            ("registrantOrganization", &self.registrant_organization),
            ("registrantProvince", &self.registrant_province),
            ("registrantCountry", &self.registrant_country),
            ("registrantPhone", &self.registrant_phone),
            ("registrantEmail", &self.registrant_email),
            ("dnssec", &self.dnssec),
            ("cidr", &self.cidr),
            ("inetNum", &self.inet_num),
            ("inet6Num", &self.inet6_num),
            ("netRange", &self.net_range),
            ("netName", &self.net_name),
            ("netType", &self.net_type),
            ("originAS", &self.origin_as),
        ]
    }
}

/// Renders an optional field the way it appears on the wire.
pub fn or_unknown(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or(UNKNOWN)
}

mod unknown {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(super::or_unknown(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value = Option::<String>::deserialize(d)?;
        Ok(value.filter(|v| v != super::UNKNOWN))
    }
}
