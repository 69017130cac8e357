//! Generic WHOIS parser for standard formats.
//!
//! Serves as the fallback when no specialized parser claims a suffix.

use super::RegistryParser;
use crate::whois::parser::parse_generic;
use crate::whois::record::WhoisRecord;

/// Generic parser: the key/value canonicalizer over every line.
#[derive(Debug, Clone, Default)]
pub struct GenericParser;

impl GenericParser {
    pub fn new() -> Self {
        Self
    }
}

impl RegistryParser for GenericParser {
    fn supported_tlds(&self) -> &[&str] {
        // Empty - this is the fallback parser
        &[]
    }

    fn parse(&self, raw: &str, _query: &str) -> WhoisRecord {
        parse_generic(raw)
    }
}
