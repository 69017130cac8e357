//! Registry-specific WHOIS response parsers.
//!
//! This module provides a parser registry that allows suffix-specific parsing
//! of WHOIS responses. Some registries lay their output out in sections or
//! blocks the line-oriented generic extractor cannot read, so a specialized
//! parser may take over for their suffixes. Every parser, specialized or not,
//! is total: it always returns a record.

mod denic;
mod generic;
mod nominet;

use once_cell::sync::Lazy;

use super::record::WhoisRecord;
pub use denic::DenicParser;
pub use generic::GenericParser;
pub use nominet::NominetParser;

/// Trait for registry-specific WHOIS parsers.
///
/// Implementors start from the generic extraction and overlay whatever their
/// registry's format exposes in a non-standard way.
pub trait RegistryParser: Send + Sync {
    /// Returns the suffixes this parser handles.
    fn supported_tlds(&self) -> &[&str];

    /// Parses a raw WHOIS response; `query` is the name that was looked up.
    fn parse(&self, raw: &str, query: &str) -> WhoisRecord;
}

/// Registry of all available parsers.
///
/// The registry maintains a list of specialized parsers and falls back
/// to the generic parser when no specialized parser is available.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn RegistryParser>>,
    fallback: GenericParser,
}

impl ParserRegistry {
    /// Creates a new parser registry with all known parsers.
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(DenicParser::new()),   // .de
                Box::new(NominetParser::new()), // .uk, .co.uk
            ],
            fallback: GenericParser::new(),
        }
    }

    /// Creates a registry that only knows the generic parser.
    pub fn generic_only() -> Self {
        Self {
            parsers: Vec::new(),
            fallback: GenericParser::new(),
        }
    }

    /// Adds a parser; it is consulted after the ones already registered.
    pub fn register(mut self, parser: Box<dyn RegistryParser>) -> Self {
        self.parsers.push(parser);
        self
    }

    /// Parses a WHOIS response using the appropriate parser for the query's suffix.
    ///
    /// A second-level suffix match (`co.uk`) is tried before the TLD (`uk`) for
    /// each parser; the generic parser handles everything else.
    pub fn parse(&self, raw: &str, query: &str) -> WhoisRecord {
        let query = query.trim().trim_end_matches('.').to_lowercase();
        let tld = extract_tld(&query);
        let sld_tld = extract_second_level_tld(&query);

        for parser in &self.parsers {
            let supported = parser.supported_tlds();
            if let Some(sld) = &sld_tld {
                if supported.contains(&sld.as_str()) {
                    return parser.parse(raw, &query);
                }
            }
            if let Some(tld) = &tld {
                if supported.contains(&tld.as_str()) {
                    return parser.parse(raw, &query);
                }
            }
        }

        self.fallback.parse(raw, &query)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global parser registry instance.
pub static PARSER_REGISTRY: Lazy<ParserRegistry> = Lazy::new(ParserRegistry::new);

/// Extracts the TLD from a dotted name; single labels have none.
fn extract_tld(name: &str) -> Option<String> {
    let (_, tld) = name.rsplit_once('.')?;
    Some(tld.to_string())
}

/// Extracts the second-level suffix (e.g., "co.uk" from "example.co.uk").
fn extract_second_level_tld(name: &str) -> Option<String> {
    let parts: Vec<&str> = name.rsplit('.').collect();
    if parts.len() >= 3 {
        Some(format!("{}.{}", parts[1], parts[0]))
    } else {
        None
    }
}
