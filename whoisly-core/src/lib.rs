//! WHOIS lookups normalized into one canonical record.
//!
//! Raw registry text goes through the field canonicalizer and status
//! deduplicator ([`whois::parse_generic`]), optionally overridden per suffix
//! ([`whois::parsers::ParserRegistry`]). [`WhoisLookup`] adds transport,
//! IANA referral handling and timing; [`CachedLookup`] memoizes successes.

pub mod cache;
pub mod config;
pub mod error;
pub mod lookup;
pub mod output;
pub mod validation;
pub mod whois;

pub use cache::{CacheStore, CachedLookup, FileStore, MemoryStore};
pub use config::LookupConfig;
pub use error::{Result, WhoislyError};
pub use lookup::{lookup_options, LookupOptions, LookupOutcome, WhoisLookup};
pub use output::{OutputFormat, OutputFormatter};
pub use validation::{clean_query, extract_domain, normalize_domain};
pub use whois::{parse_generic, StatusEntry, WhoisClient, WhoisRecord, WhoisTransport};
