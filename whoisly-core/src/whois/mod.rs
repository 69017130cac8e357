pub mod canonical;
mod client;
mod parser;
pub mod parsers;
mod record;
mod servers;
mod status;

pub use client::{WhoisClient, WhoisTransport};
pub use parser::parse_generic;
pub use record::{StatusEntry, WhoisRecord, EPP_GLOSSARY_URL, UNKNOWN};
pub use servers::{get_tld, get_whois_server, pinned_server, IANA_WHOIS_SERVER};
pub use status::dedup_statuses;
