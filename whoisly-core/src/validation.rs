//! Query classification: is the input a domain name or another registry resource?

use std::net::IpAddr;

use crate::error::{Result, WhoislyError};

/// Normalize and validate a domain name
///
/// This function:
/// - Removes http:// and https:// prefixes
/// - Removes the path and the www. prefix
/// - Converts to lowercase and drops a trailing root dot
/// - Requires dotted labels of alphanumerics and inner hyphens
pub fn normalize_domain(domain: &str) -> Result<String> {
    let domain = domain.trim().to_lowercase();

    // Remove protocol
    let domain = domain
        .strip_prefix("http://")
        .or_else(|| domain.strip_prefix("https://"))
        .unwrap_or(&domain);

    // Remove trailing slash and path
    let domain = domain.split('/').next().unwrap_or(domain);

    // Remove www. prefix
    let domain = domain.strip_prefix("www.").unwrap_or(domain);
    let domain = domain.strip_suffix('.').unwrap_or(domain);

    if domain.is_empty() || !domain.contains('.') {
        return Err(WhoislyError::InvalidQuery(domain.to_string()));
    }

    let valid = domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if !valid {
        return Err(WhoislyError::InvalidQuery(domain.to_string()));
    }

    // Check for hyphens at start/end of labels and empty labels
    for label in domain.split('.') {
        if label.is_empty() || label.starts_with('-') || label.ends_with('-') {
            return Err(WhoislyError::InvalidQuery(domain.to_string()));
        }
    }

    Ok(domain.to_string())
}

/// Returns the canonical hostname when `input` names a domain, `None` for
/// IP addresses, CIDR blocks, AS numbers and anything else.
pub fn extract_domain(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.parse::<IpAddr>().is_ok() || is_cidr(trimmed) {
        return None;
    }

    let domain = normalize_domain(trimmed).ok()?;
    let tld = domain.rsplit('.').next()?;
    // Numeric TLDs only occur in addresses (and partial ones such as "10.1")
    if !tld.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(domain)
}

/// Canonical form of user input, used both on the wire and as the cache key.
///
/// Domains and URLs reduce to the bare lower-case hostname, IP addresses (also
/// inside a URL) to their canonical text, AS numbers to `AS<n>`. Anything else
/// is passed through trimmed.
pub fn clean_query(input: &str) -> String {
    let trimmed = input.trim();

    if is_cidr(trimmed) {
        return trimmed.to_lowercase();
    }
    if let Some(domain) = extract_domain(trimmed) {
        return domain;
    }

    let host = strip_url(trimmed);
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.to_string();
    }

    if let Some(asn) = trimmed
        .get(..2)
        .filter(|prefix| prefix.eq_ignore_ascii_case("as"))
        .map(|_| &trimmed[2..])
        .filter(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
    {
        return format!("AS{}", asn);
    }

    trimmed.to_string()
}

/// Drops a URL scheme and anything from the first `/` after the host.
fn strip_url(input: &str) -> &str {
    let rest = input.split_once("://").map_or(input, |(_, rest)| rest);
    if rest.contains('[') {
        // Bracketed IPv6 host, possibly followed by a port or path
        return rest.split(']').next().unwrap_or(rest);
    }
    if rest.parse::<IpAddr>().is_ok() {
        return rest;
    }
    rest.split('/').next().unwrap_or(rest)
}

fn is_cidr(input: &str) -> bool {
    match input.split_once('/') {
        Some((addr, prefix)) => addr.parse::<IpAddr>().is_ok() && prefix.parse::<u8>().is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("example.com").unwrap(), "example.com");
        assert_eq!(normalize_domain("EXAMPLE.COM.").unwrap(), "example.com");
        assert_eq!(
            normalize_domain("https://www.example.com/path").unwrap(),
            "example.com"
        );
        assert!(normalize_domain("invalid").is_err());
        assert!(normalize_domain("exa_mple.com").is_err());
        assert!(normalize_domain("-bad.com").is_err());
        assert!(normalize_domain("a..com").is_err());
    }

    #[test]
    fn test_extract_domain_accepts_hostnames() {
        assert_eq!(extract_domain("Example.CO.uk"), Some("example.co.uk".to_string()));
        assert_eq!(
            extract_domain("http://www.example.org/index.html"),
            Some("example.org".to_string())
        );
    }

    #[test]
    fn test_clean_query() {
        assert_eq!(clean_query("https://www.Example.com/path"), "example.com");
        assert_eq!(clean_query("  EXAMPLE.COM. "), "example.com");
        assert_eq!(clean_query("8.8.8.8"), "8.8.8.8");
        assert_eq!(clean_query("http://8.8.4.4/dns-query"), "8.8.4.4");
        assert_eq!(clean_query("2001:4860:4860:0:0:0:0:8888"), "2001:4860:4860::8888");
        assert_eq!(clean_query("http://[2001:db8::1]/index"), "2001:db8::1");
        assert_eq!(clean_query("192.0.2.0/24"), "192.0.2.0/24");
        assert_eq!(clean_query("as15169"), "AS15169");
        assert_eq!(clean_query("asdf"), "asdf");
    }

    #[test]
    fn test_extract_domain_rejects_resources() {
        assert_eq!(extract_domain("8.8.8.8"), None);
        assert_eq!(extract_domain("2001:4860:4860::8888"), None);
        assert_eq!(extract_domain("192.0.2.0/24"), None);
        assert_eq!(extract_domain("2001:db8::/32"), None);
        assert_eq!(extract_domain("AS15169"), None);
        assert_eq!(extract_domain("10.1"), None);
        assert_eq!(extract_domain(""), None);
    }
}
