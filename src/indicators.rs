//! Indicator value helpers
//!
//! Shape checks and small transforms for values callers commonly feed back
//! into matcher configuration or downstream submissions.

use regex::Regex;
use std::sync::OnceLock;

fn cidr_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}(/[0-9]{1,2})?$")
            .expect("static indicator pattern is valid")
    })
}

fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:https?|ftp)://[A-Za-z0-9.\-]+")
            .expect("static indicator pattern is valid")
    })
}

/// Dotted quad, optionally in CIDR notation (shape only, octets are not range-checked)
pub fn is_ipv4(value: &str) -> bool {
    cidr_regex().is_match(value)
}

/// CIDR form of an address; bare addresses are treated as a single host
pub fn add_netmask(value: &str) -> String {
    match cidr_regex().captures(value) {
        Some(caps) if caps.get(1).is_some() => value.to_string(),
        _ => format!("{}/32", value),
    }
}

/// True when `src` equals `dst` or is a subdomain of it (case-insensitive)
pub fn is_subdomain(src: &str, dst: &str) -> bool {
    let src = src.to_lowercase();
    let dst = dst.to_lowercase();
    let mut src_labels = src.rsplit('.');

    dst.rsplit('.')
        .all(|label| src_labels.next().is_some_and(|s| s == label))
}

/// True when the value starts with an http, https or ftp URL
pub fn is_url(value: &str) -> bool {
    url_regex().is_match(value)
}

/// Parent domains from the top down: `a.b.c` yields `c`, `b.c`, `a.b.c`
pub fn fqdn_parts(fqdn: &str) -> impl Iterator<Item = &str> + '_ {
    let label_starts = std::iter::once(0).chain(fqdn.match_indices('.').map(|(i, _)| i + 1));
    let mut starts: Vec<usize> = label_starts.collect();
    starts.reverse();
    starts.into_iter().map(move |start| &fqdn[start..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_ipv4() {
        assert!(is_ipv4("1.2.3.4"));
        assert!(is_ipv4("10.0.0.0/8"));
        assert!(!is_ipv4("1.2.3"));
        assert!(!is_ipv4("1.2.3.4/123"));
        assert!(!is_ipv4("host.example.com"));
    }

    #[test]
    fn test_add_netmask() {
        assert_eq!(add_netmask("1.2.3.4"), "1.2.3.4/32");
        assert_eq!(add_netmask("10.0.0.0/8"), "10.0.0.0/8");
    }

    #[test]
    fn test_is_subdomain() {
        assert!(is_subdomain("www.Example.com", "example.com"));
        assert!(is_subdomain("example.com", "EXAMPLE.com"));
        assert!(!is_subdomain("example.com", "www.example.com"));
        assert!(!is_subdomain("badexample.com", "example.com"));
        assert!(!is_subdomain("example.org", "example.com"));
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("http://example.com/a?b=c"));
        assert!(is_url("HTTPS://example.com"));
        assert!(is_url("ftp://files.example.com"));
        assert!(!is_url("hxxp://example.com"));
        assert!(!is_url("see http://example.com"));
    }

    #[test]
    fn test_fqdn_parts() {
        let parts: Vec<&str> = fqdn_parts("a.b.c.d").collect();
        assert_eq!(parts, vec!["d", "c.d", "b.c.d", "a.b.c.d"]);

        let single: Vec<&str> = fqdn_parts("localhost").collect();
        assert_eq!(single, vec!["localhost"]);
    }
}
