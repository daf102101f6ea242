//! Domain pattern matching for template scoping
//!
//! A pattern is either an exact hostname (`example.com`) or a wildcard
//! (`*.example.com`). A wildcard matches its bare base domain and any true
//! subdomain of it, but not hostnames that merely share the suffix.

use url::Url;

/// Does `domain` satisfy the stored `pattern`?
pub fn matches(pattern: &str, domain: &str) -> bool {
    let pattern = pattern.trim().to_lowercase();
    let domain = domain.trim().to_lowercase();

    if pattern == domain {
        return true;
    }

    let Some(base) = pattern.strip_prefix("*.") else {
        return false;
    };

    if domain == base {
        return true;
    }

    match domain.strip_suffix(base) {
        Some(prefix) => prefix
            .strip_suffix('.')
            .map(|label| !label.is_empty())
            .unwrap_or(false),
        None => false,
    }
}

/// An empty domain set applies everywhere; otherwise any pattern must match.
pub fn template_applies_to(patterns: &[String], domain: &str) -> bool {
    patterns.is_empty() || patterns.iter().any(|pattern| matches(pattern, domain))
}

/// Hostname of a tab URL, lowercased and without the root-zone dot.
/// `None` for URLs without a host.
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let host = parsed.host_str()?.trim_end_matches('.');

    if host.is_empty() {
        None
    } else {
        Some(host.to_lowercase())
    }
}

/// Parse free-form editor input (comma or newline separated) into a domain set.
///
/// Schemes and paths are stripped so pasted URLs work.
pub fn normalize_domain_list(input: &str) -> Vec<String> {
    normalize_domains(input.split([',', '\n']).map(|entry| {
        let entry = entry.trim();
        if entry.contains("://") {
            extract_domain(entry).unwrap_or_default()
        } else {
            entry.split('/').next().unwrap_or("").to_string()
        }
    }))
}

/// Trim, lowercase, drop empties and de-duplicate while keeping order
pub fn normalize_domains<I, S>(domains: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result: Vec<String> = Vec::new();
    for domain in domains {
        let domain = domain.as_ref().trim().to_lowercase();
        if !domain.is_empty() && !result.contains(&domain) {
            result.push(domain);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("*.example.com", "example.com", true ; "wildcard matches bare base")]
    #[test_case("*.example.com", "foo.example.com", true ; "wildcard matches subdomain")]
    #[test_case("*.example.com", "a.b.example.com", true ; "wildcard matches nested subdomain")]
    #[test_case("*.example.com", "badexample.com", false ; "wildcard rejects shared suffix")]
    #[test_case("*.example.com", ".example.com", false ; "wildcard rejects empty label")]
    #[test_case("example.com", "example.com", true ; "exact match")]
    #[test_case("example.com", "sub.example.com", false ; "exact rejects subdomain")]
    #[test_case(" Example.COM ", "example.com", true ; "normalizes case and whitespace")]
    #[test_case("*.example.com", "FOO.Example.com", true ; "wildcard normalizes case")]
    fn test_matches(pattern: &str, domain: &str, expected: bool) {
        assert_eq!(matches(pattern, domain), expected);
    }

    #[test]
    fn test_empty_set_is_universal() {
        assert!(template_applies_to(&[], "anything.org"));
    }

    #[test]
    fn test_any_pattern_matches() {
        let patterns = vec!["a.com".to_string(), "*.b.com".to_string()];
        assert!(template_applies_to(&patterns, "a.com"));
        assert!(template_applies_to(&patterns, "x.b.com"));
        assert!(!template_applies_to(&patterns, "c.com"));
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(
            extract_domain("https://Mail.Google.com/mail/u/0/#inbox").as_deref(),
            Some("mail.google.com")
        );
        assert_eq!(
            extract_domain("http://user:pw@localhost:8080/x").as_deref(),
            Some("localhost")
        );
        assert_eq!(extract_domain("about:blank"), None);
        assert_eq!(extract_domain("file:///tmp/a.html"), None);
        assert_eq!(extract_domain("not a url"), None);
    }

    #[test]
    fn test_extract_domain_ipv6_and_trailing_dot() {
        assert_eq!(extract_domain("http://[::1]:8080/x").as_deref(), Some("[::1]"));

        let host = extract_domain("https://Example.com.:443/").unwrap();
        assert_eq!(host, "example.com");
        assert!(matches("*.example.com", &host));
    }

    #[test]
    fn test_normalize_domain_list() {
        let domains = normalize_domain_list("a.com, https://B.com/path\n*.c.com,,a.com");
        assert_eq!(domains, vec!["a.com", "b.com", "*.c.com"]);
    }
}
