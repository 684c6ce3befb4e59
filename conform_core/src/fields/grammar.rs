use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@(?:[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$",
    )
    .expect("email grammar is a valid regex")
});

static LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?$")
        .expect("hostname label grammar is a valid regex")
});

const MAX_EMAIL_LEN: usize = 254;
const MAX_HOSTNAME_LEN: usize = 253;

/// `local@domain` where the domain has at least two labels.
pub fn is_valid_email(value: &str) -> bool {
    value.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(value)
}

/// Absolute URL with a host, e.g. `https://app.example.com/callback`.
pub fn is_valid_url(value: &str) -> bool {
    match url::Url::parse(value) {
        Ok(parsed) => parsed.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

/// Bare DNS name: no scheme, port or path. A single label (`mycompany`) is accepted.
pub fn is_valid_hostname(value: &str) -> bool {
    let name = value.strip_suffix('.').unwrap_or(value);
    if name.is_empty() || name.len() > MAX_HOSTNAME_LEN {
        return false;
    }
    name.split('.').all(|label| LABEL_RE.is_match(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emails() {
        assert!(is_valid_email("admin@company.com"));
        assert!(is_valid_email("first.last+tag@mail.example.co.uk"));
        assert!(!is_valid_email("admin@company"));
        assert!(!is_valid_email("admin.company.com"));
        assert!(!is_valid_email(".admin@company.com"));
        assert!(!is_valid_email("ad..min@company.com"));
        assert!(!is_valid_email("admin@-company.com"));
        assert!(!is_valid_email("admin @company.com"));
    }

    #[test]
    fn test_urls() {
        assert!(is_valid_url("https://app.example.io/integrations/callback"));
        assert!(is_valid_url("http://localhost:4000"));
        assert!(!is_valid_url("mycompany.salesforce.com"));
        assert!(!is_valid_url("mailto:admin@company.com"));
        assert!(!is_valid_url("not a url"));
    }

    #[test]
    fn test_hostnames() {
        assert!(is_valid_hostname("mycompany"));
        assert!(is_valid_hostname("mycompany.salesforce.com"));
        assert!(is_valid_hostname("my-company.example.com."));
        assert!(!is_valid_hostname("https://mycompany.salesforce.com"));
        assert!(!is_valid_hostname("mycompany.salesforce.com/path"));
        assert!(!is_valid_hostname("mycompany:443"));
        assert!(!is_valid_hostname("-mycompany"));
        assert!(!is_valid_hostname("my..company"));
        assert!(!is_valid_hostname(&"a".repeat(64)));
        assert!(!is_valid_hostname(""));
    }
}
