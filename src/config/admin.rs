//! Admin bootstrap credentials from environment variables.
//!
//! `ADMIN_EMAIL` and `ADMIN_PASSWORD` seed (or refresh) an admin login at
//! startup. Both must be set; otherwise no admin is seeded.

/// Returns `(email, password)` when both variables are set and non-empty.
#[must_use]
pub fn bootstrap_admin_from_env() -> Option<(String, String)> {
    let email = std::env::var("ADMIN_EMAIL").ok()?;
    let password = std::env::var("ADMIN_PASSWORD").ok()?;
    parse_bootstrap(&email, &password)
}

fn parse_bootstrap(email: &str, password: &str) -> Option<(String, String)> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return None;
    }
    Some((email.to_lowercase(), password.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bootstrap_normalizes_email() {
        let parsed = parse_bootstrap("  Admin@Example.com ", "secret");
        assert_eq!(
            parsed,
            Some(("admin@example.com".to_string(), "secret".to_string()))
        );
    }

    #[test]
    fn test_parse_bootstrap_rejects_blank_values() {
        assert!(parse_bootstrap("", "secret").is_none());
        assert!(parse_bootstrap("admin@example.com", "").is_none());
    }
}
