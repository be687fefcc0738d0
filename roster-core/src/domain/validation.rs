//! Field validation shared by the agency, member and onboarding services.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::error::{Result, RosterError};

pub const AGENCY_NAME_MAX: usize = 120;
pub const PERSON_NAME_MAX: usize = 80;
pub const PHONE_MAX: usize = 40;
pub const FREE_TEXT_MAX: usize = 2000;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$")
        .expect("email regex should compile")
});

/// Trim and lowercase an email, rejecting anything that does not look like
/// `local@domain.tld`.
pub fn normalize_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(RosterError::Validation("email is required".into()));
    }
    if email.len() > 254 || !EMAIL_RE.is_match(&email) {
        return Err(RosterError::Validation(format!(
            "'{}' is not a valid email address",
            raw.trim()
        )));
    }
    Ok(email)
}

pub fn agency_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(RosterError::Validation("agency name is required".into()));
    }
    if name.chars().count() > AGENCY_NAME_MAX {
        return Err(RosterError::Validation(format!(
            "agency name must be at most {AGENCY_NAME_MAX} characters"
        )));
    }
    Ok(name.to_string())
}

pub fn website(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let parsed = Url::parse(trimmed).map_err(|_| {
        RosterError::Validation(format!("'{trimmed}' is not a valid URL"))
    })?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(trimmed.to_string()),
        _ => Err(RosterError::Validation(
            "website must be an http or https URL".into(),
        )),
    }
}

/// Normalise an optional free-text field: `None` stays `None`, blank
/// strings collapse to `None`, everything else is trimmed and length
/// checked.
pub fn optional_text(
    field: &str,
    raw: Option<&str>,
    max: usize,
) -> Result<Option<String>> {
    let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > max {
        return Err(RosterError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(Some(value.to_string()))
}

pub fn optional_email(raw: Option<&str>) -> Result<Option<String>> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => normalize_email(value).map(Some),
        None => Ok(None),
    }
}

pub fn optional_website(raw: Option<&str>) -> Result<Option<String>> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => website(value).map(Some),
        None => Ok(None),
    }
}

/// Apply a patch value to an optional column: absent leaves `current`
/// alone, an empty string clears it.
pub fn patch_text(
    field: &str,
    current: Option<String>,
    patch: Option<&str>,
    max: usize,
) -> Result<Option<String>> {
    match patch {
        None => Ok(current),
        Some(value) => optional_text(field, Some(value), max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email("  Jane.Doe@Example.COM ").unwrap(),
            "jane.doe@example.com"
        );
        assert!(normalize_email("").is_err());
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("a@b").is_err());
        assert!(normalize_email("a b@c.de").is_err());
    }

    #[test]
    fn agency_names_are_bounded() {
        assert_eq!(agency_name("  Acme  ").unwrap(), "Acme");
        assert!(agency_name("   ").is_err());
        assert!(agency_name(&"x".repeat(AGENCY_NAME_MAX)).is_ok());
        assert!(agency_name(&"x".repeat(AGENCY_NAME_MAX + 1)).is_err());
    }

    #[test]
    fn websites_must_be_http() {
        assert!(website("https://acme.example").is_ok());
        assert!(website("http://acme.example/about").is_ok());
        assert!(website("ftp://acme.example").is_err());
        assert!(website("acme.example").is_err());
    }

    #[test]
    fn patches_clear_on_empty_string() {
        let current = Some("old".to_string());
        assert_eq!(
            patch_text("phone", current.clone(), None, PHONE_MAX).unwrap(),
            current
        );
        assert_eq!(patch_text("phone", current, Some("  "), PHONE_MAX).unwrap(), None);
        assert!(
            patch_text("first name", None, Some(&"y".repeat(81)), PERSON_NAME_MAX)
                .is_err()
        );
    }
}
