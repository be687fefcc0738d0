use std::{path::PathBuf, str::FromStr};

pub fn parse_csv_var(name: &str) -> Option<Vec<String>> {
    std::env::var(name).ok().map(|raw| parse_csv(&raw))
}

pub fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|part| {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

/// Parse a boolean value from a raw string, accepting common env-style forms.
///
/// Accepted truthy values (case-insensitive): `"1"`, `"true"`, `"yes"`, `"on"`.
/// Accepted falsy values: `"0"`, `"false"`, `"no"`, `"off"`.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Boolean variable. A set but unrecognised value is recorded in `invalid`.
pub fn parse_bool_var(name: &str, invalid: &mut Vec<String>) -> Option<bool> {
    let raw = std::env::var(name).ok()?;
    let parsed = parse_bool(&raw);
    if parsed.is_none() {
        invalid.push(name.to_string());
    }
    parsed
}

/// Typed variable. A set but unparsable value is recorded in `invalid`.
pub fn parse_var<T: FromStr>(name: &str, invalid: &mut Vec<String>) -> Option<T> {
    parse_value(name, std::env::var(name).ok().as_deref(), invalid)
}

pub fn parse_value<T: FromStr>(
    name: &str,
    raw: Option<&str>,
    invalid: &mut Vec<String>,
) -> Option<T> {
    let parsed = raw?.trim().parse().ok();
    if parsed.is_none() {
        invalid.push(name.to_string());
    }
    parsed
}

/// Non-empty string variable.
pub fn string_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

pub fn path_var(name: &str) -> Option<PathBuf> {
    string_var(name).map(PathBuf::from)
}

/// PEM keys pasted into a single-line variable often carry literal `\n`.
pub fn unescape_pem(raw: &str) -> String {
    raw.trim().replace("\\n", "\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_drops_blank_entries() {
        assert_eq!(
            parse_csv(" https://a.example , ,https://b.example"),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn bool_accepts_env_forms() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn unparsable_values_are_recorded() {
        let mut invalid = Vec::new();
        assert_eq!(
            parse_value::<u16>("SERVER_PORT", Some(" 8080 "), &mut invalid),
            Some(8080)
        );
        assert_eq!(parse_value::<u16>("SERVER_PORT", None, &mut invalid), None);
        assert!(invalid.is_empty());

        assert_eq!(
            parse_value::<u16>("SERVER_PORT", Some("abc"), &mut invalid),
            None
        );
        assert_eq!(
            parse_value::<u32>("IDENTITY_WEBHOOK_RETENTION_DAYS", Some("x"), &mut invalid),
            None
        );
        assert_eq!(invalid, ["SERVER_PORT", "IDENTITY_WEBHOOK_RETENTION_DAYS"]);
    }

    #[test]
    fn pem_newlines_are_restored() {
        assert_eq!(
            unescape_pem("-----BEGIN KEY-----\\nabc\\n-----END KEY-----"),
            "-----BEGIN KEY-----\nabc\n-----END KEY-----"
        );
    }
}
