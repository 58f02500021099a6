//! Small shape checks shared by resource, app and request validation.

/// Returns true for `#RRGGBB` hex colors.
pub fn is_hex_color(color: &str) -> bool {
    match color.strip_prefix('#') {
        Some(hex) => hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Returns true for addresses shaped like `local@domain.tld`.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// Returns true for `UTC` or an IANA `Area/Location[/Sub]` zone name.
pub fn is_valid_timezone(timezone: &str) -> bool {
    if timezone == "UTC" {
        return true;
    }
    let parts: Vec<&str> = timezone.split('/').collect();
    parts.len() >= 2
        && parts.iter().all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+'))
        })
        && parts[0].starts_with(|c: char| c.is_ascii_uppercase())
}

/// Returns true for identifiers made of ASCII letters, digits, `-` and `_`.
pub fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Returns true for `/segment[/segment...]` URL prefixes without a trailing slash.
pub fn is_route_prefix(value: &str) -> bool {
    let Some(rest) = value.strip_prefix('/') else {
        return false;
    };
    !rest.is_empty() && rest.split('/').all(is_identifier)
}
