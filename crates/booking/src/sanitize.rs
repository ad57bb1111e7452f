//! Masking helpers for log and span fields.
//!
//! Appointment data is personal. Log lines carry record ids freely, but
//! contact details and storage locations go through these first.

use std::path::Path;

/// File name only, without the directory.
pub fn redact_path(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("<unknown>")
        .to_string()
}

/// Drops userinfo and the query string from a URL.
///
/// - `https://user:pw@db.example.com/rest?apikey=x` → `https://****@db.example.com/rest`
/// - `https://db.example.com` → unchanged
pub fn redact_url(url: &str) -> String {
    let url = url.split(['?', '#']).next().unwrap_or(url);

    if let Some(scheme_end) = url.find("://") {
        let (scheme, rest) = url.split_at(scheme_end + 3);
        let authority_end = rest.find('/').unwrap_or(rest.len());
        if let Some(at_pos) = rest[..authority_end].rfind('@') {
            return format!("{}****@{}", scheme, &rest[at_pos + 1..]);
        }
    }

    url.to_string()
}

/// `jane.doe@example.com` → `j***@example.com`
pub fn mask_email(email: &str) -> String {
    match email.trim().split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}

/// Keeps the last two digits.
pub fn mask_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() <= 2 {
        return "***".to_string();
    }
    let tail: String = digits[digits.len() - 2..].iter().collect();
    format!("***{}", tail)
}
