use crate::{CoreError, CoreResult};

/// Structural check for an email address: one `@`, a non-empty local part and a dotted domain.
///
/// Deliverability is not our concern; this only keeps obviously broken values out of
/// token claims and booking documents.
pub fn validate_email(email: &str) -> CoreResult<()> {
    let invalid = || CoreError::ValidationError(format!("Invalid email address: {:?}", email));

    if email.trim() != email || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(invalid());
    }

    Ok(())
}
