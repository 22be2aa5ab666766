//! Platform group resolution.

use super::AuthError;

/// Domain part of `email`.
///
/// # Errors
///
/// [`AuthError::InvalidEmailFormat`] unless the address contains exactly one
/// `@` followed by a non-empty domain.
pub fn email_domain(email: &str) -> Result<&str, AuthError> {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_local), Some(domain), None) if !domain.is_empty() => Ok(domain),
        _ => Err(AuthError::InvalidEmailFormat),
    }
}

/// Qualify provider-native group names with the principal's email domain.
///
/// `("alice@example.com", ["devs"])` resolves to `["devs@example.com"]`.
/// Order is preserved.
///
/// # Errors
///
/// - [`AuthError::InvalidEmailFormat`] if the email is not well formed
/// - [`AuthError::NoGroupsResolved`] if the result is empty
pub fn resolve_groups(email: &str, native_groups: &[String]) -> Result<Vec<String>, AuthError> {
    let domain = email_domain(email)?;

    let groups: Vec<String> = native_groups
        .iter()
        .map(|group| format!("{group}@{domain}"))
        .collect();

    if groups.is_empty() {
        return Err(AuthError::NoGroupsResolved);
    }
    Ok(groups)
}
