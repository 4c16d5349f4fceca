//! Shared-secret authentication for externally scheduled jobs.

use crate::error::CoreError;

/// Check an `Authorization` header value against the configured job secret.
///
/// The header must be exactly `Bearer <secret>`. A missing header, any other
/// format, a different secret, or an unconfigured (absent or empty) secret
/// all fail with [`CoreError::Unauthorized`].
pub fn verify_bearer_secret(
    authorization: Option<&str>,
    configured_secret: Option<&str>,
) -> Result<(), CoreError> {
    let secret = configured_secret
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::Unauthorized("Job secret is not configured".into()))?;

    let header = authorization
        .ok_or_else(|| CoreError::Unauthorized("Missing Authorization header".into()))?;

    let provided = header.strip_prefix("Bearer ").ok_or_else(|| {
        CoreError::Unauthorized("Invalid Authorization format. Expected: Bearer <secret>".into())
    })?;

    if constant_time_eq(provided.as_bytes(), secret.as_bytes()) {
        Ok(())
    } else {
        Err(CoreError::Unauthorized("Invalid job secret".into()))
    }
}

/// Byte comparison whose running time does not depend on where the inputs
/// first differ.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
