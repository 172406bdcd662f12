//! Write-access guard
//!
//! All mutating operations are gated by a single shared secret, re-checked
//! on every request; there is no session state, lockout, or rate limiting.
//! The secret is injected from configuration at startup.
//!
//! A successful check yields a [`WriteToken`], a zero-sized capability that
//! mutating service methods demand as proof the check happened. Its
//! constructor is private, so handlers cannot skip the guard.

/// Error returned for a wrong or missing write secret
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid write secret")]
pub struct AuthError;

/// Proof that the write secret was checked for the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteToken(());

/// Shared-secret check gating all write operations
pub struct WriteGuard {
    secret: String,
}

impl WriteGuard {
    /// Create a guard around the configured secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Check the provided secret, yielding a capability token on success
    pub fn authorize(&self, provided: &str) -> Result<WriteToken, AuthError> {
        if provided == self.secret {
            Ok(WriteToken(()))
        } else {
            Err(AuthError)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_secret_is_authorized() {
        let guard = WriteGuard::new("mat-khau");
        assert!(guard.authorize("mat-khau").is_ok());
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let guard = WriteGuard::new("mat-khau");
        assert_eq!(guard.authorize("sai"), Err(AuthError));
        assert_eq!(guard.authorize(""), Err(AuthError));
    }

    #[test]
    fn test_secret_comparison_is_exact() {
        let guard = WriteGuard::new("mat-khau");
        assert_eq!(guard.authorize("Mat-Khau"), Err(AuthError));
        assert_eq!(guard.authorize("mat-khau "), Err(AuthError));
    }
}
