//! Authentication configuration.
//!
//! # Example (TOML)
//!
//! ```toml
//! [auth]
//! issuer = "carelink"
//! signing_secret = "change-me-to-a-long-random-value-of-32-bytes+"
//! session_token_lifetime = "60m"
//! refresh_token_lifetime = "1d"
//!
//! [auth.password]
//! min_length = 8
//! max_similarity = 0.7
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Minimum accepted length of the HMAC signing secret, in bytes.
pub const MIN_SIGNING_SECRET_LEN: usize = 32;

/// Root authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Issuer placed in the `iss` claim and required on every token.
    pub issuer: String,

    /// Symmetric key used to sign and verify tokens (HS256).
    pub signing_secret: String,

    /// Session (access) token lifetime.
    #[serde(with = "humantime_serde")]
    pub session_token_lifetime: Duration,

    /// Refresh token lifetime. Never extended by refreshing.
    #[serde(with = "humantime_serde")]
    pub refresh_token_lifetime: Duration,

    /// Password policy applied on registration.
    pub password: PasswordPolicyConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "carelink".to_string(),
            signing_secret: String::new(),
            session_token_lifetime: Duration::from_secs(60 * 60), // 60 minutes
            refresh_token_lifetime: Duration::from_secs(24 * 3600), // 1 day
            password: PasswordPolicyConfig::default(),
        }
    }
}

/// Password policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PasswordPolicyConfig {
    /// Minimum number of characters.
    pub min_length: usize,

    /// Similarity ratio at which a password is considered too close to the
    /// principal's name or email.
    pub max_similarity: f64,

    /// Reject passwords made only of digits.
    pub reject_numeric: bool,

    /// Reject passwords from the built-in common password list.
    pub reject_common: bool,
}

impl Default for PasswordPolicyConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_similarity: 0.7,
            reject_numeric: true,
            reject_common: true,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl AuthConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the signing secret is empty, and
    /// `ConfigError::InvalidValue` if:
    /// - The issuer is empty
    /// - The signing secret is shorter than [`MIN_SIGNING_SECRET_LEN`] bytes
    /// - A token lifetime is zero
    /// - The refresh lifetime is not longer than the session lifetime
    /// - The password policy is out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "issuer cannot be empty".to_string(),
            ));
        }

        if self.signing_secret.is_empty() {
            return Err(ConfigError::Missing("auth.signing_secret".to_string()));
        }
        if self.signing_secret.len() < MIN_SIGNING_SECRET_LEN {
            return Err(ConfigError::InvalidValue(format!(
                "signing_secret must be at least {MIN_SIGNING_SECRET_LEN} bytes"
            )));
        }

        if self.session_token_lifetime.is_zero() || self.refresh_token_lifetime.is_zero() {
            return Err(ConfigError::InvalidValue(
                "token lifetimes must be > 0".to_string(),
            ));
        }
        if self.refresh_token_lifetime <= self.session_token_lifetime {
            return Err(ConfigError::InvalidValue(
                "refresh_token_lifetime must be longer than session_token_lifetime".to_string(),
            ));
        }

        self.password.validate()
    }
}

impl PasswordPolicyConfig {
    /// Validates the policy thresholds.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `min_length` is zero or
    /// `max_similarity` is outside `(0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_length == 0 {
            return Err(ConfigError::InvalidValue(
                "password.min_length must be > 0".to_string(),
            ));
        }
        if !(self.max_similarity > 0.0 && self.max_similarity <= 1.0) {
            return Err(ConfigError::InvalidValue(format!(
                "password.max_similarity must be in (0, 1], got {}",
                self.max_similarity
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AuthConfig {
        AuthConfig {
            signing_secret: "0123456789abcdef0123456789abcdef".to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = AuthConfig::default();
        assert_eq!(config.session_token_lifetime, Duration::from_secs(3600));
        assert_eq!(config.refresh_token_lifetime, Duration::from_secs(86400));
        assert_eq!(config.password.min_length, 8);
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_missing_secret_rejected() {
        let err = AuthConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn test_short_secret_rejected() {
        let config = AuthConfig {
            signing_secret: "short".to_string(),
            ..AuthConfig::default()
        };
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidValue(_)
        ));
    }

    #[test]
    fn test_lifetimes_validated() {
        let mut config = valid();
        config.refresh_token_lifetime = config.session_token_lifetime;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.session_token_lifetime = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_similarity_range() {
        let mut config = valid();
        config.password.max_similarity = 0.0;
        assert!(config.validate().is_err());
        config.password.max_similarity = 1.5;
        assert!(config.validate().is_err());
        config.password.max_similarity = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_humantime_parsing() {
        let config: AuthConfig = toml::from_str(
            r#"
            issuer = "test"
            signing_secret = "0123456789abcdef0123456789abcdef"
            session_token_lifetime = "15m"
            refresh_token_lifetime = "7d"

            [password]
            min_length = 12
            "#,
        )
        .unwrap();
        assert_eq!(config.session_token_lifetime, Duration::from_secs(900));
        assert_eq!(config.refresh_token_lifetime, Duration::from_secs(7 * 86400));
        assert_eq!(config.password.min_length, 12);
        assert!(config.password.reject_common);
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::InvalidValue("test error".to_string());
        assert_eq!(err.to_string(), "Invalid configuration value: test error");

        let err = ConfigError::Missing("required_field".to_string());
        assert_eq!(
            err.to_string(),
            "Missing required configuration: required_field"
        );
    }
}
