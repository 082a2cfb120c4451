//! Composable password validators.
//!
//! A [`PasswordPolicy`] runs every configured [`PasswordValidator`] and
//! collects all of their messages, so a client learns every problem with a
//! candidate password at once.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::PasswordPolicyConfig;

static COMMON_PASSWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    include_str!("common_passwords.txt")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
});

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W+").expect("non-word pattern is a valid regex"));

/// The principal attributes a password is compared against.
#[derive(Debug, Clone, Copy, Default)]
pub struct UserAttributes<'a> {
    pub name: &'a str,
    pub email: &'a str,
}

impl<'a> UserAttributes<'a> {
    #[must_use]
    pub fn new(name: &'a str, email: &'a str) -> Self {
        Self { name, email }
    }

    fn labelled(&self) -> [(&'static str, &'a str); 2] {
        [("name", self.name), ("email address", self.email)]
    }
}

/// A single password rule.
pub trait PasswordValidator: Send + Sync {
    /// Returns a user-facing message if `password` breaks the rule.
    fn validate(&self, password: &str, user: &UserAttributes<'_>) -> Option<String>;
}

/// Rejects passwords shorter than `min_length` characters.
#[derive(Debug, Clone)]
pub struct MinimumLengthValidator {
    pub min_length: usize,
}

impl PasswordValidator for MinimumLengthValidator {
    fn validate(&self, password: &str, _user: &UserAttributes<'_>) -> Option<String> {
        (password.chars().count() < self.min_length).then(|| {
            format!(
                "This password is too short. It must contain at least {} characters.",
                self.min_length
            )
        })
    }
}

/// Rejects passwords too similar to the principal's name or email.
///
/// Each attribute is compared whole and split on non-word characters; the
/// comparison is case-insensitive.
#[derive(Debug, Clone)]
pub struct UserAttributeSimilarityValidator {
    pub max_similarity: f64,
}

impl UserAttributeSimilarityValidator {
    /// Short attribute parts cannot make a long password "similar".
    fn exceeds_length_ratio(&self, password_len: usize, part_len: usize) -> bool {
        let bound = self.max_similarity / 2.0 * password_len as f64;
        password_len >= 10 * part_len && (part_len as f64) < bound
    }
}

impl PasswordValidator for UserAttributeSimilarityValidator {
    fn validate(&self, password: &str, user: &UserAttributes<'_>) -> Option<String> {
        let password = password.to_lowercase();
        let password_len = password.chars().count();

        for (label, value) in user.labelled() {
            if value.is_empty() {
                continue;
            }
            let value = value.to_lowercase();
            let parts = NON_WORD
                .split(&value)
                .chain(std::iter::once(value.as_str()))
                .filter(|part| !part.is_empty());

            for part in parts {
                if self.exceeds_length_ratio(password_len, part.chars().count()) {
                    continue;
                }
                if similarity_ratio(&password, part) >= self.max_similarity {
                    return Some(format!("The password is too similar to the {label}."));
                }
            }
        }
        None
    }
}

/// Rejects passwords found in the built-in common password list.
#[derive(Debug, Clone, Default)]
pub struct CommonPasswordValidator;

impl PasswordValidator for CommonPasswordValidator {
    fn validate(&self, password: &str, _user: &UserAttributes<'_>) -> Option<String> {
        let lowered = password.trim().to_lowercase();
        COMMON_PASSWORDS
            .contains(lowered.as_str())
            .then(|| "This password is too common.".to_string())
    }
}

/// Rejects passwords made only of digits.
#[derive(Debug, Clone, Default)]
pub struct NumericPasswordValidator;

impl PasswordValidator for NumericPasswordValidator {
    fn validate(&self, password: &str, _user: &UserAttributes<'_>) -> Option<String> {
        (!password.is_empty() && password.chars().all(|c| c.is_numeric()))
            .then(|| "This password is entirely numeric.".to_string())
    }
}

/// Ordered set of validators applied to candidate passwords.
pub struct PasswordPolicy {
    validators: Vec<Box<dyn PasswordValidator>>,
}

impl PasswordPolicy {
    /// Creates an empty policy that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// Appends a validator.
    #[must_use]
    pub fn with(mut self, validator: impl PasswordValidator + 'static) -> Self {
        self.validators.push(Box::new(validator));
        self
    }

    /// Builds the policy described by `config`.
    #[must_use]
    pub fn from_config(config: &PasswordPolicyConfig) -> Self {
        let mut policy = Self::new()
            .with(MinimumLengthValidator {
                min_length: config.min_length,
            })
            .with(UserAttributeSimilarityValidator {
                max_similarity: config.max_similarity,
            });
        if config.reject_common {
            policy = policy.with(CommonPasswordValidator);
        }
        if config.reject_numeric {
            policy = policy.with(NumericPasswordValidator);
        }
        policy
    }

    /// Runs every validator.
    ///
    /// # Errors
    ///
    /// Returns every message produced, in validator order.
    pub fn validate(&self, password: &str, user: &UserAttributes<'_>) -> Result<(), Vec<String>> {
        let messages: Vec<String> = self
            .validators
            .iter()
            .filter_map(|v| v.validate(password, user))
            .collect();
        if messages.is_empty() {
            Ok(())
        } else {
            Err(messages)
        }
    }
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::from_config(&PasswordPolicyConfig::default())
    }
}

impl std::fmt::Debug for PasswordPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordPolicy")
            .field("validators", &self.validators.len())
            .finish()
    }
}

/// Upper bound on the match ratio of two strings: `2 * M / T`, where `M` is
/// the size of their character multiset intersection and `T` the sum of
/// their lengths.
fn similarity_ratio(a: &str, b: &str) -> f64 {
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 1.0;
    }

    let mut available: HashMap<char, usize> = HashMap::new();
    for c in b.chars() {
        *available.entry(c).or_default() += 1;
    }
    let mut matches = 0usize;
    for c in a.chars() {
        if let Some(count) = available.get_mut(&c).filter(|n| **n > 0) {
            *count -= 1;
            matches += 1;
        }
    }
    2.0 * matches as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> UserAttributes<'static> {
        UserAttributes::new("Alice", "a@x.com")
    }

    #[test]
    fn test_strong_password_accepted() {
        let policy = PasswordPolicy::default();
        assert!(policy.validate("Str0ngPass1", &alice()).is_ok());
    }

    #[test]
    fn test_all_messages_collected() {
        let policy = PasswordPolicy::default();
        let messages = policy.validate("1234567", &alice()).unwrap_err();
        assert_eq!(
            messages,
            vec![
                "This password is too short. It must contain at least 8 characters.".to_string(),
                "This password is too common.".to_string(),
                "This password is entirely numeric.".to_string(),
            ]
        );
    }

    #[test]
    fn test_common_is_case_insensitive() {
        let validator = CommonPasswordValidator;
        assert!(validator.validate("PassWord", &alice()).is_some());
        assert!(validator.validate("Str0ngPass1", &alice()).is_none());
    }

    #[test]
    fn test_similar_to_email() {
        let validator = UserAttributeSimilarityValidator {
            max_similarity: 0.7,
        };
        let user = UserAttributes::new("Bob", "margaret.thatcher@example.com");
        assert_eq!(
            validator.validate("Thatcher1", &user),
            Some("The password is too similar to the email address.".to_string())
        );
    }

    #[test]
    fn test_similar_to_name() {
        let validator = UserAttributeSimilarityValidator {
            max_similarity: 0.7,
        };
        let user = UserAttributes::new("Christopher", "c@x.com");
        assert_eq!(
            validator.validate("christopher", &user),
            Some("The password is too similar to the name.".to_string())
        );
    }

    #[test]
    fn test_short_parts_ignored_for_long_passwords() {
        let validator = UserAttributeSimilarityValidator {
            max_similarity: 0.7,
        };
        // "a" alone would otherwise match a character of the password
        let user = UserAttributes::new("", "a@b.io");
        assert!(validator.validate("aaaaaaaaaaaa", &user).is_none());
    }

    #[test]
    fn test_numeric() {
        let validator = NumericPasswordValidator;
        assert!(validator.validate("84736251", &alice()).is_some());
        assert!(validator.validate("8473625a", &alice()).is_none());
    }

    #[test]
    fn test_policy_respects_switches() {
        let config = PasswordPolicyConfig {
            reject_common: false,
            reject_numeric: false,
            ..PasswordPolicyConfig::default()
        };
        let policy = PasswordPolicy::from_config(&config);
        assert!(policy.validate("12345678", &alice()).is_ok());
    }

    #[test]
    fn test_similarity_ratio() {
        assert!((similarity_ratio("abcd", "abcd") - 1.0).abs() < f64::EPSILON);
        assert!((similarity_ratio("abcd", "wxyz")).abs() < f64::EPSILON);
        assert!((similarity_ratio("ab", "ba") - 1.0).abs() < f64::EPSILON);
    }
}
