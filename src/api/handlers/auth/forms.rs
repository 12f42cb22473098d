//! Registration and login form validation.
//!
//! Field constraints run first and are collected per field. The registration
//! uniqueness lookup only runs once every local constraint passed, so invalid
//! submissions never reach the database.

use anyhow::Result;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, future::Future};

pub(crate) const MSG_REQUIRED: &str = "This field is required.";
pub(crate) const MSG_USERNAME_TAKEN: &str = "That username is already taken.";
pub(crate) const MSG_PASSWORD_MISMATCH: &str = "Field must be equal to password.";

const USERNAME_MIN_CHARS: usize = 2;
const USERNAME_MAX_CHARS: usize = 20;

/// Store lookup used by the registration form's uniqueness check.
pub trait AccountLookup {
    fn username_exists(&self, username: &str) -> impl Future<Output = Result<bool>> + Send;
}

/// Per-field error messages, rendered next to the offending inputs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

// Passwords stay out of logs.
impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// A registration that passed every check and can be persisted.
pub struct NewAccount {
    pub username: String,
    pub password: SecretString,
}

impl RegistrationForm {
    /// Validate the submission, returning field errors for the form on failure.
    ///
    /// # Errors
    /// Returns an error only if the uniqueness lookup itself fails.
    pub async fn validate<L: AccountLookup>(
        &self,
        lookup: &L,
    ) -> Result<Result<NewAccount, FieldErrors>> {
        let mut errors = FieldErrors::default();
        let username = self.username.trim();

        if username.is_empty() {
            errors.add("username", MSG_REQUIRED);
        } else {
            let chars = username.chars().count();
            if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&chars) {
                errors.add(
                    "username",
                    format!(
                        "Field must be between {USERNAME_MIN_CHARS} and {USERNAME_MAX_CHARS} characters long."
                    ),
                );
            }
        }

        if self.password.trim().is_empty() {
            errors.add("password", MSG_REQUIRED);
        }

        if self.confirm_password.trim().is_empty() {
            errors.add("confirm_password", MSG_REQUIRED);
        } else if self.confirm_password != self.password {
            errors.add("confirm_password", MSG_PASSWORD_MISMATCH);
        }

        if !errors.is_empty() {
            return Ok(Err(errors));
        }

        if lookup.username_exists(username).await? {
            errors.add("username", MSG_USERNAME_TAKEN);
            return Ok(Err(errors));
        }

        Ok(Ok(NewAccount {
            username: username.to_string(),
            password: SecretString::from(self.password.clone()),
        }))
    }

    /// Username to echo back into the form; passwords are never echoed.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

#[derive(Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Login input that is complete enough to attempt authentication.
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl LoginForm {
    /// Check required fields only; credential checks happen against the store.
    ///
    /// # Errors
    /// Returns the field errors when a field is blank.
    pub fn validate(&self) -> Result<Credentials, FieldErrors> {
        let mut errors = FieldErrors::default();
        let username = self.username.trim();

        if username.is_empty() {
            errors.add("username", MSG_REQUIRED);
        }
        if self.password.trim().is_empty() {
            errors.add("password", MSG_REQUIRED);
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(Credentials {
            username: username.to_string(),
            password: SecretString::from(self.password.clone()),
        })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MemoryLookup {
        usernames: HashSet<String>,
        calls: AtomicUsize,
    }

    impl MemoryLookup {
        fn with(usernames: &[&str]) -> Self {
            Self {
                usernames: usernames.iter().map(ToString::to_string).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl AccountLookup for MemoryLookup {
        fn username_exists(&self, username: &str) -> impl Future<Output = Result<bool>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let exists = self.usernames.contains(username);
            async move { Ok(exists) }
        }
    }

    fn registration(username: &str, password: &str, confirm: &str) -> RegistrationForm {
        RegistrationForm {
            username: username.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    #[tokio::test]
    async fn registration_accepts_valid_input_and_trims_username() {
        let lookup = MemoryLookup::default();
        let result = registration("  alice ", "s3cret", "s3cret")
            .validate(&lookup)
            .await;

        let Ok(Ok(account)) = result else {
            panic!("expected a valid registration");
        };
        assert_eq!(account.username, "alice");
        assert_eq!(account.password.expose_secret(), "s3cret");
    }

    #[tokio::test]
    async fn registration_measures_length_after_trimming() {
        // Deliberately stricter than a raw-length check: padding never counts.
        let lookup = MemoryLookup::default();
        let result = registration(" a", "pw", "pw").validate(&lookup).await;

        let Ok(Err(errors)) = result else {
            panic!("expected a length error for a padded one-char name");
        };
        assert_eq!(
            errors.get("username"),
            ["Field must be between 2 and 20 characters long."]
        );

        let padded = format!("  {}  ", "a".repeat(20));
        let result = registration(&padded, "pw", "pw").validate(&lookup).await;
        assert!(matches!(result, Ok(Ok(_))), "padding must not push a name over 20");
    }

    #[tokio::test]
    async fn registration_requires_every_field() {
        let lookup = MemoryLookup::default();
        let result = RegistrationForm::default().validate(&lookup).await;

        let Ok(Err(errors)) = result else {
            panic!("expected field errors");
        };
        assert_eq!(errors.get("username"), [MSG_REQUIRED]);
        assert_eq!(errors.get("password"), [MSG_REQUIRED]);
        assert_eq!(errors.get("confirm_password"), [MSG_REQUIRED]);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn registration_enforces_username_length() {
        let lookup = MemoryLookup::default();
        for username in ["a", "abcdefghijklmnopqrstu"] {
            let result = registration(username, "pw", "pw").validate(&lookup).await;
            let Ok(Err(errors)) = result else {
                panic!("expected a length error for {username:?}");
            };
            assert_eq!(
                errors.get("username"),
                ["Field must be between 2 and 20 characters long."]
            );
        }

        for username in ["ab", "abcdefghijklmnopqrst", "ÿÿ"] {
            let result = registration(username, "pw", "pw").validate(&lookup).await;
            assert!(matches!(result, Ok(Ok(_))), "{username:?} should be valid");
        }
    }

    #[tokio::test]
    async fn registration_rejects_mismatched_confirmation_without_lookup() {
        let lookup = MemoryLookup::with(&["alice"]);
        let result = registration("alice", "one", "two").validate(&lookup).await;

        let Ok(Err(errors)) = result else {
            panic!("expected field errors");
        };
        assert_eq!(errors.get("confirm_password"), [MSG_PASSWORD_MISMATCH]);
        assert!(errors.get("username").is_empty());
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn registration_rejects_taken_username() {
        let lookup = MemoryLookup::with(&["alice"]);
        let result = registration(" alice", "pw", "pw").validate(&lookup).await;

        let Ok(Err(errors)) = result else {
            panic!("expected a duplicate username error");
        };
        assert_eq!(errors.get("username"), [MSG_USERNAME_TAKEN]);
        assert_eq!(lookup.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn login_requires_both_fields() {
        let Err(errors) = LoginForm::default().validate() else {
            panic!("expected field errors");
        };
        assert_eq!(errors.get("username"), [MSG_REQUIRED]);
        assert_eq!(errors.get("password"), [MSG_REQUIRED]);

        let form = LoginForm {
            username: "bob".to_string(),
            password: "   ".to_string(),
        };
        let Err(errors) = form.validate() else {
            panic!("expected a password error");
        };
        assert!(errors.get("username").is_empty());
        assert_eq!(errors.get("password"), [MSG_REQUIRED]);
    }

    #[test]
    fn login_passes_credentials_through() {
        let form = LoginForm {
            username: " bob ".to_string(),
            password: " pw ".to_string(),
        };
        let Ok(credentials) = form.validate() else {
            panic!("expected credentials");
        };
        assert_eq!(credentials.username, "bob");
        assert_eq!(credentials.password.expose_secret(), " pw ");
    }

    #[test]
    fn debug_output_never_contains_passwords() {
        let form = registration("alice", "hunter22", "hunter22");
        let rendered = format!("{form:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("hunter22"));
    }
}
