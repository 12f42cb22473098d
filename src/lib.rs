//! # Clicker
//!
//! `clicker` is a small session-authenticated web application: users register with a
//! username and password, log in, and press a button that increments a per-account
//! click counter stored in Postgres.
//!
//! ## Accounts
//!
//! - **Usernames** are trimmed, 2 to 20 characters long and unique. Uniqueness is checked
//!   by the registration form and enforced again by the `UNIQUE` constraint.
//! - **Passwords** are stored as Argon2id PHC strings, never in clear text.
//! - **Clicks** start at zero and only grow, one atomic `UPDATE` per request.
//!
//! ## Sessions
//!
//! Logging in stores the SHA-256 of a random token in `account_sessions` and hands the
//! raw token to the browser in an `HttpOnly` cookie. Protected pages redirect to
//! `/login` when the cookie is missing, unknown or expired.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
