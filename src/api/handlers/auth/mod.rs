//! Accounts, sessions and the form plumbing around them.
//!
//! ## Sessions
//!
//! Sessions live server-side in `account_sessions`. The browser holds a random
//! 32-byte token in an `HttpOnly` cookie; only its SHA-256 digest is stored, so
//! a leaked table cannot be replayed. Expired rows never authenticate and are
//! purged whenever a new session starts.
//!
//! ## Passwords
//!
//! Passwords are hashed with Argon2id into PHC strings. Login attempts for
//! unknown usernames still run a verification against a dummy hash to keep
//! response times uniform.

mod flash;
mod forms;
mod password;
pub(crate) mod principal;
pub(crate) mod session;
mod state;
pub(crate) mod storage;
mod utils;

pub use flash::{Flash, FlashCategory};
pub use forms::{AccountLookup, Credentials, FieldErrors, LoginForm, NewAccount, RegistrationForm};
pub use state::AuthConfig;
pub use storage::Account;

pub(crate) use flash::{consume_flashes, flash_cookie};
pub(crate) use forms::MSG_USERNAME_TAKEN;
pub(crate) use password::{hash_password, verify_dummy, verify_password};
