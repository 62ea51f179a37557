#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Authentication gate for the landslide viewer.
//!
//! Users are documents keyed by username holding the SHA-256 hex digest of
//! their password. Registration refuses taken usernames; login compares
//! digests. A successful login opens a [`sessions::Session`].

pub mod sessions;
pub mod store;

use sha2::{Digest, Sha256};
use thiserror::Error;

pub use sessions::{DEFAULT_SESSION_TTL_HOURS, Session, SessionStore};
pub use store::{FileUserStore, MemoryUserStore, UserDocument, UserStore};

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password was empty.
    #[error("Username and password are required")]
    MissingFields,

    /// A user with this name already exists.
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    /// Unknown user or wrong password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// The user store could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The user store file is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// SHA-256 hex digest of `password`.
#[must_use]
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// Registers a new user.
///
/// # Errors
///
/// * [`AuthError::MissingFields`] if either field is empty
/// * [`AuthError::UsernameTaken`] if the user already exists
/// * store errors if the document cannot be written
pub async fn register(
    store: &dyn UserStore,
    username: &str,
    password: &str,
) -> Result<(), AuthError> {
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::MissingFields);
    }

    let document = UserDocument {
        password: hash_password(password),
    };

    if !store.insert_new(username, document).await? {
        return Err(AuthError::UsernameTaken(username.to_string()));
    }

    log::info!("Registered user {username}");
    Ok(())
}

/// Checks a username and password against the store.
///
/// # Errors
///
/// * [`AuthError::MissingFields`] if either field is empty
/// * [`AuthError::InvalidCredentials`] if the user is unknown or the
///   password does not match
/// * store errors if the document cannot be read
pub async fn login(store: &dyn UserStore, username: &str, password: &str) -> Result<(), AuthError> {
    if username.is_empty() || password.is_empty() {
        return Err(AuthError::MissingFields);
    }

    match store.get(username).await? {
        Some(document) if document.password == hash_password(password) => Ok(()),
        _ => {
            log::warn!("Failed login for {username}");
            Err(AuthError::InvalidCredentials)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_with_sha256_hex() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn register_then_login() {
        let store = MemoryUserStore::default();
        register(&store, "surveyor", "longsor123").await.unwrap();

        assert!(login(&store, "surveyor", "longsor123").await.is_ok());
        assert!(matches!(
            login(&store, "surveyor", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            login(&store, "nobody", "longsor123").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn register_rejects_taken_and_empty() {
        let store = MemoryUserStore::default();
        register(&store, "surveyor", "a").await.unwrap();

        assert!(matches!(
            register(&store, "surveyor", "b").await,
            Err(AuthError::UsernameTaken(_))
        ));
        assert!(matches!(
            register(&store, "", "b").await,
            Err(AuthError::MissingFields)
        ));
        assert!(matches!(
            login(&store, "surveyor", "").await,
            Err(AuthError::MissingFields)
        ));
        // The original password still works.
        assert!(login(&store, "surveyor", "a").await.is_ok());
    }
}
