//! Account records and the signed-in marker kept in durable client storage.
//!
//! Credentials are stored as entered. This only gates which history a
//! browser shows; it is not a security boundary.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::favorites::favorites_key;
use crate::history::{history_key, DEFAULT_USER};
use crate::storage::{read_json, write_json, KeyValueStore, StorageError};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const CURRENT_USER_KEY: &str = "currentUser";

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

fn user_key(username: &str) -> String {
    format!("user_{username}")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    pub user: User,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please fill in all information!")]
    MissingFields,
    #[error("Username must be at least 3 characters!")]
    UsernameTooShort,
    #[error("Password must be at least 6 characters!")]
    PasswordTooShort,
    #[error("Username already exists! Please choose another name.")]
    UsernameTaken,
    #[error("Invalid email!")]
    InvalidEmail,
    #[error("Username does not exist!")]
    UnknownUser,
    #[error("Incorrect password!")]
    WrongPassword,
    #[error("Please sign in first!")]
    NotSignedIn,
    #[error("Username and Email cannot be empty!")]
    MissingProfileFields,
    #[error("New password must be at least 6 characters long!")]
    NewPasswordTooShort,
    #[error("⚠️ Passwords do not match! Please type them again.")]
    PasswordMismatch,
    #[error("New username is already taken! Please choose another name.")]
    NewUsernameTaken,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Validate and register a new account. Nothing is written unless every
/// check passes.
pub fn sign_up(
    store: &dyn KeyValueStore,
    username: &str,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> Result<User, AuthError> {
    let (username, email, password) = (username.trim(), email.trim(), password.trim());

    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingFields);
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AuthError::UsernameTooShort);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }
    if store.get(&user_key(username)).is_some() {
        return Err(AuthError::UsernameTaken);
    }
    if !EMAIL_RE.is_match(email) {
        return Err(AuthError::InvalidEmail);
    }

    let user = User {
        username: username.to_string(),
        email: email.to_string(),
        password: password.to_string(),
        created_at: now,
    };
    write_json(store, &user_key(username), &user)?;
    tracing::info!(username, "account created");
    Ok(user)
}

/// Check credentials and write the signed-in marker.
pub fn sign_in(store: &dyn KeyValueStore, username: &str, password: &str) -> Result<AuthSession, AuthError> {
    let username = username.trim();
    let user: User = read_json(store, &user_key(username)).ok_or(AuthError::UnknownUser)?;
    if user.password != password.trim() {
        return Err(AuthError::WrongPassword);
    }

    let access_token = uuid::Uuid::new_v4().to_string();
    store.set(ACCESS_TOKEN_KEY, &access_token)?;
    write_json(store, CURRENT_USER_KEY, &user)?;
    tracing::info!(username, "signed in");
    Ok(AuthSession { access_token, user })
}

/// Edits submitted from the profile form. An empty `new_password` keeps the
/// current one.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileChange {
    pub session: AuthSession,
    pub password_changed: bool,
}

impl ProfileChange {
    pub fn message(&self) -> String {
        let mut message = String::from("Profile updated successfully! ✅");
        if self.password_changed {
            message.push_str("\nYour password has been changed.");
        }
        message
    }
}

/// Move whatever is stored under `from` to `to`.
fn move_value(store: &dyn KeyValueStore, from: &str, to: &str) -> Result<(), StorageError> {
    if let Some(raw) = store.get(from) {
        store.set(to, &raw)?;
        store.remove(from);
    }
    Ok(())
}

/// Update the signed-in account. Nothing is written unless every check
/// passes. A rename carries the user's history and favorites along and
/// issues a fresh access token.
pub fn update_profile(store: &dyn KeyValueStore, update: &ProfileUpdate) -> Result<ProfileChange, AuthError> {
    let current = current_session(store).ok_or(AuthError::NotSignedIn)?.user;
    let (username, email) = (update.username.trim(), update.email.trim());
    let new_password = update.new_password.trim();

    if username.is_empty() || email.is_empty() {
        return Err(AuthError::MissingProfileFields);
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(AuthError::UsernameTooShort);
    }
    if !EMAIL_RE.is_match(email) {
        return Err(AuthError::InvalidEmail);
    }
    if !new_password.is_empty() {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::NewPasswordTooShort);
        }
        if new_password != update.confirm_password.trim() {
            return Err(AuthError::PasswordMismatch);
        }
    }
    let renamed = username != current.username;
    if renamed && store.get(&user_key(username)).is_some() {
        return Err(AuthError::NewUsernameTaken);
    }

    let password_changed = !new_password.is_empty();
    let user = User {
        username: username.to_string(),
        email: email.to_string(),
        password: if password_changed {
            new_password.to_string()
        } else {
            current.password.clone()
        },
        created_at: current.created_at,
    };

    write_json(store, &user_key(username), &user)?;
    if renamed {
        store.remove(&user_key(&current.username));
        move_value(store, &history_key(&current.username), &history_key(username))?;
        move_value(store, &favorites_key(&current.username), &favorites_key(username))?;
    }
    let access_token = uuid::Uuid::new_v4().to_string();
    store.set(ACCESS_TOKEN_KEY, &access_token)?;
    write_json(store, CURRENT_USER_KEY, &user)?;
    tracing::info!(from = %current.username, to = username, password_changed, "profile updated");

    Ok(ProfileChange {
        session: AuthSession { access_token, user },
        password_changed,
    })
}

pub fn sign_out(store: &dyn KeyValueStore) {
    store.remove(ACCESS_TOKEN_KEY);
    store.remove(CURRENT_USER_KEY);
}

/// The signed-in session, if both markers are present and readable.
pub fn current_session(store: &dyn KeyValueStore) -> Option<AuthSession> {
    let access_token = store.get(ACCESS_TOKEN_KEY)?;
    let user: User = read_json(store, CURRENT_USER_KEY)?;
    Some(AuthSession { access_token, user })
}

/// Name whose history is shown: the signed-in user or [`DEFAULT_USER`].
pub fn current_username(store: &dyn KeyValueStore) -> String {
    current_session(store)
        .map(|s| s.user.username)
        .unwrap_or_else(|| DEFAULT_USER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn register(store: &MemoryStore) -> User {
        sign_up(store, "  linh ", "linh@example.vn", "secret1", Utc::now()).unwrap()
    }

    #[test]
    fn test_sign_up_trims_and_stores_user() {
        let store = MemoryStore::new();
        let user = register(&store);
        assert_eq!(user.username, "linh");
        assert!(store.get("user_linh").is_some());
    }

    #[test]
    fn test_sign_up_validation_order_and_no_write_on_failure() {
        let store = MemoryStore::new();
        let now = Utc::now();
        assert!(matches!(sign_up(&store, "", "a@b.c", "secret1", now), Err(AuthError::MissingFields)));
        assert!(matches!(sign_up(&store, "ab", "a@b.c", "secret1", now), Err(AuthError::UsernameTooShort)));
        assert!(matches!(sign_up(&store, "abc", "a@b.c", "12345", now), Err(AuthError::PasswordTooShort)));
        assert!(matches!(sign_up(&store, "abc", "not-an-email", "123456", now), Err(AuthError::InvalidEmail)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_sign_up_rejects_taken_username() {
        let store = MemoryStore::new();
        register(&store);
        let err = sign_up(&store, "linh", "other@example.vn", "secret2", Utc::now()).unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));
    }

    #[test]
    fn test_sign_in_writes_session_marker() {
        let store = MemoryStore::new();
        register(&store);
        let session = sign_in(&store, "linh", "secret1").unwrap();
        assert!(!session.access_token.is_empty());

        let current = current_session(&store).unwrap();
        assert_eq!(current.access_token, session.access_token);
        assert_eq!(current_username(&store), "linh");
    }

    #[test]
    fn test_sign_in_distinguishes_unknown_user_and_wrong_password() {
        let store = MemoryStore::new();
        register(&store);
        assert!(matches!(sign_in(&store, "nobody", "secret1"), Err(AuthError::UnknownUser)));
        assert!(matches!(sign_in(&store, "linh", "wrong!!"), Err(AuthError::WrongPassword)));
        assert!(current_session(&store).is_none());
    }

    #[test]
    fn test_sign_out_falls_back_to_default_user() {
        let store = MemoryStore::new();
        register(&store);
        sign_in(&store, "linh", "secret1").unwrap();
        sign_out(&store);
        assert!(current_session(&store).is_none());
        assert_eq!(current_username(&store), DEFAULT_USER);
    }

    fn edit(username: &str, email: &str, new_password: &str, confirm_password: &str) -> ProfileUpdate {
        ProfileUpdate {
            username: username.into(),
            email: email.into(),
            new_password: new_password.into(),
            confirm_password: confirm_password.into(),
        }
    }

    #[test]
    fn test_update_profile_requires_session() {
        let store = MemoryStore::new();
        register(&store);
        let err = update_profile(&store, &edit("linh", "linh@example.vn", "", "")).unwrap_err();
        assert!(matches!(err, AuthError::NotSignedIn));
    }

    #[test]
    fn test_update_profile_validation_order_and_no_write_on_failure() {
        let store = MemoryStore::new();
        register(&store);
        sign_up(&store, "minh", "minh@example.vn", "secret2", Utc::now()).unwrap();
        let before = sign_in(&store, "linh", "secret1").unwrap();

        let cases = [
            (edit("", "linh@example.vn", "", ""), "Username and Email cannot be empty!"),
            (edit("li", "bad", "", ""), "Username must be at least 3 characters!"),
            (edit("linh", "bad", "12", ""), "Invalid email!"),
            (edit("minh", "linh@example.vn", "12345", "12345"), "New password must be at least 6 characters long!"),
            (edit("minh", "linh@example.vn", "secret9", "secret8"), "⚠️ Passwords do not match! Please type them again."),
            (edit("minh", "linh@example.vn", "", ""), "New username is already taken! Please choose another name."),
        ];
        for (update, message) in cases {
            assert_eq!(update_profile(&store, &update).unwrap_err().to_string(), message);
        }

        let after = current_session(&store).unwrap();
        assert_eq!(after, before);
        let stored: User = read_json(&store, "user_linh").unwrap();
        assert_eq!(stored.password, "secret1");
    }

    #[test]
    fn test_update_profile_keeps_password_when_blank() {
        let store = MemoryStore::new();
        register(&store);
        let before = sign_in(&store, "linh", "secret1").unwrap();

        let change = update_profile(&store, &edit("linh", "linh@new.vn", "", "")).unwrap();
        assert!(!change.password_changed);
        assert_eq!(change.message(), "Profile updated successfully! ✅");
        assert_eq!(change.session.user.password, "secret1");
        assert_eq!(change.session.user.email, "linh@new.vn");
        assert_ne!(change.session.access_token, before.access_token);
        assert_eq!(current_session(&store).unwrap(), change.session);
    }

    #[test]
    fn test_rename_moves_account_history_and_favorites() {
        let store = MemoryStore::new();
        let created = register(&store);
        sign_in(&store, "linh", "secret1").unwrap();
        store.set(&history_key("linh"), "[]").unwrap();
        store.set(&favorites_key("linh"), "[]").unwrap();

        let change = update_profile(&store, &edit("linh2", "linh@example.vn", "newpass", "newpass")).unwrap();
        assert!(change.password_changed);
        assert!(change.message().ends_with("\nYour password has been changed."));
        assert_eq!(change.session.user.created_at, created.created_at);

        assert!(store.get("user_linh").is_none());
        assert!(store.get(&history_key("linh")).is_none());
        assert!(store.get(&favorites_key("linh")).is_none());
        assert_eq!(store.get(&history_key("linh2")).as_deref(), Some("[]"));
        assert_eq!(store.get(&favorites_key("linh2")).as_deref(), Some("[]"));
        assert_eq!(current_username(&store), "linh2");
        assert!(sign_in(&store, "linh2", "newpass").is_ok());
    }

    #[test]
    fn test_corrupt_current_user_counts_as_signed_out() {
        let store = MemoryStore::new();
        store.set(ACCESS_TOKEN_KEY, "token").unwrap();
        store.set(CURRENT_USER_KEY, "{broken").unwrap();
        assert!(current_session(&store).is_none());
    }
}
