use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password, PasswordError};
use crate::database::models::{Registration, User};
use crate::database::{DatabaseError, UserRepository};

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("{0}")]
    Validation(String),

    #[error("This confirmed password does not match")]
    PasswordMismatch,

    #[error("This email has already registered")]
    EmailTaken,

    #[error("This username is already taken")]
    UsernameTaken,

    #[error("Incorrect Email or password")]
    InvalidCredentials,

    #[error(transparent)]
    Hashing(#[from] PasswordError),

    #[error(transparent)]
    Database(DatabaseError),
}

impl From<DatabaseError> for CredentialError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Duplicate("username") => CredentialError::UsernameTaken,
            DatabaseError::Duplicate(_) => CredentialError::EmailTaken,
            other => CredentialError::Database(other),
        }
    }
}

/// User registration and password login
#[derive(Clone)]
pub struct CredentialService {
    users: Arc<dyn UserRepository>,
}

impl CredentialService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    pub async fn register(&self, registration: &Registration) -> Result<User, CredentialError> {
        if registration.password != registration.confirmed_password {
            return Err(CredentialError::PasswordMismatch);
        }
        validate_registration(registration)?;

        if self.users.find_by_email(&registration.email).await?.is_some() {
            return Err(CredentialError::EmailTaken);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: registration.username.trim().to_string(),
            email: registration.email.clone(),
            password_hash: hash_password(&registration.password)?,
            created_at: Utc::now().trunc_subsecs(6),
        };

        // The unique constraints still decide races between concurrent registrations
        self.users.insert(&user).await?;

        info!("Registered user {} <{}>", user.username, user.email);
        Ok(user)
    }

    /// Lookup and hash failures are indistinguishable to the caller
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, CredentialError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            warn!("Login failed: unknown email");
            return Err(CredentialError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash) {
            warn!("Login failed: wrong password for user {}", user.id);
            return Err(CredentialError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, CredentialError> {
        Ok(self.users.find_by_email(email).await?)
    }
}

fn validate_registration(registration: &Registration) -> Result<(), CredentialError> {
    if registration.username.trim().is_empty() {
        return Err(CredentialError::Validation("Username must not be empty".to_string()));
    }
    if !is_valid_email(&registration.email) {
        return Err(CredentialError::Validation("Invalid email address".to_string()));
    }
    if registration.password.is_empty() {
        return Err(CredentialError::Validation("Password must not be empty".to_string()));
    }
    Ok(())
}

/// `local@domain.tld` with no whitespace
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && !tld.is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryUserRepository;

    fn service() -> CredentialService {
        CredentialService::new(Arc::new(MemoryUserRepository::new()))
    }

    fn registration(username: &str, email: &str) -> Registration {
        Registration {
            username: username.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
            confirmed_password: "password123".to_string(),
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@mail.example.org"));
        for bad in ["", "ax.com", "@x.com", "a@x", "a@.com", "a@x.", "a b@x.com", "a@b@x.com"] {
            assert!(!is_valid_email(bad), "{bad}");
        }
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let credentials = service();
        let user = credentials.register(&registration("alice", "a@x.com")).await.unwrap();
        assert_ne!(user.password_hash, "password123");

        let logged_in = credentials.authenticate("a@x.com", "password123").await.unwrap();
        assert_eq!(logged_in.id, user.id);
    }

    #[tokio::test]
    async fn mismatched_confirmation_creates_nobody() {
        let credentials = service();
        let mut reg = registration("alice", "a@x.com");
        reg.confirmed_password = "password124".to_string();

        assert!(matches!(credentials.register(&reg).await, Err(CredentialError::PasswordMismatch)));
        assert!(credentials.find_by_email("a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_and_username_rejected() {
        let credentials = service();
        credentials.register(&registration("alice", "a@x.com")).await.unwrap();

        assert!(matches!(
            credentials.register(&registration("bob", "a@x.com")).await,
            Err(CredentialError::EmailTaken)
        ));
        assert!(matches!(
            credentials.register(&registration("alice", "b@x.com")).await,
            Err(CredentialError::UsernameTaken)
        ));

        // Case-sensitive: a differently cased email is a different account
        assert!(credentials.register(&registration("carol", "A@x.com")).await.is_ok());
    }

    #[tokio::test]
    async fn bad_login_is_undifferentiated() {
        let credentials = service();
        credentials.register(&registration("alice", "a@x.com")).await.unwrap();

        let wrong_password = credentials.authenticate("a@x.com", "nope").await.unwrap_err();
        let unknown_email = credentials.authenticate("z@x.com", "password123").await.unwrap_err();
        assert!(matches!(wrong_password, CredentialError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn blank_username_rejected() {
        let credentials = service();
        assert!(matches!(
            credentials.register(&registration("   ", "a@x.com")).await,
            Err(CredentialError::Validation(_))
        ));
    }
}
