//! Account verification for logins and destructive operations.
//!
//! Passwords are only ever held as Argon2 PHC strings; plaintext is hashed or
//! verified and then dropped.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand_core::OsRng;

use super::Config;

/// A login attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// The account name.
    pub username: String,
    /// The plaintext password.
    pub password: String,
}

impl Credentials {
    /// Bundle a username and password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Decides whether credentials are acceptable.
pub trait CredentialVerifier {
    /// Whether `credentials` identify the account.
    fn verify(&self, credentials: &Credentials) -> bool;

    /// Whether `password` is the account password.
    ///
    /// Used to confirm destructive operations once the user is logged in.
    fn confirm(&self, password: &str) -> bool;
}

/// Verifies credentials against a single account with an Argon2 password
/// hash.
#[derive(Debug, Clone)]
pub struct Argon2Verifier {
    username: String,
    password_hash: String,
}

impl Argon2Verifier {
    /// Create a verifier for `username`, whose password hashes to
    /// `password_hash`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidHash`] if `password_hash` is not a
    /// valid PHC string.
    pub fn new(username: String, password_hash: String) -> Result<Self, CredentialError> {
        PasswordHash::new(&password_hash).map_err(|_| CredentialError::InvalidHash)?;
        Ok(Self {
            username,
            password_hash,
        })
    }

    /// Create a verifier for the account held in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::NoAccount`] if no account has been set up,
    /// or [`CredentialError::InvalidHash`] if the stored hash is malformed.
    pub fn from_config(config: &Config) -> Result<Self, CredentialError> {
        let hash = config.password_hash().ok_or(CredentialError::NoAccount)?;
        Self::new(config.username.clone(), hash.to_string())
    }

    /// The account name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn verify(&self, credentials: &Credentials) -> bool {
        // hash first, even for an unknown username
        let password_ok = self.confirm(&credentials.password);
        password_ok && credentials.username == self.username
    }

    fn confirm(&self, password: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(&self.password_hash) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

/// Errors raised while setting up credentials.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialError {
    /// No account has been configured.
    #[error("no account has been set up; run `assign init` first")]
    NoAccount,

    /// The stored password hash is not a valid PHC string.
    #[error("the stored password hash is malformed")]
    InvalidHash,

    /// The password could not be hashed.
    #[error("failed to hash password: {0}")]
    Hashing(String),
}

/// Errors raised when logging in.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    /// The username or password was wrong.
    #[error("invalid username or password")]
    InvalidCredentials,
}

/// Proof of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    username: String,
}

impl Session {
    /// The logged-in account.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }
}

/// Log in with `credentials`.
///
/// # Errors
///
/// Returns [`AuthError::InvalidCredentials`] if the verifier rejects the
/// credentials.
pub fn login(
    verifier: &impl CredentialVerifier,
    credentials: &Credentials,
) -> Result<Session, AuthError> {
    if verifier.verify(credentials) {
        tracing::info!(username = %credentials.username, "logged in");
        Ok(Session {
            username: credentials.username.clone(),
        })
    } else {
        tracing::debug!(username = %credentials.username, "login rejected");
        Err(AuthError::InvalidCredentials)
    }
}

/// Hash `password` with Argon2id and a fresh random salt.
///
/// # Errors
///
/// Returns [`CredentialError::Hashing`] if hashing fails.
pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CredentialError::Hashing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn verifier() -> Argon2Verifier {
        Argon2Verifier::new("nimra".to_string(), hash_password("s3cret").unwrap()).unwrap()
    }

    #[test]
    fn hashes_are_salted() {
        let first = hash_password("s3cret").unwrap();
        let second = hash_password("s3cret").unwrap();
        assert_ne!(first, second);
        assert!(!first.contains("s3cret"));
    }

    #[test_case("nimra", "s3cret", true; "correct")]
    #[test_case("nimra", "wrong", false; "wrong password")]
    #[test_case("other", "s3cret", false; "wrong username")]
    #[test_case("", "", false; "empty")]
    fn verifies_credentials(username: &str, password: &str, expected: bool) {
        assert_eq!(
            verifier().verify(&Credentials::new(username, password)),
            expected
        );
    }

    #[test]
    fn confirm_checks_password_only() {
        let verifier = verifier();
        assert!(verifier.confirm("s3cret"));
        assert!(!verifier.confirm("S3CRET"));
    }

    #[test]
    fn login_returns_session() {
        let session = login(&verifier(), &Credentials::new("nimra", "s3cret")).unwrap();
        assert_eq!(session.username(), "nimra");
    }

    #[test]
    fn login_rejects_bad_credentials() {
        let error = login(&verifier(), &Credentials::new("nimra", "nope")).unwrap_err();
        assert_eq!(error, AuthError::InvalidCredentials);
    }

    #[test]
    fn malformed_hash_is_rejected() {
        let error = Argon2Verifier::new("nimra".to_string(), "plaintext".to_string()).unwrap_err();
        assert_eq!(error, CredentialError::InvalidHash);
    }

    #[test]
    fn config_without_account_has_no_verifier() {
        let error = Argon2Verifier::from_config(&Config::default()).unwrap_err();
        assert_eq!(error, CredentialError::NoAccount);
    }

    #[test]
    fn config_account_is_verified() {
        let mut config = Config::default();
        config.set_account("nimra".to_string(), hash_password("s3cret").unwrap());

        let verifier = Argon2Verifier::from_config(&config).unwrap();
        assert_eq!(verifier.username(), "nimra");
        assert!(verifier.verify(&Credentials::new("nimra", "s3cret")));
    }
}
