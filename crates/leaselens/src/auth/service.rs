use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::repository::{RepositoryError, UserId, UserRecord, UserStore};
use super::token::{TokenError, TokenSigner};

const BCRYPT_COST: u32 = 10;

static USER_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_user_id() -> UserId {
    let id = USER_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    UserId(format!("user-{id:06}"))
}

/// Error raised by the account service.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Registration, login, and token refresh against the user store.
pub struct AccountService<S> {
    store: Arc<S>,
    signer: TokenSigner,
}

impl<S> AccountService<S>
where
    S: UserStore + 'static,
{
    pub fn new(store: Arc<S>, signer: TokenSigner) -> Self {
        Self { store, signer }
    }

    pub fn register(&self, username: &str, password: &str) -> Result<UserRecord, AccountError> {
        if self.store.find_by_username(username)?.is_some() {
            return Err(RepositoryError::Conflict.into());
        }

        let password_hash =
            bcrypt::hash(password, BCRYPT_COST).map_err(|err| AccountError::Hash(err.to_string()))?;
        let record = UserRecord {
            id: next_user_id(),
            username: username.to_string(),
            password_hash,
        };
        self.store.insert(record.clone())?;
        Ok(record)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<String, AccountError> {
        let user = self
            .store
            .find_by_username(username)?
            .ok_or(AccountError::InvalidCredentials)?;

        let matches = bcrypt::verify(password, &user.password_hash)
            .map_err(|err| AccountError::Hash(err.to_string()))?;
        if !matches {
            return Err(AccountError::InvalidCredentials);
        }

        Ok(self.signer.issue(&user)?)
    }

    /// Resolve a bearer token to the stored account.
    pub fn authenticate(&self, token: &str) -> Result<UserRecord, AccountError> {
        let claims = self.signer.verify(token)?;
        self.store
            .find_by_id(&claims.user_id())?
            .ok_or(RepositoryError::NotFound.into())
    }

    /// Issue a fresh seven-day token for the holder of a valid token.
    pub fn refresh(&self, token: &str) -> Result<(UserRecord, String), AccountError> {
        let user = self.authenticate(token)?;
        let token = self.signer.issue(&user)?;
        Ok((user, token))
    }
}
