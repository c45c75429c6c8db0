//! User accounts and bearer-token auth.

pub mod repository;
pub mod router;
pub mod service;
pub mod token;

pub use repository::{RepositoryError, UserId, UserRecord, UserStore};
pub use router::account_router;
pub use service::{AccountError, AccountService};
pub use token::{Claims, TokenSigner, TOKEN_VALIDITY_DAYS};
