use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::application::auth::{AccessControl, AuthError, IssuedToken};
use crate::application::listings::ListingCache;
use crate::application::passwords::{
    PasswordError, hash_password_blocking, verify_password_blocking,
};
use crate::application::repos::RepoError;
use crate::domain::entities::NewUser;
use crate::domain::error::DomainError;
use crate::domain::types::Role;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("an account with this email already exists")]
    EmailTaken,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub email: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct LoginCommand {
    pub id: Uuid,
    pub password: String,
}

/// Registration, password login and role-only test login.
#[derive(Clone)]
pub struct AccountService {
    listings: ListingCache,
    access: Arc<AccessControl>,
}

impl AccountService {
    pub fn new(listings: ListingCache, access: Arc<AccessControl>) -> Self {
        Self { listings, access }
    }

    /// Token for a role without any account behind it.
    pub fn dummy_login(&self, role: Role) -> Result<IssuedToken, AccountError> {
        Ok(self.access.issue(role)?)
    }

    pub async fn register(&self, command: RegisterCommand) -> Result<Uuid, AccountError> {
        let email = normalize_email(&command.email)?;
        if command.password.is_empty() {
            return Err(DomainError::validation("password", "must not be empty").into());
        }

        let password_hash = hash_password_blocking(command.password).await?;
        let user = NewUser {
            id: Uuid::new_v4(),
            email,
            password_hash,
            role: command.role,
        };

        let saved = match self.listings.save_user(user).await {
            Ok(saved) => saved,
            Err(RepoError::Duplicate { .. }) => return Err(AccountError::EmailTaken),
            Err(err) => return Err(err.into()),
        };

        info!(
            target = "listings::accounts",
            user_id = %saved.id,
            role = %saved.role,
            "user registered"
        );
        Ok(saved.id)
    }

    pub async fn login(&self, command: LoginCommand) -> Result<IssuedToken, AccountError> {
        let Some(user) = self.listings.get_user_by_id(command.id).await? else {
            warn!(
                target = "listings::accounts",
                user_id = %command.id,
                "login for unknown user"
            );
            return Err(AccountError::InvalidCredentials);
        };

        if !verify_password_blocking(command.password, user.password_hash.clone()).await? {
            warn!(
                target = "listings::accounts",
                user_id = %user.id,
                "login with wrong password"
            );
            return Err(AccountError::InvalidCredentials);
        }

        Ok(self.access.issue(user.role)?)
    }
}

fn normalize_email(raw: &str) -> Result<String, DomainError> {
    let email = raw.trim();
    let invalid = || DomainError::validation("email", "must look like `name@domain`");

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    Ok(email.to_lowercase())
}
