//! The authentication engine: account lifecycle, credential checks and
//! token issuance, over the storage layer.

use std::collections::HashMap;
use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::errors::AuthError;
use crate::password;
use crate::providers::{linked_principal_id, IdentityProvider};
use crate::settings::{PasswordPolicy, Settings, StaticUser};
use crate::storage::{self, ListResult, NewPrincipal, Principal, QueryOpts};
use crate::tokens::{Token, TokenSigner};

#[derive(Clone)]
pub struct AuthEngine {
    db: DatabaseConnection,
    signer: TokenSigner,
    policy: PasswordPolicy,
    static_users: Vec<StaticUser>,
    providers: HashMap<String, Arc<dyn IdentityProvider>>,
}

impl AuthEngine {
    pub fn new(db: DatabaseConnection, signer: TokenSigner, settings: &Settings) -> Self {
        Self {
            db,
            signer,
            policy: settings.password.clone(),
            static_users: settings.static_users.clone(),
            providers: HashMap::new(),
        }
    }

    /// Register an identity provider under its own name.
    pub fn with_provider(mut self, provider: Arc<dyn IdentityProvider>) -> Self {
        self.providers.insert(provider.name().to_string(), provider);
        self
    }

    /// The underlying connection, for callers that combine engine calls with
    /// grant management.
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    fn provider(&self, name: &str) -> Result<&Arc<dyn IdentityProvider>, AuthError> {
        self.providers
            .get(name)
            .ok_or_else(|| AuthError::UnknownProvider(name.to_string()))
    }

    // Account lifecycle

    /// Register a new principal. Fails on a taken username or a password the
    /// policy rejects; does not sign the principal in.
    pub async fn sign_up(&self, input: &NewPrincipal) -> Result<Principal, AuthError> {
        if storage::get_principal_by_username(&self.db, &input.username)
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken(input.username.clone()));
        }
        self.policy.check(&input.password)?;

        let principal = storage::create_principal(&self.db, input).await?;
        tracing::info!("Registered principal: {}", principal.username);
        Ok(principal)
    }

    /// Register (or return) the principal linked to an external identity.
    ///
    /// Re-registering the same identity is a no-op that returns the linked
    /// account. The local credential is random, so password sign-in stays
    /// unusable until an explicit password change.
    pub async fn sign_up_with_provider(
        &self,
        provider: &str,
        provider_token: &str,
    ) -> Result<Principal, AuthError> {
        let identity = self.provider(provider)?.exchange(provider_token).await?;
        let uid = linked_principal_id(provider, &identity.subject);

        if let Some(existing) = storage::get_principal_by_id(&self.db, &uid).await? {
            return Ok(existing);
        }
        if storage::get_principal_by_username(&self.db, &identity.username)
            .await?
            .is_some()
        {
            return Err(AuthError::UsernameTaken(identity.username));
        }

        let input = NewPrincipal {
            id: Some(uid),
            username: identity.username,
            password: storage::random_id(),
            role_id: identity.role_id.unwrap_or_default(),
        };
        let principal = storage::create_principal(&self.db, &input).await?;
        tracing::info!(
            "Linked {} identity as principal: {}",
            provider,
            principal.username
        );
        Ok(principal)
    }

    /// Remove an account. Grants addressed to it are left in place; they stop
    /// mattering once no principal carries the id.
    pub async fn delete(&self, id: &str) -> Result<(), AuthError> {
        storage::delete_principal(&self.db, id).await?;
        tracing::info!("Deleted principal: {}", id);
        Ok(())
    }

    // Sign-in and verification

    /// Authenticate with username/password and issue a bearer token.
    pub async fn sign_in(&self, username: &str, password_plain: &str) -> Result<Token, AuthError> {
        let principal = storage::get_principal_by_username(&self.db, username)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        if !password::verify_password(password_plain, &principal.password_hash)? {
            return Err(AuthError::InvalidCredential);
        }

        tracing::debug!("Issued token for principal: {}", principal.username);
        self.signer.issue(&principal)
    }

    /// Authenticate through an external provider and issue a bearer token.
    /// The identity must have been registered first.
    pub async fn sign_in_with_provider(
        &self,
        provider: &str,
        provider_token: &str,
    ) -> Result<Token, AuthError> {
        let identity = self.provider(provider)?.exchange(provider_token).await?;
        let uid = linked_principal_id(provider, &identity.subject);

        let principal = storage::get_principal_by_id(&self.db, &uid)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;
        self.signer.issue(&principal)
    }

    /// Verify a bearer token and return the current principal record.
    ///
    /// Claims inside the token may be stale; the record comes fresh from the
    /// store, and a token for a deleted account fails here.
    pub async fn verify(&self, jwt: &str) -> Result<Principal, AuthError> {
        let claims = self.signer.verify(jwt)?;
        storage::get_principal_by_id(&self.db, &claims.user_id)
            .await?
            .ok_or(AuthError::PrincipalNotFound)
    }

    /// Whether an account with this id currently exists.
    pub async fn check_auth(&self, id: &str) -> Result<bool, AuthError> {
        Ok(storage::get_principal_by_id(&self.db, id).await?.is_some())
    }

    /// Whether the account linked to this provider identity exists. A failed
    /// exchange is an error, not a negative answer.
    pub async fn check_auth_with_provider(
        &self,
        provider: &str,
        provider_token: &str,
    ) -> Result<bool, AuthError> {
        let identity = self.provider(provider)?.exchange(provider_token).await?;
        let uid = linked_principal_id(provider, &identity.subject);
        Ok(storage::get_principal_by_id(&self.db, &uid).await?.is_some())
    }

    // Account maintenance

    /// Change a password after verifying the old one. The new password must
    /// pass policy; nothing is written when any step fails.
    pub async fn change_password(
        &self,
        id: &str,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let mut principal = storage::get_principal_by_id(&self.db, id)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        if !password::verify_password(old_password, &principal.password_hash)? {
            return Err(AuthError::InvalidCredential);
        }
        self.policy.check(new_password)?;

        principal.password_hash = password::hash_password(new_password)?;
        storage::update_principal(&self.db, &principal).await?;
        tracing::info!("Changed password for principal: {}", principal.username);
        Ok(())
    }

    /// Reassign an account's role. Takes effect on the next token issuance
    /// and on every verify, which re-reads the record.
    pub async fn change_role(&self, id: &str, role_id: &str) -> Result<(), AuthError> {
        let mut principal = storage::get_principal_by_id(&self.db, id)
            .await?
            .ok_or(AuthError::PrincipalNotFound)?;

        principal.role_id = role_id.to_string();
        storage::update_principal(&self.db, &principal).await?;
        tracing::info!("Changed role for principal {} to {}", id, role_id);
        Ok(())
    }

    // Lookups

    pub async fn get_by_id(&self, id: &str) -> Result<Principal, AuthError> {
        storage::get_principal_by_id(&self.db, id)
            .await?
            .ok_or(AuthError::PrincipalNotFound)
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Principal, AuthError> {
        storage::get_principal_by_username(&self.db, username)
            .await?
            .ok_or(AuthError::PrincipalNotFound)
    }

    pub async fn list(&self, opts: QueryOpts) -> Result<ListResult<Principal>, AuthError> {
        storage::list_principals(&self.db, opts).await
    }

    // Static users

    /// The configured static users, as configured (plaintext passwords).
    pub fn static_user_list(&self) -> &[StaticUser] {
        &self.static_users
    }

    /// The configured static users keyed by username.
    pub fn static_user_map(&self) -> HashMap<String, StaticUser> {
        self.static_users
            .iter()
            .map(|u| (u.username.clone(), u.clone()))
            .collect()
    }
}
