//! Pluggable external identity providers.
//!
//! A provider wraps whatever verification call an external identity system
//! exposes (an OIDC token endpoint, an SDK, ...) and maps its result onto an
//! [`ExternalIdentity`]. Providers are registered on the engine by name and
//! selected per call.

use async_trait::async_trait;

use crate::errors::AuthError;

/// A verified identity returned by a provider exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Stable subject identifier within the provider's namespace.
    pub subject: String,
    /// Username the linked principal is registered under.
    pub username: String,
    /// Role applied when the linked principal is first created.
    pub role_id: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Name this provider registers under (e.g. "google").
    fn name(&self) -> &str;

    /// Exchange a provider-issued credential for a verified identity.
    ///
    /// A rejected or malformed credential should come back as
    /// [`AuthError::ProviderExchange`].
    async fn exchange(&self, token: &str) -> Result<ExternalIdentity, AuthError>;
}

/// Principal id a provider identity is linked under.
///
/// The provider name is part of the id, so "google subject 42" and
/// "github subject 42" stay distinct accounts.
pub fn linked_principal_id(provider: &str, subject: &str) -> String {
    format!("{}:{}", provider, subject)
}
