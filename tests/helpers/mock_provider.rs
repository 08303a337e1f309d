use async_trait::async_trait;
use perigee::errors::AuthError;
use perigee::providers::{ExternalIdentity, IdentityProvider};
use std::collections::HashMap;

/// Test double for an external identity provider: accepts a fixed set of
/// tokens and rejects everything else.
pub struct MockProvider {
    name: String,
    identities: HashMap<String, ExternalIdentity>,
}

impl MockProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            identities: HashMap::new(),
        }
    }

    pub fn with_identity(mut self, token: &str, subject: &str, username: &str) -> Self {
        self.identities.insert(
            token.to_string(),
            ExternalIdentity {
                subject: subject.to_string(),
                username: username.to_string(),
                role_id: None,
            },
        );
        self
    }

    pub fn with_identity_role(
        mut self,
        token: &str,
        subject: &str,
        username: &str,
        role_id: &str,
    ) -> Self {
        self.identities.insert(
            token.to_string(),
            ExternalIdentity {
                subject: subject.to_string(),
                username: username.to_string(),
                role_id: Some(role_id.to_string()),
            },
        );
        self
    }
}

#[async_trait]
impl IdentityProvider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exchange(&self, token: &str) -> Result<ExternalIdentity, AuthError> {
        self.identities
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::ProviderExchange(format!("unknown token: {}", token)))
    }
}
