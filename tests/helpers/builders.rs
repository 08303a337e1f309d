use perigee::storage;
use sea_orm::DatabaseConnection;

/// Builder for creating test principals
pub struct PrincipalBuilder {
    id: Option<String>,
    username: String,
    password: String,
    role_id: String,
}

impl PrincipalBuilder {
    pub fn new(username: &str) -> Self {
        Self {
            id: None,
            username: username.to_string(),
            password: "password123".to_string(),
            role_id: "member".to_string(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = password.to_string();
        self
    }

    pub fn with_role(mut self, role_id: &str) -> Self {
        self.role_id = role_id.to_string();
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> storage::Principal {
        storage::create_principal(
            db,
            &storage::NewPrincipal {
                id: self.id,
                username: self.username,
                password: self.password,
                role_id: self.role_id,
            },
        )
        .await
        .expect("Failed to create test principal")
    }
}

/// Builder for creating test grants
pub struct GrantBuilder {
    role_id: Option<String>,
    user_id: Option<String>,
    resource: String,
    payload: String,
}

impl GrantBuilder {
    /// Grant addressed to every principal holding a role
    pub fn for_role(role_id: &str) -> Self {
        Self {
            role_id: Some(role_id.to_string()),
            user_id: None,
            resource: "articles".to_string(),
            payload: "read".to_string(),
        }
    }

    /// Grant addressed to one principal directly
    pub fn for_user(user_id: &str) -> Self {
        Self {
            role_id: None,
            user_id: Some(user_id.to_string()),
            resource: "articles".to_string(),
            payload: "read".to_string(),
        }
    }

    pub fn on(mut self, resource: &str, payload: &str) -> Self {
        self.resource = resource.to_string();
        self.payload = payload.to_string();
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> storage::Aci {
        storage::create_aci(
            db,
            &storage::NewAci {
                role_id: self.role_id,
                user_id: self.user_id,
                resource: self.resource,
                payload: self.payload,
            },
        )
        .await
        .expect("Failed to create test grant")
    }
}
