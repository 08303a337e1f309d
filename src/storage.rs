use crate::entities;
use crate::errors::AuthError;
use crate::password;
use crate::settings::Database as DbCfg;
use base64ct::Encoding;
use chrono::Utc;
use rand::RngCore;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};

/// A stored account. `password_hash` is an Argon2id PHC string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role_id: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrincipal {
    /// Fixed principal id; a random one is assigned when omitted.
    pub id: Option<String>,
    pub username: String,
    /// Plaintext; hashed before the row is written.
    pub password: String,
    pub role_id: String,
}

/// A stored grant: the subject (a role or a single user) may act on
/// `resource` with `payload`. Exactly one of `role_id`/`user_id` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aci {
    pub id: String,
    pub role_id: Option<String>,
    pub user_id: Option<String>,
    pub resource: String,
    pub payload: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAci {
    pub role_id: Option<String>,
    pub user_id: Option<String>,
    pub resource: String,
    pub payload: String,
}

impl NewAci {
    /// Grant addressed to every principal holding `role_id`.
    pub fn for_role(role_id: &str, resource: &str, payload: &str) -> Self {
        Self {
            role_id: Some(role_id.to_string()),
            user_id: None,
            resource: resource.to_string(),
            payload: payload.to_string(),
        }
    }

    /// Grant addressed to one principal directly.
    pub fn for_user(user_id: &str, resource: &str, payload: &str) -> Self {
        Self {
            role_id: None,
            user_id: Some(user_id.to_string()),
            resource: resource.to_string(),
            payload: payload.to_string(),
        }
    }
}

/// Pagination options; `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOpts {
    pub page: u64,
    pub size: u64,
}

impl QueryOpts {
    pub fn new(page: u64, size: u64) -> Self {
        Self { page, size }
    }

    fn normalized(self) -> (u64, u64) {
        (self.page.max(1), self.size.max(1))
    }
}

impl Default for QueryOpts {
    fn default() -> Self {
        Self { page: 1, size: 20 }
    }
}

/// One page of results plus the index of the last non-empty page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub end_page: u64,
}

pub async fn init(cfg: &DbCfg) -> Result<DatabaseConnection, AuthError> {
    let db = Database::connect(&cfg.url).await?;
    Ok(db)
}

// Principal Functions

pub async fn create_principal(
    db: &DatabaseConnection,
    input: &NewPrincipal,
) -> Result<Principal, AuthError> {
    let id = input.id.clone().unwrap_or_else(random_id);
    let created_at = Utc::now().timestamp();
    let password_hash = password::hash_password(&input.password)?;

    let principal = entities::principal::ActiveModel {
        id: Set(id.clone()),
        username: Set(input.username.clone()),
        password_hash: Set(password_hash.clone()),
        role_id: Set(input.role_id.clone()),
        created_at: Set(created_at),
    };
    principal.insert(db).await?;

    Ok(Principal {
        id,
        username: input.username.clone(),
        password_hash,
        role_id: input.role_id.clone(),
        created_at,
    })
}

pub async fn get_principal_by_id(
    db: &DatabaseConnection,
    id: &str,
) -> Result<Option<Principal>, AuthError> {
    use entities::principal::{Column, Entity};

    let model = Entity::find().filter(Column::Id.eq(id)).one(db).await?;
    Ok(model.map(to_principal))
}

pub async fn get_principal_by_username(
    db: &DatabaseConnection,
    username: &str,
) -> Result<Option<Principal>, AuthError> {
    use entities::principal::{Column, Entity};

    let model = Entity::find()
        .filter(Column::Username.eq(username))
        .one(db)
        .await?;
    Ok(model.map(to_principal))
}

/// Exact-match lookup on the stored digest. Password verification goes
/// through [`crate::password::verify_password`] instead; salted hashes make
/// recomputing the digest from a plaintext impossible here.
pub async fn get_principal_by_username_and_hash(
    db: &DatabaseConnection,
    username: &str,
    password_hash: &str,
) -> Result<Option<Principal>, AuthError> {
    use entities::principal::{Column, Entity};

    let model = Entity::find()
        .filter(Column::Username.eq(username))
        .filter(Column::PasswordHash.eq(password_hash))
        .one(db)
        .await?;
    Ok(model.map(to_principal))
}

/// Overwrite the mutable fields of an existing principal row.
pub async fn update_principal(
    db: &DatabaseConnection,
    principal: &Principal,
) -> Result<(), AuthError> {
    use entities::principal::{Column, Entity};

    let model = Entity::find()
        .filter(Column::Id.eq(&principal.id))
        .one(db)
        .await?
        .ok_or(AuthError::PrincipalNotFound)?;

    let mut active: entities::principal::ActiveModel = model.into();
    active.username = Set(principal.username.clone());
    active.password_hash = Set(principal.password_hash.clone());
    active.role_id = Set(principal.role_id.clone());
    active.update(db).await?;

    Ok(())
}

pub async fn delete_principal(db: &DatabaseConnection, id: &str) -> Result<(), AuthError> {
    use entities::principal::{Column, Entity};

    let result = Entity::delete_many()
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AuthError::PrincipalNotFound);
    }
    Ok(())
}

/// Page through principals in a stable order. Pages past the end are empty;
/// `end_page` is 0 when the table is empty.
pub async fn list_principals(
    db: &DatabaseConnection,
    opts: QueryOpts,
) -> Result<ListResult<Principal>, AuthError> {
    use entities::principal::{Column, Entity};

    let (page, size) = opts.normalized();
    let paginator = Entity::find()
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .paginate(db, size);
    let end_page = paginator.num_pages().await?;
    let models = paginator.fetch_page(page - 1).await?;

    Ok(ListResult {
        items: models.into_iter().map(to_principal).collect(),
        end_page,
    })
}

// ACI Functions

pub async fn create_aci(db: &DatabaseConnection, input: &NewAci) -> Result<Aci, AuthError> {
    validate_grant(
        input.role_id.as_deref(),
        input.user_id.as_deref(),
        &input.resource,
        &input.payload,
    )?;

    let id = random_id();
    let created_at = Utc::now().timestamp();

    let aci = entities::aci::ActiveModel {
        id: Set(id.clone()),
        role_id: Set(input.role_id.clone()),
        user_id: Set(input.user_id.clone()),
        resource: Set(input.resource.clone()),
        payload: Set(input.payload.clone()),
        created_at: Set(created_at),
    };
    aci.insert(db).await?;

    Ok(Aci {
        id,
        role_id: input.role_id.clone(),
        user_id: input.user_id.clone(),
        resource: input.resource.clone(),
        payload: input.payload.clone(),
        created_at,
    })
}

pub async fn get_aci_by_id(db: &DatabaseConnection, id: &str) -> Result<Option<Aci>, AuthError> {
    use entities::aci::{Column, Entity};

    let model = Entity::find().filter(Column::Id.eq(id)).one(db).await?;
    Ok(model.map(to_aci))
}

pub async fn get_acis_by_resource(
    db: &DatabaseConnection,
    resource: &str,
) -> Result<Vec<Aci>, AuthError> {
    use entities::aci::{Column, Entity};

    let models = Entity::find()
        .filter(Column::Resource.eq(resource))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?;
    Ok(models.into_iter().map(to_aci).collect())
}

pub async fn get_acis_by_role_id(
    db: &DatabaseConnection,
    role_id: &str,
) -> Result<Vec<Aci>, AuthError> {
    use entities::aci::{Column, Entity};

    let models = Entity::find()
        .filter(Column::RoleId.eq(role_id))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?;
    Ok(models.into_iter().map(to_aci).collect())
}

pub async fn get_acis_by_user_id(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<Aci>, AuthError> {
    use entities::aci::{Column, Entity};

    let models = Entity::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?;
    Ok(models.into_iter().map(to_aci).collect())
}

pub async fn get_acis_by_payload(
    db: &DatabaseConnection,
    payload: &str,
) -> Result<Vec<Aci>, AuthError> {
    use entities::aci::{Column, Entity};

    let models = Entity::find()
        .filter(Column::Payload.eq(payload))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?;
    Ok(models.into_iter().map(to_aci).collect())
}

pub async fn get_acis_by_user_id_and_resource(
    db: &DatabaseConnection,
    user_id: &str,
    resource: &str,
) -> Result<Vec<Aci>, AuthError> {
    use entities::aci::{Column, Entity};

    let models = Entity::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::Resource.eq(resource))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?;
    Ok(models.into_iter().map(to_aci).collect())
}

pub async fn get_acis_by_user_id_and_payload(
    db: &DatabaseConnection,
    user_id: &str,
    payload: &str,
) -> Result<Vec<Aci>, AuthError> {
    use entities::aci::{Column, Entity};

    let models = Entity::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::Payload.eq(payload))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?;
    Ok(models.into_iter().map(to_aci).collect())
}

/// Overwrite the mutable fields of an existing grant row.
pub async fn update_aci(db: &DatabaseConnection, aci: &Aci) -> Result<(), AuthError> {
    use entities::aci::{Column, Entity};

    validate_grant(
        aci.role_id.as_deref(),
        aci.user_id.as_deref(),
        &aci.resource,
        &aci.payload,
    )?;

    let model = Entity::find()
        .filter(Column::Id.eq(&aci.id))
        .one(db)
        .await?
        .ok_or(AuthError::GrantNotFound)?;

    let mut active: entities::aci::ActiveModel = model.into();
    active.role_id = Set(aci.role_id.clone());
    active.user_id = Set(aci.user_id.clone());
    active.resource = Set(aci.resource.clone());
    active.payload = Set(aci.payload.clone());
    active.update(db).await?;

    Ok(())
}

pub async fn delete_aci(db: &DatabaseConnection, id: &str) -> Result<(), AuthError> {
    use entities::aci::{Column, Entity};

    let result = Entity::delete_many()
        .filter(Column::Id.eq(id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AuthError::GrantNotFound);
    }
    Ok(())
}

/// Page through grants in a stable order.
pub async fn list_acis(
    db: &DatabaseConnection,
    opts: QueryOpts,
) -> Result<ListResult<Aci>, AuthError> {
    use entities::aci::{Column, Entity};

    let (page, size) = opts.normalized();
    let paginator = Entity::find()
        .order_by_asc(Column::CreatedAt)
        .order_by_asc(Column::Id)
        .paginate(db, size);
    let end_page = paginator.num_pages().await?;
    let models = paginator.fetch_page(page - 1).await?;

    Ok(ListResult {
        items: models.into_iter().map(to_aci).collect(),
        end_page,
    })
}

/// True when any grant gives `role_id` access to `(resource, payload)`.
pub async fn check_aci_by_role_id(
    db: &DatabaseConnection,
    role_id: &str,
    resource: &str,
    payload: &str,
) -> Result<bool, AuthError> {
    use entities::aci::{Column, Entity};

    let count = Entity::find()
        .filter(Column::RoleId.eq(role_id))
        .filter(Column::Resource.eq(resource))
        .filter(Column::Payload.eq(payload))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// True when any grant gives `user_id` access to `(resource, payload)`.
pub async fn check_aci_by_user_id(
    db: &DatabaseConnection,
    user_id: &str,
    resource: &str,
    payload: &str,
) -> Result<bool, AuthError> {
    use entities::aci::{Column, Entity};

    let count = Entity::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::Resource.eq(resource))
        .filter(Column::Payload.eq(payload))
        .count(db)
        .await?;
    Ok(count > 0)
}

// Helpers

fn to_principal(model: entities::principal::Model) -> Principal {
    Principal {
        id: model.id,
        username: model.username,
        password_hash: model.password_hash,
        role_id: model.role_id,
        created_at: model.created_at,
    }
}

fn to_aci(model: entities::aci::Model) -> Aci {
    Aci {
        id: model.id,
        role_id: model.role_id,
        user_id: model.user_id,
        resource: model.resource,
        payload: model.payload,
        created_at: model.created_at,
    }
}

fn validate_grant(
    role_id: Option<&str>,
    user_id: Option<&str>,
    resource: &str,
    payload: &str,
) -> Result<(), AuthError> {
    if resource.is_empty() {
        return Err(AuthError::InvalidGrant(
            "resource must not be empty".to_string(),
        ));
    }
    if payload.is_empty() {
        return Err(AuthError::InvalidGrant(
            "payload must not be empty".to_string(),
        ));
    }
    match (role_id, user_id) {
        (Some(r), None) if !r.is_empty() => Ok(()),
        (None, Some(u)) if !u.is_empty() => Ok(()),
        _ => Err(AuthError::InvalidGrant(
            "exactly one of role_id/user_id must be set".to_string(),
        )),
    }
}

pub(crate) fn random_id() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64ct::Base64UrlUnpadded::encode_string(&bytes)
}
