//! Allow/deny decisions over stored grants.
//!
//! A request is allowed when any grant matches it, either one addressed to
//! the user directly or one addressed to the user's role. Absence of a
//! matching grant is an ordinary deny, not an error.

use sea_orm::DatabaseConnection;

use crate::errors::AuthError;
use crate::storage::{self, Principal};

/// Decide whether `(user_id, role_id)` may act on `(resource, payload)`.
///
/// User grants are consulted first, then role grants. The two tiers are a
/// union: one match from either side allows the request.
pub async fn check(
    db: &DatabaseConnection,
    user_id: &str,
    role_id: &str,
    resource: &str,
    payload: &str,
) -> Result<bool, AuthError> {
    if storage::check_aci_by_user_id(db, user_id, resource, payload).await? {
        return Ok(true);
    }
    storage::check_aci_by_role_id(db, role_id, resource, payload).await
}

/// Like [`check`], but a negative decision becomes [`AuthError::PermissionDenied`].
pub async fn authorize(
    db: &DatabaseConnection,
    user_id: &str,
    role_id: &str,
    resource: &str,
    payload: &str,
) -> Result<(), AuthError> {
    if check(db, user_id, role_id, resource, payload).await? {
        Ok(())
    } else {
        tracing::debug!(%user_id, %role_id, %resource, %payload, "Permission denied");
        Err(AuthError::PermissionDenied)
    }
}

/// [`authorize`] for a loaded principal record.
pub async fn authorize_principal(
    db: &DatabaseConnection,
    principal: &Principal,
    resource: &str,
    payload: &str,
) -> Result<(), AuthError> {
    authorize(db, &principal.id, &principal.role_id, resource, payload).await
}
