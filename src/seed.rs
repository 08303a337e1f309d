//! Idempotent seeding of configured static users and default grants.
//!
//! Runs at startup, after migrations. Re-running against an already seeded
//! store changes nothing; config drift (a changed role or password) is
//! reconciled in place.

use miette::{IntoDiagnostic, Result};
use sea_orm::DatabaseConnection;

use crate::password;
use crate::settings::{GrantSeed, Settings, StaticUser};
use crate::storage::{self, NewAci, NewPrincipal};

/// Outcome counters for one seeding pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

#[derive(Debug)]
enum SyncResult {
    Created,
    Updated,
    Unchanged,
}

/// Seed everything the settings declare: static users, then default grants.
pub async fn seed(db: &DatabaseConnection, settings: &Settings) -> Result<()> {
    let users = sync_static_users(db, &settings.static_users).await?;
    tracing::info!(
        "Static user sync complete: {} created, {} updated, {} unchanged",
        users.created,
        users.updated,
        users.unchanged
    );

    let grants = sync_default_acl(db, &settings.default_acl).await?;
    tracing::info!(
        "Default grant sync complete: {} created, {} unchanged",
        grants.created,
        grants.unchanged
    );

    Ok(())
}

/// Sync configured static users into the store (idempotent).
pub async fn sync_static_users(
    db: &DatabaseConnection,
    users: &[StaticUser],
) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for user in users {
        match sync_static_user(db, user).await? {
            SyncResult::Created => report.created += 1,
            SyncResult::Updated => report.updated += 1,
            SyncResult::Unchanged => report.unchanged += 1,
        }
    }

    Ok(report)
}

/// Sync a single static user (idempotent). Static users skip the password
/// policy: the operator who wrote the config decides.
async fn sync_static_user(db: &DatabaseConnection, user: &StaticUser) -> Result<SyncResult> {
    let existing = storage::get_principal_by_username(db, &user.username)
        .await
        .into_diagnostic()?;

    let result = match existing {
        None => {
            tracing::info!("Creating static user: {}", user.username);
            let input = NewPrincipal {
                id: user.id.clone(),
                username: user.username.clone(),
                password: user.password.clone(),
                role_id: user.role_id.clone(),
            };
            storage::create_principal(db, &input).await.into_diagnostic()?;
            SyncResult::Created
        }
        Some(mut existing_user) => {
            if let Some(configured_id) = &user.id {
                if *configured_id != existing_user.id {
                    tracing::warn!(
                        "Static user {} already exists with id {}, leaving it (configured id: {})",
                        user.username,
                        existing_user.id,
                        configured_id
                    );
                }
            }

            let role_matches = existing_user.role_id == user.role_id;
            let password_matches =
                password::verify_password(&user.password, &existing_user.password_hash)
                    .into_diagnostic()?;

            if role_matches && password_matches {
                SyncResult::Unchanged
            } else {
                tracing::info!("Updating static user: {}", user.username);
                existing_user.role_id = user.role_id.clone();
                if !password_matches {
                    existing_user.password_hash =
                        password::hash_password(&user.password).into_diagnostic()?;
                }
                storage::update_principal(db, &existing_user)
                    .await
                    .into_diagnostic()?;
                SyncResult::Updated
            }
        }
    };

    Ok(result)
}

/// Sync configured default grants into the store (idempotent).
///
/// A grant's natural key is (subject, resource, payload); an existing match
/// is left alone, so re-seeding never piles up duplicate rows.
pub async fn sync_default_acl(db: &DatabaseConnection, acl: &[GrantSeed]) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for grant in acl {
        let exists = match (&grant.role_id, &grant.user_id) {
            (Some(role_id), None) => {
                storage::check_aci_by_role_id(db, role_id, &grant.resource, &grant.payload)
                    .await
                    .into_diagnostic()?
            }
            (None, Some(user_id)) => {
                storage::check_aci_by_user_id(db, user_id, &grant.resource, &grant.payload)
                    .await
                    .into_diagnostic()?
            }
            _ => {
                return Err(miette::miette!(
                    "default_acl entry for resource '{}' must set exactly one of role_id/user_id",
                    grant.resource
                ));
            }
        };

        if exists {
            report.unchanged += 1;
            continue;
        }

        tracing::info!(
            "Creating default grant on {} / {} for {}",
            grant.resource,
            grant.payload,
            grant
                .role_id
                .as_deref()
                .or(grant.user_id.as_deref())
                .unwrap_or_default()
        );
        let input = NewAci {
            role_id: grant.role_id.clone(),
            user_id: grant.user_id.clone(),
            resource: grant.resource.clone(),
            payload: grant.payload.clone(),
        };
        storage::create_aci(db, &input).await.into_diagnostic()?;
        report.created += 1;
    }

    Ok(report)
}
