use perigee::auth::AuthEngine;
use perigee::settings::{Keys, Settings};
use perigee::tokens::TokenSigner;
use sea_orm::DatabaseConnection;
use tempfile::TempDir;

/// Key config pointing into a test-owned temp directory
pub fn test_keys(dir: &TempDir) -> Keys {
    Keys {
        private_key_path: dir.path().join("signing_key.json"),
        key_id: None,
        alg: "RS256".to_string(),
        issuer: "perigee-tests".to_string(),
        token_ttl_secs: 3600,
    }
}

pub fn test_signer(dir: &TempDir) -> TokenSigner {
    TokenSigner::new(test_keys(dir)).expect("Failed to create signer")
}

/// Engine over the given connection, with default settings
pub fn test_engine(db: &DatabaseConnection, dir: &TempDir) -> AuthEngine {
    AuthEngine::new(db.clone(), test_signer(dir), &Settings::default())
}

/// Engine over the given connection, with explicit settings
pub fn test_engine_with_settings(
    db: &DatabaseConnection,
    dir: &TempDir,
    settings: &Settings,
) -> AuthEngine {
    AuthEngine::new(db.clone(), test_signer(dir), settings)
}
