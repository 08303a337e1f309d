//! RS256 bearer token issuance and verification.
//!
//! The signing key is a single RSA JWK, generated on first use and persisted
//! as JSON at the configured path. Tokens are stateless: everything needed to
//! verify one is the public half of that key.

use std::fs;
use std::sync::Arc;
use std::time::SystemTime;

use base64ct::Encoding;
use chrono::Utc;
use josekit::jwk::Jwk;
use josekit::jws::{JwsHeader, RS256};
use josekit::jwt::{self, JwtPayload, JwtPayloadValidator};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AuthError;
use crate::settings::Keys;
use crate::storage::Principal;

/// An issued bearer token together with the claims stamped into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Compact JWS serialization, the value callers pass around.
    pub jwt: String,
    /// Token id (the `jti` claim).
    pub id: String,
    /// Principal id (the `sub` claim).
    pub user_id: String,
    /// Role id at issuance time (the `role_id` claim).
    pub role_id: String,
}

/// Claims extracted from a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub id: String,
    pub user_id: String,
    pub role_id: String,
}

#[derive(Clone)]
pub struct TokenSigner {
    cfg: Keys,
    private_jwk: Arc<Jwk>,
    public_jwk: Arc<Jwk>,
}

impl TokenSigner {
    pub fn new(cfg: Keys) -> Result<Self, AuthError> {
        if cfg.alg != "RS256" {
            return Err(AuthError::Jose(format!(
                "unsupported signing algorithm: {}",
                cfg.alg
            )));
        }

        // Ensure parent dirs exist
        if let Some(parent) = cfg.private_key_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // If the private key exists, load it; otherwise generate and persist
        let private_jwk = if cfg.private_key_path.exists() {
            let s = fs::read_to_string(&cfg.private_key_path)?;
            // Stored as JSON
            serde_json::from_str::<Jwk>(&s)?
        } else {
            let mut jwk = Jwk::generate_rsa_key(2048)?;
            let kid = cfg.key_id.clone().unwrap_or_else(random_kid);
            jwk.set_key_id(&kid);
            jwk.set_algorithm(cfg.alg.as_str());
            jwk.set_key_use("sig");
            let priv_json = serde_json::to_string_pretty(&jwk)?;
            fs::write(&cfg.private_key_path, priv_json)?;
            tracing::info!(path = %cfg.private_key_path.display(), "Generated RSA signing key");
            jwk
        };

        let public_jwk = private_jwk.to_public_key()?;

        Ok(Self {
            cfg,
            private_jwk: Arc::new(private_jwk),
            public_jwk: Arc::new(public_jwk),
        })
    }

    /// Issue a token for the given principal.
    pub fn issue(&self, principal: &Principal) -> Result<Token, AuthError> {
        let token_id = random_token_id();
        let now = SystemTime::now();
        let expires_at = Utc::now().timestamp() + self.cfg.token_ttl_secs;

        let mut payload = JwtPayload::new();
        payload.set_jwt_id(token_id.clone());
        payload.set_subject(principal.id.clone());
        payload.set_issuer(self.cfg.issuer.clone());
        payload.set_issued_at(&now);
        let _ = payload.set_claim("exp", Some(json!(expires_at)));
        let _ = payload.set_claim(
            "role_id",
            Some(Value::String(principal.role_id.clone())),
        );

        let signer = RS256.signer_from_jwk(&self.private_jwk)?;
        let mut header = JwsHeader::new();
        if let Some(kid) = self.private_jwk.key_id() {
            header.set_key_id(kid);
        }
        header.set_algorithm("RS256");
        header.set_token_type("JWT");
        let jwt = jwt::encode_with_signer(&payload, &header, &signer)?;

        Ok(Token {
            jwt,
            id: token_id,
            user_id: principal.id.clone(),
            role_id: principal.role_id.clone(),
        })
    }

    /// Verify signature, expiry and issuer, and return the embedded claims.
    ///
    /// This says nothing about whether the principal still exists; callers
    /// that need the current record go back to the store afterwards.
    pub fn verify(&self, jwt_str: &str) -> Result<TokenClaims, AuthError> {
        let verifier = RS256.verifier_from_jwk(&self.public_jwk)?;
        let (payload, _header) = jwt::decode_with_verifier(jwt_str, &verifier)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let mut validator = JwtPayloadValidator::new();
        validator.set_base_time(SystemTime::now());
        validator.set_issuer(self.cfg.issuer.clone());
        validator
            .validate(&payload)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        let user_id = payload
            .subject()
            .ok_or_else(|| AuthError::InvalidToken("missing sub claim".to_string()))?
            .to_string();
        let id = payload.jwt_id().unwrap_or_default().to_string();
        let role_id = match payload.claim("role_id") {
            Some(Value::String(s)) => s.clone(),
            _ => String::new(),
        };

        Ok(TokenClaims { id, user_id, role_id })
    }
}

fn random_kid() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64ct::Base64UrlUnpadded::encode_string(&bytes)
}

fn random_token_id() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64ct::Base64UrlUnpadded::encode_string(&bytes)
}
