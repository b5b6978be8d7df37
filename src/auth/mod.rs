use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::db::{Collectable, Database, Identifiable};
use crate::error::{ErrorKind, Result};
use crate::gallery::{Gallery, GalleryId};
use crate::Config;

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();
    Ok(password_hash)
}

pub fn validate_password(password: &[u8], expected_password_hash: &str) -> Result<()> {
    let expected_password_hash = PasswordHash::new(expected_password_hash)
        .map_err(|_| ErrorKind::Other("Failed to parse hash in PHC string format.".to_string()))?;
    Argon2::default().verify_password(password, &expected_password_hash)?;

    Ok(())
}

pub type TokenId = Uuid;

/// Bearer token record. The token presented by clients is the `id` itself;
/// everything the gateway needs to verify it lives in this collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenMeta {
    pub id: TokenId,
    pub user_id: GalleryId,
    pub user_name: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Collectable for TokenMeta {
    fn get_collection_name() -> &'static str {
        "access_token"
    }
}

impl Identifiable for TokenMeta {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl TokenMeta {
    pub fn new(gallery: &Gallery, validity_days: i64) -> Self {
        let issued_at = Utc::now();
        Self {
            id: TokenId::new_v4(),
            user_id: gallery.id,
            user_name: gallery.user_name.clone(),
            issued_at,
            expires_at: issued_at + Duration::days(validity_days),
        }
    }

    /// Returns true if the token is expired.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// Issues a new bearer token for the given gallery and persists its
/// metadata.
pub fn issue_token(db: &Database, config: &Config, gallery: &Gallery) -> Result<TokenMeta> {
    let token = TokenMeta::new(gallery, config.auth.token_validity_days);
    db.set(&token)?;
    Ok(token)
}

/// Checks if the provided token has expired, deleting it if so.
pub fn token_expired(db: &Database, token: &TokenMeta) -> bool {
    if token.is_expired() {
        if let Err(e) = db.remove(token) {
            tracing::warn!("failed removing expired token: {e}");
        }
        true
    } else {
        false
    }
}

/// Resolves a bearer token string to the gallery it was issued for.
///
/// Fails when the token is not a uuid, unknown to the store, expired, or
/// when the bound account no longer exists.
pub fn verify_token(db: &Database, token: &str) -> Result<Gallery> {
    let token_id = Uuid::parse_str(token)
        .map_err(|_| ErrorKind::AuthFailed("malformed token".to_string()))?;
    let meta = db
        .get::<TokenMeta>(token_id)
        .map_err(|_| ErrorKind::AuthFailed("unknown token".to_string()))?;
    if token_expired(db, &meta) {
        return Err(ErrorKind::AuthFailed("token expired".to_string()).into());
    }
    db.get::<Gallery>(meta.user_id)
        .map_err(|_| ErrorKind::AuthFailed("user no longer exists".to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery;

    #[test]
    fn hash_and_validate_password() {
        let hash = hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(validate_password(b"hunter2", &hash).is_ok());
        assert!(validate_password(b"wrong", &hash).is_err());
    }

    #[test]
    fn token_roundtrip() {
        let db = Database::temporary().unwrap();
        let config = Config::default();
        let g = gallery::create(&db, "alice", "pw1").unwrap();

        let token = issue_token(&db, &config, &g).unwrap();
        assert!(!token.is_expired());

        let resolved = verify_token(&db, &token.id.to_string()).unwrap();
        assert_eq!(resolved.user_name, "alice");
    }

    #[test]
    fn verify_rejects_garbage_and_unknown_tokens() {
        let db = Database::temporary().unwrap();
        assert!(verify_token(&db, "not-a-uuid").is_err());
        assert!(verify_token(&db, &Uuid::new_v4().to_string()).is_err());
    }

    #[test]
    fn expired_token_is_rejected_and_removed() {
        let db = Database::temporary().unwrap();
        let g = gallery::create(&db, "bob", "pw").unwrap();
        let mut token = TokenMeta::new(&g, 365);
        token.expires_at = Utc::now() - Duration::days(1);
        db.set(&token).unwrap();

        assert!(verify_token(&db, &token.id.to_string()).is_err());
        // removed on first sight
        assert!(db.get::<TokenMeta>(token.id).is_err());
    }

    #[test]
    fn token_outlives_deleted_account_check() {
        let db = Database::temporary().unwrap();
        let config = Config::default();
        let g = gallery::create(&db, "carol", "pw").unwrap();
        let token = issue_token(&db, &config, &g).unwrap();

        db.remove(&g).unwrap();
        assert!(verify_token(&db, &token.id.to_string()).is_err());
    }
}
