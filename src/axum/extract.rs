use std::ops::Deref;
use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_auth::AuthBearer;

use crate::auth;
use crate::db::Database;
use crate::error::{Error, ErrorKind};
use crate::gallery::Gallery;

/// The authenticated caller, resolved from the bearer token in the
/// `Authorization` header. Extraction fails with 401 when the header is
/// missing or the token doesn't verify.
#[derive(Clone, Debug)]
pub struct Identity(pub Gallery);

impl Deref for Identity {
    type Target = Gallery;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Identity {
    /// Mutating calls act on a `userName` taken from the request; make sure
    /// it is the caller's own.
    pub fn ensure_user(&self, user_name: &str) -> Result<(), Error> {
        if self.0.user_name == user_name {
            Ok(())
        } else {
            Err(Error::new_with(ErrorKind::Forbidden, Some(self.0.id)))
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Identity {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let db = parts
            .extensions
            .get::<Arc<Database>>()
            .expect("database extension unavailable")
            .clone();

        let AuthBearer(token) = AuthBearer::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| ErrorKind::AuthFailed(msg.to_string()))?;

        auth::verify_token(&db, &token).map(Identity)
    }
}
