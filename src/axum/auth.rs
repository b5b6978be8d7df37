use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json};
use serde_json::json;
use validator::ValidateLength;

use crate::auth;
use crate::error::{ErrorKind, Result};
use crate::{gallery, routes};

use super::{ConfigExt, DbExt, Identity, Router};

pub fn router() -> Router {
    Router::new()
        .route(routes::SIGNUP, post(signup))
        .route(routes::LOGIN, post(login))
        .route(routes::AUTH_VALIDATE, get(validate))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    user_name: String,
    password: String,
}

/// Newly issued bearer token, presented back as `Authorization: Bearer`
/// on subsequent requests.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

/// Creates an account with an empty gallery.
pub async fn signup(
    Extension(db): DbExt,
    Json(credentials): Json<Credentials>,
) -> Result<impl IntoResponse> {
    // both fields must be present and non-empty
    if !credentials.user_name.validate_length(Some(1), None, None)
        || !credentials.password.validate_length(Some(1), None, None)
    {
        return Err(
            ErrorKind::BadInput("Please provide both username and password.".to_string()).into(),
        );
    }

    gallery::create(&db, &credentials.user_name, &credentials.password)?;
    tracing::info!("account created: {}", credentials.user_name);

    Ok(Json(json!({ "message": "Account Created!" })))
}

/// Verifies credentials and issues a bearer token.
pub async fn login(
    Extension(db): DbExt,
    Extension(config): ConfigExt,
    Json(credentials): Json<Credentials>,
) -> Result<Json<AuthResponse>> {
    let gallery = gallery::find_by_username(&db, &credentials.user_name)
        .map_err(|_| ErrorKind::InvalidCredentials)?;

    auth::validate_password(credentials.password.as_bytes(), &gallery.user_password)
        .map_err(|_| ErrorKind::InvalidCredentials)?;

    let token = auth::issue_token(&db, &config, &gallery)?;

    Ok(Json(AuthResponse {
        token: token.id.to_string(),
    }))
}

/// Bearer-token check. The `Identity` extractor already rejects missing,
/// malformed, unknown and expired tokens as well as tokens whose account
/// is gone.
pub async fn validate(_identity: Identity) -> Result<impl IntoResponse> {
    Ok(Json(json!({ "message": "Token is valid" })))
}
