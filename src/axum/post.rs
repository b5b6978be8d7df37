use axum::extract::{Path, Query};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Extension, Json};
use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;

use crate::error::{ErrorKind, Result};
use crate::gallery::ItemId;
use crate::post::{self, Post, PostDraft};
use crate::routes;

use super::{ConfigExt, DbExt, Identity, Router};

pub fn router() -> Router {
    Router::new()
        .route(routes::POST_ADD, post(add))
        .route(routes::POST_ALL, get(all))
        .route(routes::POSTS_RECENTS, get(recents))
        .route(routes::POSTS_NEARBY, get(nearby))
        .route(routes::POSTS_DELETE, delete(remove))
}

/// Publishes one of the caller's gallery items to the public feed.
pub async fn add(
    identity: Identity,
    Extension(db): DbExt,
    Json(draft): Json<PostDraft>,
) -> Result<Json<Post>> {
    identity.ensure_user(&draft.username)?;
    let post = post::publish(&db, draft)?;
    Ok(Json(post))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentsQuery {
    pub limit: Option<usize>,
    /// Pagination cursor, epoch milliseconds. Only posts created strictly
    /// before it are returned.
    pub prev_time: Option<String>,
}

/// Cursor-paginated recent posts, newest first.
pub async fn recents(
    Query(query): Query<RecentsQuery>,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
) -> Result<Json<Vec<Post>>> {
    let before = query.prev_time.as_deref().map(parse_cursor).transpose()?;
    let limit = query.limit.unwrap_or(config.feed.default_limit);
    Ok(Json(post::recent(&db, limit, before)?))
}

fn parse_cursor(raw: &str) -> Result<DateTime<Utc>> {
    let millis: i64 = raw
        .parse()
        .map_err(|_| ErrorKind::BadInput(format!("invalid 'prevTime' timestamp: {raw}")))?;
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| ErrorKind::BadInput(format!("invalid 'prevTime' timestamp: {raw}")).into())
}

/// Every post, newest first. Unbounded.
pub async fn all(Extension(db): DbExt) -> Result<Json<Vec<Post>>> {
    Ok(Json(post::all(&db)?))
}

#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    pub limit: Option<usize>,
}

/// Posts within the configured maximum distance of the given point,
/// nearest first.
pub async fn nearby(
    Query(query): Query<NearbyQuery>,
    Extension(db): DbExt,
    Extension(config): ConfigExt,
) -> Result<Json<Vec<Post>>> {
    if !query.lat.is_finite() || !query.lng.is_finite() {
        return Err(
            ErrorKind::BadInput("User latitude and longitude are required.".to_string()).into(),
        );
    }
    let limit = query.limit.unwrap_or(config.feed.default_limit);
    Ok(Json(post::nearby(
        &db,
        query.lat,
        query.lng,
        limit,
        config.feed.max_distance_m,
    )?))
}

/// Unpublishes the post created from the given gallery item.
pub async fn remove(
    identity: Identity,
    Path((user_name, item_id)): Path<(String, ItemId)>,
    Extension(db): DbExt,
) -> Result<impl IntoResponse> {
    identity.ensure_user(&user_name)?;
    post::unpublish(&db, &user_name, item_id)?;
    Ok(Json(json!({ "message": "Post successfully deleted." })))
}
