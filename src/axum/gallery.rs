use axum::extract::Path;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Extension, Json};
use serde_json::json;

use crate::gallery::{self, GalleryItem, ItemDraft, ItemId};
use crate::routes;
use crate::Result;

use super::{DbExt, Identity, Router};

pub fn router() -> Router {
    Router::new()
        .route(routes::GALLERY_ITEMS, get(list_all))
        .route(routes::GALLERY_ITEMS_USER, get(list_for_user))
        .route(routes::GALLERY_ADD, post(add))
        .route(routes::GALLERY_DELETE, delete(remove))
}

/// All items across all users, flattened.
pub async fn list_all(Extension(db): DbExt) -> Result<Json<Vec<GalleryItem>>> {
    Ok(Json(gallery::list_all(&db)?))
}

/// The ordered item list for one account.
pub async fn list_for_user(
    Path(user_name): Path<String>,
    Extension(db): DbExt,
) -> Result<Json<Vec<GalleryItem>>> {
    Ok(Json(gallery::list_for_user(&db, &user_name)?))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub user_name: String,
    #[serde(flatten)]
    pub item: ItemDraft,
}

/// Appends an image to the caller's own gallery. Responds with the stored
/// item so clients learn the assigned id.
pub async fn add(
    identity: Identity,
    Extension(db): DbExt,
    Json(request): Json<AddItemRequest>,
) -> Result<Json<GalleryItem>> {
    identity.ensure_user(&request.user_name)?;
    let item = gallery::add_item(&db, &request.user_name, request.item)?;
    Ok(Json(item))
}

/// Removes an image from the caller's own gallery by item id.
pub async fn remove(
    identity: Identity,
    Path((user_name, item_id)): Path<(String, ItemId)>,
    Extension(db): DbExt,
) -> Result<impl IntoResponse> {
    identity.ensure_user(&user_name)?;
    gallery::delete_item(&db, &user_name, item_id)?;
    Ok(Json(json!({ "message": "Image successfully removed" })))
}
