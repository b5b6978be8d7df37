//! Public feed records and the consistency bridge between a gallery item's
//! `isPosted` flag and the post collection.
//!
//! Post existence is authoritative; the flag on the gallery item is a
//! denormalization kept for cheap gallery reads. Publish and unpublish
//! update both collections inside one sled transaction, so the flag can
//! never disagree with the feed.

use chrono::{DateTime, Utc};
use sled::transaction::ConflictableTransactionError;
use sled::Transactional;
use uuid::Uuid;

use crate::db::{decode, encode, Collectable, Database, Identifiable};
use crate::error::{ErrorKind, Result};
use crate::gallery::{self, Gallery, ItemId};
use crate::geo::{self, GeoPoint};

pub type PostId = Uuid;

/// A gallery image published to the shared feed. Carries a denormalized
/// copy of the image metadata plus the owning username; addressable by
/// `(username, item_id)`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    /// The gallery item this post was published from.
    pub item_id: ItemId,
    pub username: String,

    pub name: String,
    #[serde(default)]
    pub location: String,
    pub coordinates_holder: GeoPoint,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub num_timestamp: i64,
    pub url: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Collectable for Post {
    fn get_collection_name() -> &'static str {
        "post"
    }
}

impl Identifiable for Post {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

/// Client-supplied fields of a new post. Id and timestamps are assigned by
/// the server.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub username: String,
    pub item_id: ItemId,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub coordinates_holder: GeoPoint,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub num_timestamp: i64,
    pub url: String,
}

impl Post {
    pub fn new(draft: PostDraft) -> Self {
        let now = Utc::now();
        Self {
            id: PostId::new_v4(),
            item_id: draft.item_id,
            username: draft.username,
            name: draft.name,
            location: draft.location,
            coordinates_holder: draft.coordinates_holder,
            timestamp: draft.timestamp,
            num_timestamp: draft.num_timestamp,
            url: draft.url,
            created_at: now,
            updated_at: now,
        }
    }
}

fn abort_kind(kind: ErrorKind) -> ConflictableTransactionError<Box<ErrorKind>> {
    ConflictableTransactionError::Abort(Box::new(kind))
}

/// Finds the post published from the given gallery item, if any.
pub fn find_by_item(db: &Database, user_name: &str, item_id: ItemId) -> Result<Post> {
    for post in db.get_collection::<Post>()? {
        if post.username == user_name && post.item_id == item_id {
            return Ok(post);
        }
    }
    Err(ErrorKind::PostNotFound(format!("{}/{}", user_name, item_id)).into())
}

/// Publishes a gallery item to the feed.
///
/// Inserting the post and setting the item's posted flag happen in a single
/// transaction over both collections; when the gallery or the item is
/// missing nothing is persisted. Publishing an already posted item is a
/// conflict.
pub fn publish(db: &Database, draft: PostDraft) -> Result<Post> {
    // resolve the gallery id up front; the transaction re-reads the record
    // by id and re-checks everything it relies on
    let gallery_id = gallery::find_by_username(db, &draft.username)?.id;

    let galleries = db.tree::<Gallery>()?;
    let posts = db.tree::<Post>()?;
    let post = Post::new(draft);

    (&galleries, &posts).transaction(|(galleries, posts)| {
        let bytes = galleries
            .get(gallery_id.as_bytes())?
            .ok_or_else(|| abort_kind(ErrorKind::GalleryNotFound(post.username.clone())))?;
        let mut gallery: Gallery = decode(&bytes).map_err(|e| abort_kind(e.kind))?;

        let item = gallery
            .item_mut(post.item_id)
            .ok_or_else(|| abort_kind(ErrorKind::ItemNotFound(post.item_id)))?;
        if item.is_posted {
            return Err(abort_kind(ErrorKind::AlreadyPosted(post.item_id)));
        }
        item.is_posted = true;

        let encoded_gallery = encode(&gallery).map_err(|e| abort_kind(e.kind))?;
        let encoded_post = encode(&post).map_err(|e| abort_kind(e.kind))?;
        galleries.insert(gallery_id.as_bytes().as_slice(), encoded_gallery)?;
        posts.insert(post.id.as_bytes().as_slice(), encoded_post)?;
        Ok(())
    })?;

    Ok(post)
}

/// Removes the post published from the given gallery item and clears the
/// item's posted flag, atomically.
///
/// The post record is authoritative: when the gallery item has since been
/// deleted the unpublish still succeeds and only the flag update is skipped.
pub fn unpublish(db: &Database, user_name: &str, item_id: ItemId) -> Result<()> {
    let post = find_by_item(db, user_name, item_id)?;
    let gallery_id = gallery::find_by_username(db, user_name).map(|g| g.id).ok();

    let galleries = db.tree::<Gallery>()?;
    let posts = db.tree::<Post>()?;

    let flag_cleared = (&galleries, &posts).transaction(|(galleries, posts)| {
        posts
            .remove(post.id.as_bytes().as_slice())?
            .ok_or_else(|| {
                abort_kind(ErrorKind::PostNotFound(format!("{}/{}", user_name, item_id)))
            })?;

        let gallery_bytes = match gallery_id {
            Some(id) => galleries.get(id.as_bytes())?,
            None => None,
        };
        let Some(bytes) = gallery_bytes else {
            return Ok(false);
        };
        let mut gallery: Gallery = decode(&bytes).map_err(|e| abort_kind(e.kind))?;
        match gallery.item_mut(item_id) {
            Some(item) => item.is_posted = false,
            None => return Ok(false),
        }
        let encoded = encode(&gallery).map_err(|e| abort_kind(e.kind))?;
        galleries.insert(gallery.id.as_bytes().as_slice(), encoded)?;
        Ok(true)
    })?;

    if !flag_cleared {
        tracing::warn!(
            "unpublished post {} for {user_name} but the gallery item {item_id} is gone",
            post.id
        );
    }
    Ok(())
}

/// Returns up to `limit` posts ordered by creation time descending. When
/// `before` is given only posts created strictly earlier are eligible,
/// which makes it usable as a pagination cursor.
pub fn recent(db: &Database, limit: usize, before: Option<DateTime<Utc>>) -> Result<Vec<Post>> {
    let mut posts = db.get_collection::<Post>()?;
    if let Some(before) = before {
        posts.retain(|p| p.created_at < before);
    }
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    posts.truncate(limit);
    Ok(posts)
}

/// Every post, newest first. Unbounded.
pub fn all(db: &Database) -> Result<Vec<Post>> {
    let mut posts = db.get_collection::<Post>()?;
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(posts)
}

/// Returns up to `limit` posts within `max_distance_m` meters of the given
/// point, nearest first.
pub fn nearby(
    db: &Database,
    lat: f64,
    lng: f64,
    limit: usize,
    max_distance_m: f64,
) -> Result<Vec<Post>> {
    let origin = GeoPoint::new(lng, lat);
    let mut ranked: Vec<(f64, Post)> = db
        .get_collection::<Post>()?
        .into_iter()
        .filter_map(|post| {
            let distance = geo::distance_m(&origin, &post.coordinates_holder);
            (distance <= max_distance_m).then_some((distance, post))
        })
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
    ranked.truncate(limit);
    Ok(ranked.into_iter().map(|(_, post)| post).collect())
}
