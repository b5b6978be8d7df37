use uuid::Uuid;

use crate::auth;
use crate::db::{Collectable, Database, Identifiable};
use crate::error::{Error, ErrorKind, Result};
use crate::geo::GeoPoint;

pub type GalleryId = Uuid;
pub type ItemId = Uuid;

/// Per-user record holding credentials and the ordered list of uploaded
/// images. Created at signup, never deleted through the API.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gallery {
    pub id: GalleryId,
    /// Globally unique account name.
    pub user_name: String,
    /// Argon2 digest in PHC string format, never the raw secret.
    pub user_password: String,
    /// Insertion order is upload order.
    pub gallery_items: Vec<GalleryItem>,
}

impl Collectable for Gallery {
    fn get_collection_name() -> &'static str {
        "gallery"
    }
}

impl Identifiable for Gallery {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl Gallery {
    pub fn item(&self, item_id: ItemId) -> Option<&GalleryItem> {
        self.gallery_items.iter().find(|i| i.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: ItemId) -> Option<&mut GalleryItem> {
        self.gallery_items.iter_mut().find(|i| i.id == item_id)
    }
}

/// A single uploaded image, embedded in its owner's gallery.
///
/// Items carry a stable unique `id` assigned at creation; all item-scoped
/// operations are keyed by it. The display `name` is plain metadata and may
/// repeat within a gallery.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub coordinates_holder: GeoPoint,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub num_timestamp: i64,
    /// Pointer to externally stored image bytes.
    pub url: String,
    /// True iff a matching post currently exists in the public feed.
    /// Maintained by the publish/unpublish transaction, never set directly.
    pub is_posted: bool,
}

/// Client-supplied fields of a new gallery item. The id is assigned and the
/// posted flag forced to false on insertion.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
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

impl GalleryItem {
    pub fn new(draft: ItemDraft) -> Self {
        Self {
            id: ItemId::new_v4(),
            name: draft.name,
            location: draft.location,
            coordinates_holder: draft.coordinates_holder,
            timestamp: draft.timestamp,
            num_timestamp: draft.num_timestamp,
            url: draft.url,
            is_posted: false,
        }
    }
}

/// Creates a new account with an empty item list. Fails if the username is
/// already taken; the existing record is left untouched.
pub fn create(db: &Database, user_name: &str, raw_password: &str) -> Result<Gallery> {
    if find_by_username(db, user_name).is_ok() {
        return Err(ErrorKind::UserAlreadyExists(user_name.to_string()).into());
    }
    let gallery = Gallery {
        id: GalleryId::new_v4(),
        user_name: user_name.to_string(),
        user_password: auth::hash_password(raw_password)?,
        gallery_items: vec![],
    };
    db.set(&gallery)?;
    Ok(gallery)
}

pub fn find_by_username(db: &Database, user_name: &str) -> Result<Gallery> {
    for gallery in db.get_collection::<Gallery>()? {
        if gallery.user_name == user_name {
            return Ok(gallery);
        }
    }
    Err(ErrorKind::GalleryNotFound(user_name.to_string()).into())
}

/// Returns every item across every gallery, flattened. Order within a user
/// is preserved, order across users is undefined.
pub fn list_all(db: &Database) -> Result<Vec<GalleryItem>> {
    let mut out = Vec::new();
    for gallery in db.get_collection::<Gallery>()? {
        out.extend(gallery.gallery_items);
    }
    Ok(out)
}

/// Returns the ordered item list for one account.
pub fn list_for_user(db: &Database, user_name: &str) -> Result<Vec<GalleryItem>> {
    Ok(find_by_username(db, user_name)?.gallery_items)
}

/// Appends a new item to the named account's gallery and returns it as
/// stored, with its assigned id.
pub fn add_item(db: &Database, user_name: &str, draft: ItemDraft) -> Result<GalleryItem> {
    let mut gallery = find_by_username(db, user_name)?;
    let item = GalleryItem::new(draft);
    gallery.gallery_items.push(item.clone());
    db.set(&gallery)?;
    Ok(item)
}

/// Removes the identified item from the named account's gallery.
pub fn delete_item(db: &Database, user_name: &str, item_id: ItemId) -> Result<()> {
    let mut gallery = find_by_username(db, user_name)?;
    let len_before = gallery.gallery_items.len();
    gallery.gallery_items.retain(|item| item.id != item_id);
    if gallery.gallery_items.len() == len_before {
        return Err(Error::new_with(
            ErrorKind::ItemNotFound(item_id),
            Some(gallery.id),
        ));
    }
    db.set(&gallery)?;
    Ok(())
}
