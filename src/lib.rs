//! Backend for a photo-sharing application. Users sign up, upload geotagged
//! images to a personal gallery and can publish gallery images to a shared
//! public feed queryable by recency or geographic proximity.
//!
//! State lives in two document collections backed by [`sled`]: `gallery`
//! (credentials plus the embedded image list) and `post` (the public feed).
//! Publishing and unpublishing touch both collections inside a single sled
//! transaction so the denormalized `isPosted` flag can never disagree with
//! the authoritative post record.

#[macro_use]
extern crate serde_derive;

pub mod auth;
pub mod axum;
pub mod config;
pub mod db;
pub mod error;
pub mod gallery;
pub mod geo;
pub mod init;
pub mod mock;
pub mod post;
pub mod routes;
pub mod tracing;

pub use crate::axum::start;
pub use config::Config;
pub use db::Database;
pub use error::{Error, ErrorKind, Result};
pub use gallery::{Gallery, GalleryId, GalleryItem, ItemId};
pub use geo::GeoPoint;
pub use post::{Post, PostId};
