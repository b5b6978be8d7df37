//! Module tasked with generating mock data to populate the application.

use crate::error::ErrorKind;
use crate::gallery::{self, Gallery, ItemDraft};
use crate::geo::GeoPoint;
use crate::post::{self, PostDraft};
use crate::{Config, Database, Result};

/// Generates and saves mock data in the database.
pub fn generate(config: &Config, db: &Database) -> Result<()> {
    user(config, db)?;

    Ok(())
}

/// Creates a test account with a couple of geotagged gallery items, one of
/// them published to the feed.
pub fn user(config: &Config, db: &Database) -> Result<Gallery> {
    let user_name = "test".to_string();

    // does the test account already exist
    if gallery::find_by_username(db, &user_name).is_ok() && config.dev.mock_regen != true {
        return Err(ErrorKind::UserAlreadyExists(user_name).into());
    }

    let gallery = match gallery::find_by_username(db, &user_name) {
        Ok(g) => g,
        Err(_) => gallery::create(db, &user_name, "test")?,
    };

    let lighthouse = gallery::add_item(
        db,
        &user_name,
        ItemDraft {
            name: "lighthouse".to_string(),
            location: "Lisbon".to_string(),
            coordinates_holder: GeoPoint::new(-9.1393, 38.7223),
            timestamp: "2024-05-01T10:15:00Z".to_string(),
            num_timestamp: 1_714_558_500_000,
            url: "https://images.example/lighthouse.jpg".to_string(),
        },
    )?;
    gallery::add_item(
        db,
        &user_name,
        ItemDraft {
            name: "rooftops".to_string(),
            location: "Porto".to_string(),
            coordinates_holder: GeoPoint::new(-8.6291, 41.1579),
            timestamp: "2024-05-02T18:40:00Z".to_string(),
            num_timestamp: 1_714_675_200_000,
            url: "https://images.example/rooftops.jpg".to_string(),
        },
    )?;

    post::publish(
        db,
        PostDraft {
            username: user_name.clone(),
            item_id: lighthouse.id,
            name: lighthouse.name,
            location: lighthouse.location,
            coordinates_holder: lighthouse.coordinates_holder,
            timestamp: lighthouse.timestamp,
            num_timestamp: lighthouse.num_timestamp,
            url: lighthouse.url,
        },
    )?;

    gallery::find_by_username(db, &user_name)
}
