//! Data initialization procedures.
//!
//! The app config can contain entries describing accounts expected to exist
//! after the application is started. This module converts them into initial
//! application state.

use crate::{gallery, Config, Database, Result};

/// Initializes database state based on entries found in the configuration.
pub fn initialize(config: &Config, db: &Database) -> Result<()> {
    accounts(config, db)?;
    Ok(())
}

/// Creates accounts from config entries. Existing accounts are left as they
/// are; the config password does not overwrite a live credential.
pub fn accounts(config: &Config, db: &Database) -> Result<()> {
    for seed in &config.users {
        if seed.user_name.is_empty() || seed.password.is_empty() {
            tracing::warn!("skipping seed account with empty username or password");
            continue;
        }
        if gallery::find_by_username(db, &seed.user_name).is_ok() {
            continue;
        }
        gallery::create(db, &seed.user_name, &seed.password)?;
        tracing::info!("created seed account: {}", seed.user_name);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SeedUser;

    #[test]
    fn seeds_accounts_once() {
        let db = Database::temporary().unwrap();
        let config = Config {
            users: vec![SeedUser {
                user_name: "seeded".to_string(),
                password: "pw".to_string(),
            }],
            ..Default::default()
        };

        initialize(&config, &db).unwrap();
        let first = gallery::find_by_username(&db, "seeded").unwrap();

        // second run leaves the record alone
        initialize(&config, &db).unwrap();
        let second = gallery::find_by_username(&db, "seeded").unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.user_password, second.user_password);
    }

    #[test]
    fn skips_incomplete_entries() {
        let db = Database::temporary().unwrap();
        let config = Config {
            users: vec![SeedUser {
                user_name: "".to_string(),
                password: "pw".to_string(),
            }],
            ..Default::default()
        };
        initialize(&config, &db).unwrap();
        assert!(gallery::list_all(&db).unwrap().is_empty());
    }
}
