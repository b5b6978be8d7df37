use std::net::SocketAddr;

use serde::de::DeserializeOwned;

use crate::Result;

pub static CONFIG_FILE: &'static str = "geosnap.toml";

/// Application configuration, constructed once at process start and passed
/// by reference into the services that need it.
///
/// # Sensible defaults
///
/// `Config::default()` is enough to run the service locally. Using the
/// *struct update syntax* one can initialize a new `Config`, making a few
/// changes right in the definition.
///
/// ```ignore
/// let cfg = Config {
///     tracing: Tracing {
///         enabled: false,
///         ..Default::default()
///     },
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub name: String,
    pub version: String,

    /// Address on which to serve the application. Defaults to
    /// `127.0.0.1:8080`.
    pub address: SocketAddr,

    pub db: Db,
    pub tracing: Tracing,

    pub auth: Auth,
    pub feed: Feed,

    /// List of initial accounts, created at startup if missing.
    pub users: Vec<SeedUser>,

    /// Development mode configuration.
    pub dev: DevMode,

    pub init: Init,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            address: "127.0.0.1:8080".parse().unwrap(),
            db: Db::default(),
            tracing: Tracing::default(),
            auth: Auth::default(),
            feed: Feed::default(),
            users: vec![],
            dev: DevMode::default(),
            init: Init::default(),
        }
    }
}

/// Loads application config from toml file at default location.
pub fn load<T: DeserializeOwned>() -> Result<T> {
    load_from(CONFIG_FILE)
}

/// Loads application config from toml files at standard paths using provided
/// name, overlaid with environment variables.
///
/// For example for `name` == `geosnap.toml` we will load both `geosnap.toml`
/// and `secret.geosnap.toml` from the main project directory. Neither file is
/// required to exist; defaults apply for anything left unset.
pub fn load_from<T: DeserializeOwned>(name: impl AsRef<str>) -> Result<T> {
    let config = config::Config::builder()
        .add_source(config::File::with_name(name.as_ref()).required(false))
        .add_source(config::File::with_name(&format!("secret.{}", name.as_ref())).required(false))
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix_separator("__"),
        )
        .build()?;

    let config: T = config.try_deserialize()?;

    Ok(config)
}

/// Document store location.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Db {
    /// Path to the sled database directory.
    pub path: String,
}

impl Default for Db {
    fn default() -> Self {
        Self {
            path: "./db".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Tracing {
    pub enabled: bool,

    pub mode: crate::tracing::Mode,
    pub level: crate::tracing::Level,

    pub loki_address: String,
    pub loki_token: String,
}

impl Default for Tracing {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: crate::tracing::Mode::default(),
            level: crate::tracing::Level::default(),
            loki_address: "".to_string(),
            loki_token: "".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Auth {
    /// Validity window for issued bearer tokens, counted from the moment
    /// of issue.
    pub token_validity_days: i64,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            token_validity_days: 365,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Feed {
    /// Page size used when a feed query doesn't specify a limit.
    pub default_limit: usize,
    /// Maximum distance in meters within which posts are eligible for the
    /// proximity query.
    pub max_distance_m: f64,
}

impl Default for Feed {
    fn default() -> Self {
        Self {
            default_limit: 20,
            max_distance_m: 400_000_000.0,
        }
    }
}

/// Intermediate abstraction for initiating an account from config.
#[derive(Clone, Default, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SeedUser {
    pub user_name: String,
    /// Raw password, hashed before the account is persisted. Meant for
    /// development setups; production secrets belong in `secret.geosnap.toml`.
    pub password: String,
}

/// NOTE: make sure to disable on production.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DevMode {
    /// Global switch for all dev mode items.
    pub enabled: bool,
    /// Mocking flag for all the mocking behavior performed by the service.
    pub mock: bool,
    /// Regenerative mocking behavior controls whether to regenerate mocks
    /// that are already present in the database.
    pub mock_regen: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Init {
    pub enabled: bool,
}

impl Default for Init {
    fn default() -> Self {
        Self { enabled: true }
    }
}
