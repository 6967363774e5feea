//! Connection, cache and acquisition settings for a [`Phenodata`](crate::Phenodata) client.

use bon::Builder;
use std::path::PathBuf;
use std::time::Duration;

/// Host of the DWD open data server.
pub const DEFAULT_HOST: &str = "opendata.dwd.de";

/// Root of the Climate Data Center tree on [`DEFAULT_HOST`].
pub const DEFAULT_BASE_PATH: &str = "/climate_environment/CDC";

/// Prefix turning a server path into a public URL.
pub const DEFAULT_URL_PREFIX: &str = "ftp://opendata.dwd.de";

/// Upstream files whose header dialect cannot be reconciled with the other
/// observation files. They are skipped during acquisition.
pub const INCOMPATIBLE_FILES: &[&str] = &[
    "PH_Jahresmelder_Landwirtschaft_Kulturpflanze_Wein_1951_1990_hist.txt",
];

/// Settings for a [`Phenodata`](crate::Phenodata) client.
///
/// The defaults point at the public DWD server with anonymous credentials
/// and a cache below the user's cache directory.
///
/// # Examples
///
/// ```
/// use phenodata::Settings;
/// use std::time::Duration;
///
/// let settings = Settings::builder()
///     .timeout(Duration::from_secs(10))
///     .progress(true)
///     .build();
/// assert_eq!(settings.host, "opendata.dwd.de");
/// assert_eq!(settings.port, 21);
/// assert!(settings.progress);
/// ```
#[derive(Debug, Clone, Builder)]
pub struct Settings {
    #[builder(into, default = DEFAULT_HOST.to_string())]
    pub host: String,

    #[builder(default = 21)]
    pub port: u16,

    #[builder(into, default = "anonymous".to_string())]
    pub username: String,

    #[builder(into, default = "anonymous".to_string())]
    pub password: String,

    /// Server path of the Climate Data Center root.
    #[builder(into, default = DEFAULT_BASE_PATH.to_string())]
    pub base_path: String,

    #[builder(into, default = DEFAULT_URL_PREFIX.to_string())]
    pub url_prefix: String,

    /// Cache location. `None` resolves to `<cache dir>/phenodata`.
    pub cache_dir: Option<PathBuf>,

    /// Time-to-live of cached directory listings.
    #[builder(default = chrono::Duration::minutes(5))]
    pub meta_ttl: chrono::Duration,

    /// Connect and read timeout of the transport.
    #[builder(default = Duration::from_secs(60))]
    pub timeout: Duration,

    /// Show a progress bar while acquiring observation files.
    #[builder(default)]
    pub progress: bool,

    #[builder(default = INCOMPATIBLE_FILES.iter().map(|name| name.to_string()).collect())]
    pub known_bad_files: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::builder().build()
    }
}
