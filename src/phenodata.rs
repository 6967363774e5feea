//! This module provides the main entry point for accessing the DWD phenology archive.
//! It lists reference data, scans observation files, and returns filtered, optionally
//! humanized observations and forecasts.

use crate::cache::{drop_storage, DropOutcome, ResponseCache};
use crate::cdc::client::CdcClient;
use crate::cdc::reference::select_stations;
use crate::error::PhenodataError;
use crate::query::acquire::acquire;
use crate::query::flux::flux;
use crate::query::forecast::{forecast, forecast_frame};
use crate::query::humanizer::{HumanizeOptions, Humanizer};
use crate::query::megaframe::{join, JoinColumns, References};
use crate::remote::client::RemoteClient;
use crate::remote::transport::{FtpTransport, Transport};
use crate::settings::Settings;
use crate::stations::locate_station::{nearest_frame, nearest_stations, DEFAULT_LIMIT};
use crate::types::criteria::FilterCriteria;
use crate::types::dataset::{Dataset, FileProjection, Partition};
use crate::types::observation::ObservationTable;
use crate::types::reference::{Phase, QualityByte, QualityLevel, ReferenceTable, Species};
use crate::types::station::{stations_frame, Station};
use crate::utils::{ensure_cache_dir_exists, get_cache_dir};
use bon::bon;
use chrono::{Datelike, Local};
use log::info;
use polars::prelude::DataFrame;
use std::path::{Path, PathBuf};

/// Represents a geographical coordinate using latitude and longitude.
///
/// Latitude is the first element (index 0), and longitude is the second (index 1).
///
/// # Examples
///
/// ```
/// use phenodata::LatLon;
///
/// let berlin_center = LatLon(52.5200, 13.4050);
/// assert_eq!(berlin_center.0, 52.5200); // Latitude
/// assert_eq!(berlin_center.1, 13.4050); // Longitude
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon(pub f64, pub f64);

/// The main client struct for accessing DWD phenology data.
///
/// Every upstream file passes through a [`ResponseCache`]: directory listings
/// are kept for a short time, file contents until the server reports a newer
/// modification time. All requests are issued one after another.
///
/// Create an instance using [`Phenodata::new()`] for the public DWD server with
/// the default cache, or [`Phenodata::with_settings()`] to change either.
///
/// # Examples
///
/// ```no_run
/// # use phenodata::{Dataset, FilterCriteria, Partition, Phenodata, PhenodataError};
/// # fn run() -> Result<(), PhenodataError> {
/// let client = Phenodata::new()?;
/// let criteria = FilterCriteria::builder()
///     .partition(Partition::Recent)
///     .files(vec!["Hasel".to_string()])
///     .build();
/// if let Some(frame) = client
///     .observations()
///     .dataset(Dataset::Immediate)
///     .criteria(&criteria)
///     .call()?
/// {
///     println!("{frame}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Phenodata {
    cdc: CdcClient,
    settings: Settings,
    cache_root: Option<PathBuf>,
}

#[bon]
impl Phenodata {
    /// Creates a client for the public DWD server, caching below the user's cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`PhenodataError::CacheDirResolution`] if the default cache directory cannot be found,
    /// [`PhenodataError::CacheDirCreation`] or [`PhenodataError::Cache`] if it cannot be set up.
    pub fn new() -> Result<Self, PhenodataError> {
        Self::with_settings(Settings::default())
    }

    /// Creates a client from explicit [`Settings`].
    ///
    /// No connection is opened until the first request.
    pub fn with_settings(settings: Settings) -> Result<Self, PhenodataError> {
        let cache_root = Self::cache_root(&settings)?;
        ensure_cache_dir_exists(&cache_root)?;
        let cache = ResponseCache::open(&cache_root, settings.meta_ttl)?;
        let transport = FtpTransport::new(&settings);
        let mut client = Self::with_transport(Box::new(transport), cache, settings);
        client.cache_root = Some(cache_root);
        Ok(client)
    }

    /// Creates a client over any [`Transport`] and cache.
    pub fn with_transport(
        transport: Box<dyn Transport>,
        cache: ResponseCache,
        settings: Settings,
    ) -> Self {
        let remote = RemoteClient::new(transport, cache);
        let cdc = CdcClient::new(remote, &settings.base_path, &settings.url_prefix);
        Self {
            cdc,
            cache_root: None,
            settings,
        }
    }

    fn cache_root(settings: &Settings) -> Result<PathBuf, PhenodataError> {
        match &settings.cache_dir {
            Some(path) => Ok(path.clone()),
            None => get_cache_dir(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Directory of the on-disk cache, `None` for clients built with [`Phenodata::with_transport`].
    pub fn cache_location(&self) -> Option<&Path> {
        self.cache_root.as_deref()
    }

    /// Removes the on-disk cache configured in `settings`.
    pub fn drop_cache(settings: &Settings) -> Result<DropOutcome, PhenodataError> {
        let root = Self::cache_root(settings)?;
        info!("Dropping cache at {}", root.display());
        Ok(drop_storage(&root)?)
    }

    pub fn species(&self) -> Result<ReferenceTable<Species>, PhenodataError> {
        Ok(self.cdc.species()?)
    }

    pub fn phases(&self) -> Result<ReferenceTable<Phase>, PhenodataError> {
        Ok(self.cdc.phases()?)
    }

    pub fn quality_levels(&self) -> Result<ReferenceTable<QualityLevel>, PhenodataError> {
        Ok(self.cdc.quality_levels()?)
    }

    pub fn quality_bytes(&self) -> Result<ReferenceTable<QualityByte>, PhenodataError> {
        Ok(self.cdc.quality_bytes()?)
    }

    /// All stations of `dataset`, decommissioned ones included.
    pub fn stations(&self, dataset: Dataset) -> Result<ReferenceTable<Station>, PhenodataError> {
        Ok(self.cdc.stations(dataset)?)
    }

    /// Lists stations of a dataset.
    ///
    /// # Arguments
    ///
    /// * `.dataset(Dataset)`: **Required.** Reporter kind whose stations are listed.
    /// * `.include_all(bool)`: Optional. Include decommissioned stations. Defaults to `false`.
    /// * `.filter(&str)`: Optional. Keeps stations whose name, natural region group,
    ///   natural region or state contains the text, ignoring case.
    #[builder]
    pub fn list_stations(
        &self,
        dataset: Dataset,
        #[builder(default)] include_all: bool,
        filter: Option<&str>,
    ) -> Result<DataFrame, PhenodataError> {
        let stations = self.cdc.stations(dataset)?;
        let selected = select_stations(&stations, include_all, filter)?;
        Ok(stations_frame(&selected, None)?)
    }

    /// Finds the stations closest to a location, nearest first.
    ///
    /// The result carries a `Distanz` column in meters after the station name.
    ///
    /// # Arguments
    ///
    /// * `.dataset(Dataset)`: **Required.**
    /// * `.location(LatLon)`: **Required.** The point to measure from.
    /// * `.include_all(bool)`: Optional. Consider decommissioned stations. Defaults to `false`.
    /// * `.limit(usize)`: Optional. Maximum number of stations. Defaults to `10`.
    #[builder]
    pub fn nearest_stations(
        &self,
        dataset: Dataset,
        location: LatLon,
        #[builder(default)] include_all: bool,
        limit: Option<usize>,
    ) -> Result<DataFrame, PhenodataError> {
        let stations = self.cdc.stations(dataset)?;
        let candidates = stations
            .iter()
            .filter(|station| include_all || station.is_active());
        let nearby = nearest_stations(
            candidates,
            location.0,
            location.1,
            limit.unwrap_or(DEFAULT_LIMIT),
        );
        Ok(nearest_frame(&nearby)?)
    }

    /// The single closest station, see [`Phenodata::nearest_stations`].
    #[builder]
    pub fn nearest_station(
        &self,
        dataset: Dataset,
        location: LatLon,
        #[builder(default)] include_all: bool,
    ) -> Result<DataFrame, PhenodataError> {
        self.nearest_stations()
            .dataset(dataset)
            .location(location)
            .include_all(include_all)
            .limit(1)
            .call()
    }

    /// Lists the observation files of a dataset partition.
    ///
    /// # Arguments
    ///
    /// * `.dataset(Dataset)`: **Required.**
    /// * `.partition(Partition)`: **Required.**
    /// * `.fragments(Vec<String>)`: Optional. Keeps files whose name contains any fragment.
    /// * `.projection(FileProjection)`: Optional. Defaults to the bare file name.
    #[builder]
    pub fn files(
        &self,
        dataset: Dataset,
        partition: Partition,
        fragments: Option<Vec<String>>,
        #[builder(default)] projection: FileProjection,
    ) -> Result<Vec<String>, PhenodataError> {
        let fragments = fragments.filter(|fragments| !fragments.is_empty());
        let entries = self
            .cdc
            .scan_files(dataset, partition, fragments.as_deref())?;
        Ok(entries
            .iter()
            .map(|entry| self.cdc.project(entry, projection))
            .collect())
    }

    /// Acquires and filters observations as typed rows.
    ///
    /// Returns `Ok(None)` when no file matched or no row passed the filters.
    pub fn query(
        &self,
        dataset: Dataset,
        criteria: &FilterCriteria,
    ) -> Result<Option<ObservationTable>, PhenodataError> {
        self.query_with(dataset, criteria, false)
            .map(|result| result.map(|(table, _)| table))
    }

    fn query_with(
        &self,
        dataset: Dataset,
        criteria: &FilterCriteria,
        needs_references: bool,
    ) -> Result<Option<(ObservationTable, References)>, PhenodataError> {
        let Some(table) = acquire(
            &self.cdc,
            dataset,
            criteria,
            &self.settings.known_bad_files,
            self.settings.progress,
        )?
        else {
            return Ok(None);
        };
        let references = if needs_references || criteria.has_text_criteria() {
            References::load(&self.cdc, dataset)?
        } else {
            References::default()
        };
        let table = flux(table, criteria, &references)?;
        if table.is_empty() {
            info!("No observations match the criteria");
            return Ok(None);
        }
        Ok(Some((table, references)))
    }

    /// Retrieves observations matching `criteria`.
    ///
    /// Without `humanize` the frame holds the upstream columns with the date as
    /// ISO string. With `humanize` it holds labels, see [`Humanizer::observations`].
    ///
    /// # Arguments
    ///
    /// * `.dataset(Dataset)`: **Required.**
    /// * `.criteria(&FilterCriteria)`: **Required.**
    /// * `.humanize(HumanizeOptions)`: Optional. Replace identifiers by labels.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when nothing matched.
    #[builder]
    pub fn observations(
        &self,
        dataset: Dataset,
        criteria: &FilterCriteria,
        humanize: Option<HumanizeOptions>,
    ) -> Result<Option<DataFrame>, PhenodataError> {
        let Some((table, references)) = self.query_with(dataset, criteria, humanize.is_some())?
        else {
            return Ok(None);
        };
        let frame = match humanize {
            None => table.to_frame()?,
            Some(options) => {
                let columns = JoinColumns {
                    quality_level: table.has_quality_level,
                    quality_byte: table.has_quality_byte,
                };
                let joined = join(&table.rows, &references, columns);
                if joined.is_empty() {
                    info!("No observation resolved against the reference tables");
                    return Ok(None);
                }
                Humanizer::new(options).observations(&joined, columns)?
            }
        };
        Ok(Some(frame))
    }

    /// Forecasts events of `target_year` from the observations matching `criteria`.
    ///
    /// Each (station, species, phase) group yields its mean day of the year,
    /// rounded half to even and placed in the target year.
    ///
    /// # Arguments
    ///
    /// * `.dataset(Dataset)`: **Required.**
    /// * `.criteria(&FilterCriteria)`: **Required.**
    /// * `.target_year(i32)`: Optional. Defaults to the current year.
    /// * `.humanize(HumanizeOptions)`: Optional. Replace identifiers by labels.
    #[builder]
    pub fn forecast(
        &self,
        dataset: Dataset,
        criteria: &FilterCriteria,
        target_year: Option<i32>,
        humanize: Option<HumanizeOptions>,
    ) -> Result<Option<DataFrame>, PhenodataError> {
        let target_year = target_year.unwrap_or_else(|| Local::now().year());
        let Some((table, references)) = self.query_with(dataset, criteria, humanize.is_some())?
        else {
            return Ok(None);
        };
        let rows = forecast(&table, target_year);
        let frame = match humanize {
            None => forecast_frame(&rows)?,
            Some(options) => {
                let joined = join(&rows, &references, JoinColumns::default());
                if joined.is_empty() {
                    info!("No forecast resolved against the reference tables");
                    return Ok(None);
                }
                Humanizer::new(options).forecast(&joined, target_year)?
            }
        };
        Ok(Some(frame))
    }
}
