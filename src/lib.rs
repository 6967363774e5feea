mod cache;
mod cdc;
mod error;
mod export;
mod phenodata;
mod presets;
mod query;
mod remote;
mod settings;
mod stations;
#[cfg(test)]
mod testing;
mod types;
mod utils;

pub use error::PhenodataError;
pub use phenodata::*;
pub use settings::*;

pub use cache::error::CacheError;
pub use cache::region::{CacheRegion, DiskRegion, MemoryRegion};
pub use cache::{drop_storage, DropOutcome, ResponseCache};

pub use cdc::client::CdcClient;
pub use cdc::decoder::{decode, DecodeOptions};
pub use cdc::error::DecodeError;
pub use cdc::reference::select_stations;

pub use remote::client::RemoteClient;
pub use remote::error::TransportError;
pub use remote::listing::DirectoryEntry;
pub use remote::transport::{FtpTransport, Transport};

pub use query::acquire::{acquire, observations_from_frame};
pub use query::flux::{filter_by_ids, filter_by_text, flux};
pub use query::forecast::{forecast, forecast_frame, ForecastRow};
pub use query::humanizer::{HumanizeOptions, Humanizer, Language};
pub use query::megaframe::{join, JoinColumns, Joined, ReferenceKeys, References};

pub use stations::locate_station::{
    distance_meters, nearest_frame, nearest_stations, NearbyStation, DEFAULT_LIMIT,
};

pub use types::criteria::FilterCriteria;
pub use types::dataset::{Dataset, FileProjection, Partition};
pub use types::observation::{Observation, ObservationTable};
pub use types::reference::{Phase, QualityByte, QualityLevel, Record, ReferenceTable, Species};
pub use types::station::Station;

pub use export::{read_csv, with_canonical_names, write_frame, Format, TableKind};
pub use presets::{load_preset, species_groups};
pub use utils::get_cache_dir;
