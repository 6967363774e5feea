//! Typed access to the reference tables published in the CDC `help` directory.

use crate::cdc::client::CdcClient;
use crate::cdc::decoder::DecodeOptions;
use crate::cdc::error::DecodeError;
use crate::types::dataset::Dataset;
use crate::types::reference::{Phase, QualityByte, QualityLevel, Record, ReferenceTable, Species};
use crate::types::station::Station;
use crate::utils::term_matcher;
use log::warn;
use polars::prelude::DataFrame;

pub const SPECIES_FILE: &str = "/help/PH_Beschreibung_Pflanze.txt";
pub const PHASES_FILE: &str = "/help/PH_Beschreibung_Phase.txt";
pub const QUALITY_LEVELS_FILE: &str = "/help/PH_Beschreibung_Phaenologie_Qualitaetsniveau.txt";
pub const QUALITY_BYTES_FILE: &str = "/help/PH_Beschreibung_Phaenologie_Qualitaetsbyte.txt";

/// Column access on a keyed reference frame, reporting missing columns by resource.
struct ReferenceColumns<'a> {
    frame: &'a DataFrame,
    resource: &'a str,
}

impl<'a> ReferenceColumns<'a> {
    fn column(&self, name: &str) -> Result<&'a polars::prelude::Column, DecodeError> {
        self.frame
            .column(name)
            .map_err(|_| DecodeError::MissingColumn {
                resource: self.resource.to_string(),
                column: name.to_string(),
            })
    }

    /// The integer key column, always the first one.
    fn keys(&self) -> Result<Vec<i64>, DecodeError> {
        let column = self.frame.get_columns().first().ok_or_else(|| {
            DecodeError::MissingColumn {
                resource: self.resource.to_string(),
                column: "<key>".to_string(),
            }
        })?;
        let keys = column
            .i64()
            .map_err(|e| DecodeError::Polars(self.resource.to_string(), e))?;
        Ok(keys.into_iter().flatten().collect())
    }

    fn optional_texts(&self, name: &str) -> Result<Vec<Option<String>>, DecodeError> {
        let values = self
            .column(name)?
            .str()
            .map_err(|e| DecodeError::Polars(self.resource.to_string(), e))?;
        Ok(values.into_iter().map(|v| v.map(str::to_string)).collect())
    }

    fn texts(&self, name: &str) -> Result<Vec<String>, DecodeError> {
        Ok(self
            .optional_texts(name)?
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect())
    }

    fn optional_ints(&self, name: &str) -> Result<Vec<Option<i64>>, DecodeError> {
        Ok(self
            .optional_texts(name)?
            .into_iter()
            .map(|v| v.and_then(|v| v.parse().ok()))
            .collect())
    }
}

impl CdcClient {
    fn reference_table<T: Record>(
        &self,
        path: &str,
        extract: impl FnOnce(&ReferenceColumns) -> Result<Vec<T>, DecodeError>,
    ) -> Result<ReferenceTable<T>, DecodeError> {
        let Some(frame) = self.get_frame(path, DecodeOptions::keyed(0))? else {
            warn!("Reference table \"{path}\" is unavailable");
            return Ok(ReferenceTable::default());
        };
        let columns = ReferenceColumns {
            frame: &frame,
            resource: path,
        };
        Ok(extract(&columns)?.into_iter().collect())
    }

    pub fn species(&self) -> Result<ReferenceTable<Species>, DecodeError> {
        self.reference_table(SPECIES_FILE, |columns| {
            Ok(columns
                .keys()?
                .into_iter()
                .zip(columns.texts("Objekt")?)
                .zip(columns.texts("Objekt_englisch")?)
                .zip(columns.texts("Objekt_latein")?)
                .map(|(((id, name_de), name_en), name_la)| Species {
                    id,
                    name_de,
                    name_en,
                    name_la,
                })
                .collect())
        })
    }

    pub fn phases(&self) -> Result<ReferenceTable<Phase>, DecodeError> {
        self.reference_table(PHASES_FILE, |columns| {
            Ok(columns
                .keys()?
                .into_iter()
                .zip(columns.texts("Phase")?)
                .zip(columns.texts("Phase_englisch")?)
                .map(|((id, name_de), name_en)| Phase {
                    id,
                    name_de,
                    name_en,
                })
                .collect())
        })
    }

    pub fn quality_levels(&self) -> Result<ReferenceTable<QualityLevel>, DecodeError> {
        self.reference_table(QUALITY_LEVELS_FILE, |columns| {
            Ok(columns
                .keys()?
                .into_iter()
                .zip(columns.texts("Beschreibung")?)
                .map(|(id, description)| QualityLevel { id, description })
                .collect())
        })
    }

    pub fn quality_bytes(&self) -> Result<ReferenceTable<QualityByte>, DecodeError> {
        self.reference_table(QUALITY_BYTES_FILE, |columns| {
            Ok(columns
                .keys()?
                .into_iter()
                .zip(columns.texts("Beschreibung")?)
                .map(|(id, description)| QualityByte { id, description })
                .collect())
        })
    }

    /// All stations of a reporter kind, decommissioned ones included.
    pub fn stations(&self, dataset: Dataset) -> Result<ReferenceTable<Station>, DecodeError> {
        let path = dataset.stations_file();
        self.reference_table(path, |columns| {
            let ids = columns.keys()?;
            let names = columns.texts("Stationsname")?;
            let latitudes = columns.optional_texts("geograph.Breite")?;
            let longitudes = columns.optional_texts("geograph.Laenge")?;
            let altitudes = columns.optional_ints("Stationshoehe")?;
            let area_group_codes = columns.optional_ints("Naturraumgruppe_Code")?;
            let area_groups = columns.texts("Naturraumgruppe")?;
            let area_codes = columns.optional_ints("Naturraum_Code")?;
            let areas = columns.texts("Naturraum")?;
            let decommissioned = columns.optional_texts("Datum Stationsaufloesung")?;
            let states = columns.texts("Bundesland")?;

            let mut stations = Vec::with_capacity(ids.len());
            for (row, id) in ids.into_iter().enumerate() {
                let coordinates = latitudes[row]
                    .as_deref()
                    .and_then(|v| v.parse::<f64>().ok())
                    .zip(longitudes[row].as_deref().and_then(|v| v.parse::<f64>().ok()));
                let Some((latitude, longitude)) = coordinates else {
                    warn!("Station {id} in \"{path}\" has no valid coordinates, skipping");
                    continue;
                };
                stations.push(Station {
                    id,
                    name: names[row].clone(),
                    latitude,
                    longitude,
                    altitude: altitudes[row],
                    area_group_code: area_group_codes[row],
                    area_group: area_groups[row].clone(),
                    area_code: area_codes[row],
                    area: areas[row].clone(),
                    decommissioned: decommissioned[row].clone(),
                    state: states[row].clone(),
                });
            }
            Ok(stations)
        })
    }
}

/// Selects stations for listing.
///
/// Decommissioned stations are left out unless `include_all` is set. A
/// `filter` keeps stations whose name, natural region group, natural region
/// or state contains it, ignoring case.
pub fn select_stations<'a>(
    stations: &'a ReferenceTable<Station>,
    include_all: bool,
    filter: Option<&str>,
) -> Result<Vec<&'a Station>, regex::Error> {
    let matcher = filter
        .filter(|text| !text.trim().is_empty())
        .map(|text| term_matcher(&[text.trim()]))
        .transpose()?;
    Ok(stations
        .iter()
        .filter(|station| include_all || station.is_active())
        .filter(|station| {
            matcher.as_ref().map_or(true, |matcher| {
                station
                    .search_fields()
                    .iter()
                    .any(|field| matcher.is_match(field))
            })
        })
        .collect())
}
