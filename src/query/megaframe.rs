//! Typed join of observation-like rows against the reference tables.
//!
//! Each joined row borrows exactly one station, species and phase record, plus
//! the quality records when the source rows carry quality columns. Rows whose
//! identifiers have no reference record are excluded with a warning, so the
//! join never duplicates rows and only drops rows it reports.

use crate::cdc::client::CdcClient;
use crate::cdc::error::DecodeError;
use crate::types::dataset::Dataset;
use crate::types::observation::Observation;
use crate::types::reference::{Phase, QualityByte, QualityLevel, Record, ReferenceTable, Species};
use crate::types::station::Station;
use log::warn;

/// Identifiers a row exposes for joining.
pub trait ReferenceKeys {
    fn station_id(&self) -> i64;
    fn species_id(&self) -> i64;
    fn phase_id(&self) -> i64;

    fn quality_level_id(&self) -> Option<i64> {
        None
    }

    fn quality_byte_id(&self) -> Option<i64> {
        None
    }
}

impl ReferenceKeys for Observation {
    fn station_id(&self) -> i64 {
        self.station_id
    }

    fn species_id(&self) -> i64 {
        self.species_id
    }

    fn phase_id(&self) -> i64 {
        self.phase_id
    }

    fn quality_level_id(&self) -> Option<i64> {
        self.quality_level
    }

    fn quality_byte_id(&self) -> Option<i64> {
        self.quality_byte
    }
}

/// Snapshot of every reference table needed to resolve observation identifiers.
#[derive(Debug, Clone, Default)]
pub struct References {
    /// All stations of the dataset, decommissioned ones included.
    pub stations: ReferenceTable<Station>,
    pub species: ReferenceTable<Species>,
    pub phases: ReferenceTable<Phase>,
    pub quality_levels: ReferenceTable<QualityLevel>,
    pub quality_bytes: ReferenceTable<QualityByte>,
}

impl References {
    pub fn load(cdc: &CdcClient, dataset: Dataset) -> Result<Self, DecodeError> {
        Ok(Self {
            stations: cdc.stations(dataset)?,
            species: cdc.species()?,
            phases: cdc.phases()?,
            quality_levels: cdc.quality_levels()?,
            quality_bytes: cdc.quality_bytes()?,
        })
    }
}

/// Which optional joins to perform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinColumns {
    pub quality_level: bool,
    pub quality_byte: bool,
}

/// One row of the megaframe.
#[derive(Debug, Clone, Copy)]
pub struct Joined<'a, R> {
    pub row: &'a R,
    pub station: &'a Station,
    pub species: &'a Species,
    pub phase: &'a Phase,
    pub quality_level: Option<&'a QualityLevel>,
    pub quality_byte: Option<&'a QualityByte>,
}

fn lookup<'a, T: Record>(
    table: &'a ReferenceTable<T>,
    id: Option<i64>,
    what: &str,
) -> Option<&'a T> {
    let found = id.and_then(|id| table.get(id));
    if found.is_none() {
        match id {
            Some(id) => warn!("No {what} record for identifier {id}, excluding row"),
            None => warn!("Row without {what} identifier, excluding row"),
        }
    }
    found
}

/// Joins `rows` against `references`, keeping row order.
pub fn join<'a, R: ReferenceKeys>(
    rows: &'a [R],
    references: &'a References,
    columns: JoinColumns,
) -> Vec<Joined<'a, R>> {
    rows.iter()
        .filter_map(|row| {
            let station = lookup(&references.stations, Some(row.station_id()), "station")?;
            let species = lookup(&references.species, Some(row.species_id()), "species")?;
            let phase = lookup(&references.phases, Some(row.phase_id()), "phase")?;
            let quality_level = if columns.quality_level {
                let id = row.quality_level_id();
                Some(lookup(&references.quality_levels, id, "quality level")?)
            } else {
                None
            };
            let quality_byte = if columns.quality_byte {
                let id = row.quality_byte_id();
                Some(lookup(&references.quality_bytes, id, "quality byte")?)
            } else {
                None
            };
            Some(Joined {
                row,
                station,
                species,
                phase,
                quality_level,
                quality_byte,
            })
        })
        .collect()
}
