//! Phenological observation rows and their tabular representation.

use chrono::NaiveDate;
use polars::prelude::{Column, DataFrame, PolarsResult};

pub(crate) const STATION_ID: &str = "Stations_id";
pub(crate) const REFERENCE_YEAR: &str = "Referenzjahr";
pub(crate) const QUALITY_LEVEL: &str = "Qualitaetsniveau";
pub(crate) const SPECIES_ID: &str = "Objekt_id";
pub(crate) const PHASE_ID: &str = "Phase_id";
pub(crate) const DATE: &str = "Eintrittsdatum";
pub(crate) const QUALITY_BYTE: &str = "Eintrittsdatum_QB";
pub(crate) const DAY_OF_YEAR: &str = "Jultag";

/// A single reported phenological event.
///
/// `(station_id, species_id, phase_id, reference_year)` is not unique upstream,
/// duplicates are kept as reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub station_id: i64,
    pub reference_year: i64,
    pub quality_level: Option<i64>,
    pub species_id: i64,
    pub phase_id: i64,
    /// `None` when the upstream value is not a valid `YYYYMMDD` date.
    pub date: Option<NaiveDate>,
    pub quality_byte: Option<i64>,
    /// Day of the year as reported. Not range checked.
    pub day_of_year: i64,
}

impl Observation {
    pub(crate) fn parse_date(raw: i64) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&raw.to_string(), "%Y%m%d").ok()
    }
}

/// The combined result of acquiring one or more observation files.
///
/// Tracks whether the optional quality columns were present in any of the
/// source files, so filters and humanized output only address columns that
/// actually exist.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationTable {
    pub rows: Vec<Observation>,
    pub has_quality_level: bool,
    pub has_quality_byte: bool,
}

impl ObservationTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends all rows of `other`, keeping their order.
    pub fn extend(&mut self, other: ObservationTable) {
        self.has_quality_level |= other.has_quality_level;
        self.has_quality_byte |= other.has_quality_byte;
        self.rows.extend(other.rows);
    }

    /// Returns a table with the same column set holding only the given rows.
    pub(crate) fn with_rows(&self, rows: Vec<Observation>) -> ObservationTable {
        ObservationTable {
            rows,
            has_quality_level: self.has_quality_level,
            has_quality_byte: self.has_quality_byte,
        }
    }

    /// Converts the observations into a `DataFrame` using the upstream column names.
    ///
    /// The date column is rendered as an ISO `YYYY-MM-DD` string, unparsable dates are null.
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let mut columns = vec![
            Column::new(
                STATION_ID.into(),
                self.rows.iter().map(|r| r.station_id).collect::<Vec<_>>(),
            ),
            Column::new(
                REFERENCE_YEAR.into(),
                self.rows.iter().map(|r| r.reference_year).collect::<Vec<_>>(),
            ),
        ];
        if self.has_quality_level {
            columns.push(Column::new(
                QUALITY_LEVEL.into(),
                self.rows.iter().map(|r| r.quality_level).collect::<Vec<_>>(),
            ));
        }
        columns.push(Column::new(
            SPECIES_ID.into(),
            self.rows.iter().map(|r| r.species_id).collect::<Vec<_>>(),
        ));
        columns.push(Column::new(
            PHASE_ID.into(),
            self.rows.iter().map(|r| r.phase_id).collect::<Vec<_>>(),
        ));
        columns.push(Column::new(
            DATE.into(),
            self.rows
                .iter()
                .map(|r| r.date.map(|d| d.format("%Y-%m-%d").to_string()))
                .collect::<Vec<_>>(),
        ));
        if self.has_quality_byte {
            columns.push(Column::new(
                QUALITY_BYTE.into(),
                self.rows.iter().map(|r| r.quality_byte).collect::<Vec<_>>(),
            ));
        }
        columns.push(Column::new(
            DAY_OF_YEAR.into(),
            self.rows.iter().map(|r| r.day_of_year).collect::<Vec<_>>(),
        ));
        DataFrame::new(columns)
    }
}
