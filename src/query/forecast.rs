//! Forecast of phenological events from historical observations.

use crate::query::megaframe::ReferenceKeys;
use crate::types::observation::{ObservationTable, DATE, DAY_OF_YEAR, PHASE_ID, SPECIES_ID, STATION_ID};
use chrono::NaiveDate;
use log::warn;
use polars::prelude::{Column, DataFrame, PolarsResult};
use std::collections::BTreeMap;

/// The expected event of one (station, species, phase) group in the target year.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRow {
    pub station_id: i64,
    pub species_id: i64,
    pub phase_id: i64,
    /// Mean day of the year, rounded half to even.
    pub day_of_year: i64,
    /// `None` when the day does not exist in the target year.
    pub date: Option<NaiveDate>,
}

impl ReferenceKeys for ForecastRow {
    fn station_id(&self) -> i64 {
        self.station_id
    }

    fn species_id(&self) -> i64 {
        self.species_id
    }

    fn phase_id(&self) -> i64 {
        self.phase_id
    }
}

fn project_onto_year(year: i32, day_of_year: i64) -> Option<NaiveDate> {
    let date = u32::try_from(day_of_year)
        .ok()
        .and_then(|day| NaiveDate::from_yo_opt(year, day));
    if date.is_none() {
        warn!("Day {day_of_year} does not exist in {year}, forecast date left empty");
    }
    date
}

/// Averages the day of the year per (station, species, phase) and projects it
/// onto `target_year`. Rows are ordered by the group key.
pub fn forecast(table: &ObservationTable, target_year: i32) -> Vec<ForecastRow> {
    let mut groups: BTreeMap<(i64, i64, i64), (i64, i64)> = BTreeMap::new();
    for row in &table.rows {
        let (sum, count) = groups
            .entry((row.station_id, row.species_id, row.phase_id))
            .or_default();
        *sum += row.day_of_year;
        *count += 1;
    }

    groups
        .into_iter()
        .map(|((station_id, species_id, phase_id), (sum, count))| {
            let day_of_year = (sum as f64 / count as f64).round_ties_even() as i64;
            ForecastRow {
                station_id,
                species_id,
                phase_id,
                day_of_year,
                date: project_onto_year(target_year, day_of_year),
            }
        })
        .collect()
}

/// Renders forecast rows using the upstream column names.
pub fn forecast_frame(rows: &[ForecastRow]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        Column::new(
            DATE.into(),
            rows.iter()
                .map(|r| r.date.map(|d| d.format("%Y-%m-%d").to_string()))
                .collect::<Vec<_>>(),
        ),
        Column::new(DAY_OF_YEAR.into(), rows.iter().map(|r| r.day_of_year).collect::<Vec<_>>()),
        Column::new(STATION_ID.into(), rows.iter().map(|r| r.station_id).collect::<Vec<_>>()),
        Column::new(SPECIES_ID.into(), rows.iter().map(|r| r.species_id).collect::<Vec<_>>()),
        Column::new(PHASE_ID.into(), rows.iter().map(|r| r.phase_id).collect::<Vec<_>>()),
    ])
}
