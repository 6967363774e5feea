//! Acquisition of observation files into one [`ObservationTable`].

use crate::cdc::client::CdcClient;
use crate::cdc::decoder::DecodeOptions;
use crate::cdc::error::DecodeError;
use crate::error::PhenodataError;
use crate::types::dataset::Dataset;
use crate::types::observation::{
    Observation, ObservationTable, DATE, DAY_OF_YEAR, PHASE_ID, QUALITY_BYTE, QUALITY_LEVEL,
    REFERENCE_YEAR, SPECIES_ID, STATION_ID,
};
use crate::types::criteria::FilterCriteria;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use polars::prelude::{DataFrame, Int64Chunked};

fn progress_bar(files: usize, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    ProgressBar::new(files as u64).with_style(
        ProgressStyle::with_template("[{eta_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    )
}

fn int_column<'a>(
    frame: &'a DataFrame,
    name: &str,
    resource: &str,
) -> Result<Option<&'a Int64Chunked>, DecodeError> {
    match frame.column(name) {
        Ok(column) => column
            .i64()
            .map(Some)
            .map_err(|e| DecodeError::Polars(resource.to_string(), e)),
        Err(_) => Ok(None),
    }
}

fn required_column<'a>(
    frame: &'a DataFrame,
    name: &str,
    resource: &str,
) -> Result<&'a Int64Chunked, DecodeError> {
    int_column(frame, name, resource)?.ok_or_else(|| DecodeError::MissingColumn {
        resource: resource.to_string(),
        column: name.to_string(),
    })
}

/// Converts a decoded, integer typed observation file into typed rows.
///
/// The quality columns are optional. Rows lacking a required identifier are
/// skipped with a warning, unparsable dates become `None`.
pub fn observations_from_frame(
    frame: &DataFrame,
    resource: &str,
) -> Result<ObservationTable, DecodeError> {
    let station_id = required_column(frame, STATION_ID, resource)?;
    let reference_year = required_column(frame, REFERENCE_YEAR, resource)?;
    let species_id = required_column(frame, SPECIES_ID, resource)?;
    let phase_id = required_column(frame, PHASE_ID, resource)?;
    let date = required_column(frame, DATE, resource)?;
    let day_of_year = required_column(frame, DAY_OF_YEAR, resource)?;
    let quality_level = int_column(frame, QUALITY_LEVEL, resource)?;
    let quality_byte = int_column(frame, QUALITY_BYTE, resource)?;

    let mut rows = Vec::with_capacity(frame.height());
    for index in 0..frame.height() {
        let required = (
            station_id.get(index),
            reference_year.get(index),
            species_id.get(index),
            phase_id.get(index),
            day_of_year.get(index),
        );
        let (Some(station_id), Some(reference_year), Some(species_id), Some(phase_id), Some(day_of_year)) =
            required
        else {
            warn!("Resource \"{resource}\": skipping record {} lacking an identifier", index + 1);
            continue;
        };
        rows.push(Observation {
            station_id,
            reference_year,
            quality_level: quality_level.and_then(|column| column.get(index)),
            species_id,
            phase_id,
            date: date.get(index).and_then(Observation::parse_date),
            quality_byte: quality_byte.and_then(|column| column.get(index)),
            day_of_year,
        });
    }

    Ok(ObservationTable {
        rows,
        has_quality_level: quality_level.is_some(),
        has_quality_byte: quality_byte.is_some(),
    })
}

/// Reads every observation file of `dataset` selected by the partition and
/// file fragments of `criteria` into one table, in scan order.
///
/// Files listed in `known_bad_files` are skipped, as is any file failing to
/// decode. Returns `Ok(None)` when no file matched or none held any record.
pub fn acquire(
    cdc: &CdcClient,
    dataset: Dataset,
    criteria: &FilterCriteria,
    known_bad_files: &[String],
    progress: bool,
) -> Result<Option<ObservationTable>, PhenodataError> {
    let files = cdc.scan_files(dataset, criteria.partition, criteria.file_fragments())?;
    if files.is_empty() {
        info!("No files to process");
        return Ok(None);
    }
    info!("Acquiring {} files", files.len());

    let bar = progress_bar(files.len(), progress);
    let mut table: Option<ObservationTable> = None;
    for file in &files {
        bar.set_message(file.name.clone());
        if known_bad_files.iter().any(|bad| *bad == file.name) {
            warn!("Skipping file \"{}\" with an incompatible header", file.name);
            bar.inc(1);
            continue;
        }
        let decoded = cdc
            .get_frame_at(&file.full_path, DecodeOptions::integers())
            .and_then(|frame| {
                frame
                    .map(|frame| observations_from_frame(&frame, &file.full_path))
                    .transpose()
            });
        match decoded {
            Ok(Some(observations)) => match table.as_mut() {
                Some(table) => table.extend(observations),
                None => table = Some(observations),
            },
            Ok(None) => {}
            Err(e) => warn!("Skipping file \"{}\": {e}", file.name),
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    Ok(table.filter(|table| !table.is_empty()))
}
