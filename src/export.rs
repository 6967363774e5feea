//! Rendering of result tables and translation to canonical column names.

use crate::error::PhenodataError;
use polars::prelude::{
    AnyValue, CsvReadOptions, CsvWriter, DataFrame, JsonFormat, JsonWriter, PolarsResult,
    SerReader, SerWriter,
};
use std::fmt;
use std::io::{Cursor, Write};
use std::str::FromStr;

/// Output format of a rendered table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    /// Boxed table, as printed by polars.
    #[default]
    Tabular,
    Csv,
    /// Array of records.
    Json,
    /// Plain whitespace aligned dump.
    String,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Tabular => "tabular",
            Format::Csv => "csv",
            Format::Json => "json",
            Format::String => "string",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Format {
    type Err = PhenodataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "tabular" | "table" => Ok(Format::Tabular),
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            "string" => Ok(Format::String),
            _ => Err(PhenodataError::UnknownFormat(s.to_string())),
        }
    }
}

fn cell_text(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(text) => text.to_string(),
        AnyValue::StringOwned(text) => text.to_string(),
        other => other.to_string(),
    }
}

fn string_dump(frame: &DataFrame) -> PolarsResult<String> {
    let mut cells: Vec<Vec<String>> = vec![frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect()];
    for row in 0..frame.height() {
        let values = frame
            .get_columns()
            .iter()
            .map(|column| column.get(row).map(cell_text))
            .collect::<PolarsResult<Vec<_>>>()?;
        cells.push(values);
    }

    let widths: Vec<usize> = (0..frame.width())
        .map(|position| {
            cells
                .iter()
                .map(|line| line[position].chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();
    let mut output = String::new();
    for line in cells {
        let padded: Vec<String> = line
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect();
        output.push_str(padded.join("  ").trim_end());
        output.push('\n');
    }
    Ok(output)
}

/// Writes `frame` to `out` in the given format.
pub fn write_frame(
    frame: &mut DataFrame,
    format: Format,
    out: &mut impl Write,
) -> Result<(), PhenodataError> {
    match format {
        Format::Tabular => writeln!(out, "{}", frame).map_err(PhenodataError::Output)?,
        Format::String => out
            .write_all(string_dump(frame)?.as_bytes())
            .map_err(PhenodataError::Output)?,
        Format::Csv => CsvWriter::new(out).include_header(true).finish(frame)?,
        Format::Json => JsonWriter::new(out)
            .with_json_format(JsonFormat::Json)
            .finish(frame)?,
    }
    Ok(())
}

/// Reads a table written with [`Format::Csv`].
pub fn read_csv(payload: &[u8]) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .into_reader_with_file_handle(Cursor::new(payload.to_vec()))
        .finish()
}

/// The kinds of tables produced by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Species,
    Phase,
    QualityLevel,
    QualityByte,
    Station,
    Observation,
}

impl TableKind {
    fn column_map(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            TableKind::Species => &[
                ("Objekt_ID", "id"),
                ("Objekt", "species_name_de"),
                ("Objekt_englisch", "species_name_en"),
                ("Objekt_latein", "species_name_la"),
            ],
            TableKind::Phase => &[
                ("Phase_ID", "id"),
                ("Phase", "phase_name_de"),
                ("Phase_englisch", "phase_name_en"),
            ],
            TableKind::QualityLevel => &[("Qualitaetsniveau", "id"), ("Beschreibung", "description")],
            TableKind::QualityByte => &[("Qualitaetsbyte", "id"), ("Beschreibung", "description")],
            TableKind::Station => &[
                ("Stations_id", "id"),
                ("Stationsname", "station_name"),
                ("Distanz", "distance"),
                ("geograph.Breite", "latitude"),
                ("geograph.Laenge", "longitude"),
                ("Stationshoehe", "altitude"),
                ("Naturraumgruppe_Code", "area_group_code"),
                ("Naturraumgruppe", "area_group"),
                ("Naturraum_Code", "area_code"),
                ("Naturraum", "area"),
                ("Datum Stationsaufloesung", "station_date_abandoned"),
                ("Bundesland", "state"),
            ],
            TableKind::Observation => &[
                ("Stations_id", "station_id"),
                ("Referenzjahr", "reference_year"),
                ("Qualitaetsniveau", "quality_level_id"),
                ("Objekt_id", "species_id"),
                ("Phase_id", "phase_id"),
                ("Eintrittsdatum", "date"),
                ("Eintrittsdatum_QB", "quality_byte_id"),
                ("Jultag", "day_of_year"),
            ],
        }
    }
}

/// Renames the upstream German column names of a `kind` table to canonical
/// English names. Columns without a canonical name are kept as they are.
pub fn with_canonical_names(mut frame: DataFrame, kind: TableKind) -> PolarsResult<DataFrame> {
    for (upstream, canonical) in kind.column_map() {
        if frame.get_column_index(upstream).is_some() {
            frame.rename(upstream, (*canonical).into())?;
        }
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::megaframe::tests::observation;
    use crate::types::observation::ObservationTable;
    use std::collections::BTreeSet;

    fn table() -> ObservationTable {
        let mut invalid = observation(12365, 127, 61);
        invalid.date = None;
        ObservationTable {
            rows: vec![observation(19475, 113, 42), observation(662, 113, 46), invalid],
            has_quality_level: true,
            has_quality_byte: false,
        }
    }

    fn keys(frame: &DataFrame, names: [&str; 4]) -> BTreeSet<[i64; 4]> {
        let columns: Vec<_> = names
            .iter()
            .map(|name| frame.column(name).unwrap().i64().unwrap().clone())
            .collect();
        (0..frame.height())
            .map(|row| {
                [0, 1, 2, 3].map(|position| columns[position].get(row).unwrap())
            })
            .collect()
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("table".parse::<Format>().unwrap(), Format::Tabular);
        assert!(matches!(
            "xlsx".parse::<Format>(),
            Err(PhenodataError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_csv_round_trip() {
        let names = ["Stations_id", "Objekt_id", "Phase_id", "Referenzjahr"];
        let mut frame = table().to_frame().unwrap();
        let mut buffer = Vec::new();
        write_frame(&mut frame, Format::Csv, &mut buffer).unwrap();

        let read_back = read_csv(&buffer).unwrap();
        assert_eq!(read_back.height(), frame.height());
        assert_eq!(keys(&read_back, names), keys(&frame, names));
    }

    #[test]
    fn test_json_is_array_of_records() {
        let mut frame = table().to_frame().unwrap();
        let mut buffer = Vec::new();
        write_frame(&mut frame, Format::Json, &mut buffer).unwrap();

        let records: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        let records = records.as_array().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["Stations_id"], 19475);
        assert_eq!(records[0]["Eintrittsdatum"], "2021-02-11");
        assert!(records[2]["Eintrittsdatum"].is_null());
    }

    #[test]
    fn test_string_dump() {
        let mut frame = table().to_frame().unwrap();
        let mut buffer = Vec::new();
        write_frame(&mut frame, Format::String, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Stations_id  Referenzjahr"));
        assert!(lines[1].starts_with("19475"));
        assert!(lines[1].contains("2021-02-11"));
    }

    #[test]
    fn test_canonical_names() {
        let frame = with_canonical_names(table().to_frame().unwrap(), TableKind::Observation).unwrap();
        let names: Vec<String> = frame
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(
            names,
            [
                "station_id",
                "reference_year",
                "quality_level_id",
                "species_id",
                "phase_id",
                "date",
                "day_of_year"
            ]
        );
    }
}
