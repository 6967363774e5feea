//! Decodes the semicolon separated text files published by the CDC.
//!
//! Upstream files end every record with an `eor` sentinel followed by an
//! empty trailing column, occasionally wrap records with stray `\r\n`
//! sequences and use a few file specific header dialects. [`decode`] repairs
//! all of this and returns a `DataFrame` with one row per record.

use crate::cdc::error::DecodeError;
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{debug, warn};
use polars::prelude::{Column, DataFrame};
use regex::Regex;

const END_OF_RECORD: &str = "eor";

/// Columns whose absence marks a record as structurally incomplete.
const REQUIRED_VALUES: [&str; 3] = [END_OF_RECORD, "Eintrittsdatum", "Jultag"];

/// Header spellings of the all-caps beet files mapped to the names used elsewhere.
const UPPERCASE_HEADER_MAP: [(&str, &str); 8] = [
    ("STATIONS_ID", "Stations_id"),
    ("OBJEKT_ID", "Objekt_id"),
    ("PHASE_ID", "Phase_id"),
    ("REFERENZJAHR", "Referenzjahr"),
    ("EINTRITTSDATUM", "Eintrittsdatum"),
    ("JULTAG", "Jultag"),
    ("EINTRITTSDATUM_QB", "Eintrittsdatum_QB"),
    ("QUALITAETSNIVEAU", "Qualitaetsniveau"),
];

/// How the decoded columns are typed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Position of a column holding integer row keys. Rows with a key that is
    /// not an integer are dropped.
    pub key_column: Option<usize>,
    /// Parse every column as integer. Rows with a non-integer value are dropped,
    /// empty values become null.
    pub coerce_int: bool,
}

impl DecodeOptions {
    pub fn keyed(key_column: usize) -> Self {
        Self {
            key_column: Some(key_column),
            coerce_int: false,
        }
    }

    pub fn integers() -> Self {
        Self {
            key_column: None,
            coerce_int: true,
        }
    }
}

/// Decodes `payload`, fetched from `resource`, into a `DataFrame`.
///
/// Returns `Ok(None)` when the payload holds no complete record.
///
/// # Errors
///
/// Only fails when the frame itself cannot be assembled. Malformed records
/// are logged and skipped.
pub fn decode(
    payload: &[u8],
    resource: &str,
    options: DecodeOptions,
) -> Result<Option<DataFrame>, DecodeError> {
    let text = normalize_records(&to_text(payload), resource)?;
    if text.is_empty() {
        debug!("Resource \"{resource}\" is empty");
        return Ok(None);
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = match reader.headers() {
        Ok(headers) => headers.iter().map(str::to_string).collect(),
        Err(e) => {
            warn!("Resource \"{resource}\" has an unreadable header: {e}");
            return Ok(None);
        }
    };

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for (line, record) in reader.records().enumerate() {
        match record {
            Ok(record) if record.len() == headers.len() => rows.push(cells(&record)),
            Ok(record) => warn!(
                "Resource \"{resource}\": skipping record {} with {} fields, expected {}",
                line + 1,
                record.len(),
                headers.len()
            ),
            Err(e) => warn!("Resource \"{resource}\": skipping unreadable record: {e}"),
        }
    }

    let required: Vec<usize> = REQUIRED_VALUES
        .iter()
        .filter_map(|name| headers.iter().position(|header| header == name))
        .collect();
    rows.retain(|row| required.iter().all(|&position| row[position].is_some()));

    let keep: Vec<usize> = (0..headers.len())
        .filter(|&position| {
            let header = headers[position].as_str();
            let trailing = position + 1 == headers.len() && header.is_empty();
            !trailing && header != END_OF_RECORD
        })
        .collect();

    let frame = if options.coerce_int {
        integer_frame(&headers, &keep, rows, resource)
    } else {
        text_frame(&headers, &keep, rows, options.key_column, resource)
    };
    let frame = frame.map_err(|e| DecodeError::Polars(resource.to_string(), e))?;

    if frame.height() == 0 {
        debug!("Resource \"{resource}\" holds no complete records");
        return Ok(None);
    }
    Ok(Some(frame))
}

/// UTF-8 with a Latin-1 fallback, the two encodings seen on the CDC server.
fn to_text(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => payload.iter().map(|&byte| byte as char).collect(),
    }
}

/// Makes one physical line equal one record and applies file specific fixups.
fn normalize_records(text: &str, resource: &str) -> Result<String, DecodeError> {
    let sentinel = Regex::new(r";\s*eor\s*;\s*")?;
    let joined = text.trim().replace("\r\n", "");
    let mut text = sentinel.replace_all(&joined, ";eor;\n").trim().to_string();

    if resource.contains("Qualitaetsbyte") {
        text = text.replace("Eintrittsdatum;", "Eintrittsdatum,");
    }
    if resource.contains("Kulturpflanze_Ruebe_akt") || resource.contains("Kulturpflanze_Ruebe_hist") {
        text = remap_header(&text);
    }
    Ok(text)
}

fn remap_header(text: &str) -> String {
    let (header, body) = text.split_once('\n').unwrap_or((text, ""));
    let header = header
        .split(';')
        .map(|field| {
            UPPERCASE_HEADER_MAP
                .iter()
                .find(|(upper, _)| *upper == field.trim())
                .map_or(field, |(_, canonical)| canonical)
        })
        .collect::<Vec<_>>()
        .join(";");
    if body.is_empty() {
        header
    } else {
        format!("{header}\n{body}")
    }
}

fn cells(record: &StringRecord) -> Vec<Option<String>> {
    record
        .iter()
        .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
        .collect()
}

fn parse_int(cell: &Option<String>) -> Result<Option<i64>, ()> {
    match cell {
        None => Ok(None),
        Some(value) => value.parse::<i64>().map(Some).map_err(|_| ()),
    }
}

fn integer_frame(
    headers: &[String],
    keep: &[usize],
    rows: Vec<Vec<Option<String>>>,
    resource: &str,
) -> polars::prelude::PolarsResult<DataFrame> {
    let mut values: Vec<Vec<Option<i64>>> = vec![Vec::with_capacity(rows.len()); keep.len()];
    for row in rows {
        let parsed: Result<Vec<Option<i64>>, ()> =
            keep.iter().map(|&position| parse_int(&row[position])).collect();
        match parsed {
            Ok(parsed) => {
                for (column, value) in values.iter_mut().zip(parsed) {
                    column.push(value);
                }
            }
            Err(()) => warn!("Resource \"{resource}\": skipping record with non-integer values {row:?}"),
        }
    }
    let columns = keep
        .iter()
        .zip(values)
        .map(|(&position, column)| Column::new(headers[position].as_str().into(), column))
        .collect();
    DataFrame::new(columns)
}

fn text_frame(
    headers: &[String],
    keep: &[usize],
    rows: Vec<Vec<Option<String>>>,
    key_column: Option<usize>,
    resource: &str,
) -> polars::prelude::PolarsResult<DataFrame> {
    let key_position = key_column.and_then(|index| keep.get(index).copied());
    let mut keys: Vec<i64> = Vec::with_capacity(rows.len());
    let mut retained = Vec::with_capacity(rows.len());
    for row in rows {
        match key_position {
            Some(position) => match parse_int(&row[position]) {
                Ok(Some(key)) => {
                    keys.push(key);
                    retained.push(row);
                }
                _ => warn!("Resource \"{resource}\": skipping record without integer key {row:?}"),
            },
            None => retained.push(row),
        }
    }

    let columns = keep
        .iter()
        .map(|&position| {
            let name = headers[position].as_str().into();
            if Some(position) == key_position {
                Column::new(name, keys.clone())
            } else {
                Column::new(
                    name,
                    retained
                        .iter()
                        .map(|row| row[position].clone())
                        .collect::<Vec<_>>(),
                )
            }
        })
        .collect();
    DataFrame::new(columns)
}
