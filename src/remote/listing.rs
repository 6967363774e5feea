use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One file or directory from a server directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    pub size: u64,
    pub modified_at: NaiveDateTime,
    /// Absolute server path of the entry, `parent/name`.
    pub full_path: String,
    pub is_directory: bool,
}

/// Parses one line of a Unix style `LIST` response.
///
/// Fields 0-3 (permissions, links, owner, group) are ignored. Field 4 is the
/// size, fields 5-7 the modification time and the remainder the name. Recent
/// files carry `Mon D HH:MM` without a year; those get `processing_year`.
/// Older files carry `Mon D YYYY` and are stamped at midnight.
///
/// Returns `None` for lines that do not follow this layout, such as the
/// `total N` header some servers send.
pub fn parse_listing_line(line: &str, parent: &str, processing_year: i32) -> Option<DirectoryEntry> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 9 {
        return None;
    }
    let size = fields[4].parse::<u64>().ok()?;
    let modified_at = parse_listing_time(fields[5], fields[6], fields[7], processing_year)?;
    let name = fields[8..].join(" ");
    let full_path = format!("{}/{}", parent.trim_end_matches('/'), name);
    Some(DirectoryEntry {
        name,
        size,
        modified_at,
        full_path,
        is_directory: fields[0].starts_with('d'),
    })
}

fn parse_listing_time(
    month: &str,
    day: &str,
    time_or_year: &str,
    processing_year: i32,
) -> Option<NaiveDateTime> {
    if time_or_year.contains(':') {
        let stamp = format!("{processing_year} {month} {day} {time_or_year}");
        NaiveDateTime::parse_from_str(&stamp, "%Y %b %d %H:%M").ok()
    } else {
        let stamp = format!("{time_or_year} {month} {day}");
        NaiveDate::parse_from_str(&stamp, "%Y %b %d")
            .ok()?
            .and_hms_opt(0, 0, 0)
    }
}
