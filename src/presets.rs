//! Named groups of species shipped with the crate.

use crate::error::PhenodataError;
use std::collections::BTreeMap;

const PRESETS_FILE: &str = "presets.json";
const PRESETS: &str = include_str!("presets.json");

type Presets = BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>;

fn parse_presets(source: &str) -> Result<Presets, PhenodataError> {
    serde_json::from_str(source).map_err(|e| PhenodataError::PresetParse(PRESETS_FILE.to_string(), e))
}

fn split_items(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Resolves the preset `name` in `section`/`option` to its list of items.
///
/// # Errors
///
/// [`PhenodataError::PresetNotFound`] when the section, option or name does not exist.
///
/// # Examples
///
/// ```
/// let species = phenodata::load_preset("species", "groups", "mellifera-de-primary").unwrap();
/// assert_eq!(species[0], "Hasel");
/// ```
pub fn load_preset(section: &str, option: &str, name: &str) -> Result<Vec<String>, PhenodataError> {
    let presets = parse_presets(PRESETS)?;
    presets
        .get(section)
        .and_then(|options| options.get(option))
        .and_then(|names| names.get(name))
        .map(|value| split_items(value))
        .ok_or_else(|| PhenodataError::PresetNotFound {
            name: name.to_string(),
            source_file: PRESETS_FILE.to_string(),
        })
}

/// Names of all species groups.
pub fn species_groups() -> Result<Vec<String>, PhenodataError> {
    let presets = parse_presets(PRESETS)?;
    Ok(presets
        .get("species")
        .and_then(|options| options.get("groups"))
        .map(|groups| groups.keys().cloned().collect())
        .unwrap_or_default())
}
