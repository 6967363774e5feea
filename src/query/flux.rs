//! The flux compensator: filtering of acquired observations.
//!
//! Numeric criteria are checked directly on the observation rows. Text
//! criteria need descriptive reference attributes, so the rows are joined
//! against the reference tables first, matched, and projected back to plain
//! observations. Joining never adds columns to the result.

use crate::query::megaframe::{join, JoinColumns, Joined, References};
use crate::types::criteria::{FilterCriteria, IdField, TextGroup};
use crate::types::observation::{Observation, ObservationTable};
use crate::utils::term_matcher;
use log::{debug, info};
use regex::Regex;
use std::collections::HashSet;

impl IdField {
    fn value(&self, observation: &Observation) -> Option<i64> {
        match self {
            IdField::Year => Some(observation.reference_year),
            IdField::QualityLevel => observation.quality_level,
            IdField::QualityByte => observation.quality_byte,
            IdField::StationId => Some(observation.station_id),
            IdField::SpeciesId => Some(observation.species_id),
            IdField::PhaseId => Some(observation.phase_id),
        }
    }

    fn present_in(&self, table: &ObservationTable) -> bool {
        match self {
            IdField::QualityLevel => table.has_quality_level,
            IdField::QualityByte => table.has_quality_byte,
            _ => true,
        }
    }
}

impl TextGroup {
    fn matches(&self, matcher: &Regex, row: &Joined<Observation>) -> bool {
        match self {
            TextGroup::Station => row
                .station
                .search_fields()
                .iter()
                .any(|field| matcher.is_match(field)),
            TextGroup::Species => [&row.species.name_de, &row.species.name_en, &row.species.name_la]
                .iter()
                .any(|field| matcher.is_match(field)),
            TextGroup::Phase => [&row.phase.name_de, &row.phase.name_en]
                .iter()
                .any(|field| matcher.is_match(field)),
            TextGroup::Quality => {
                row.quality_level
                    .is_some_and(|level| matcher.is_match(&level.description))
                    || row
                        .quality_byte
                        .is_some_and(|byte| matcher.is_match(&byte.description))
            }
        }
    }
}

/// Keeps rows whose identifier columns hold one of the requested values.
///
/// Criteria addressing a quality column the table does not carry are ignored.
pub fn filter_by_ids(table: ObservationTable, criteria: &FilterCriteria) -> ObservationTable {
    let active: Vec<(IdField, HashSet<i64>)> = criteria
        .id_criteria()
        .into_iter()
        .filter_map(|(field, values)| {
            let values = values?;
            field
                .present_in(&table)
                .then(|| (field, values.iter().copied().collect()))
        })
        .collect();
    if active.is_empty() {
        return table;
    }

    let rows = table
        .rows
        .iter()
        .filter(|row| {
            active.iter().all(|(field, values)| {
                field.value(row).is_some_and(|value| values.contains(&value))
            })
        })
        .cloned()
        .collect();
    let filtered = table.with_rows(rows);
    debug!("Identifier criteria kept {} of {} rows", filtered.len(), table.len());
    filtered
}

/// Keeps rows whose reference attributes match the text criteria.
///
/// Within a group any attribute may contain any term, ignoring case. All
/// given groups must match. Rows lacking a reference record are dropped.
pub fn filter_by_text(
    table: ObservationTable,
    criteria: &FilterCriteria,
    references: &References,
) -> Result<ObservationTable, regex::Error> {
    let groups: Vec<(TextGroup, Regex)> = criteria
        .text_groups()
        .into_iter()
        .filter_map(|(group, terms)| terms.map(|terms| (group, terms)))
        .map(|(group, terms)| Ok((group, term_matcher(terms)?)))
        .collect::<Result<_, regex::Error>>()?;
    if groups.is_empty() {
        return Ok(table);
    }

    let columns = JoinColumns {
        quality_level: table.has_quality_level,
        quality_byte: table.has_quality_byte,
    };
    let rows: Vec<Observation> = join(&table.rows, references, columns)
        .into_iter()
        .filter(|row| groups.iter().all(|(group, matcher)| group.matches(matcher, row)))
        .map(|row| row.row.clone())
        .collect();
    let filtered = table.with_rows(rows);
    debug!("Text criteria kept {} of {} rows", filtered.len(), table.len());
    Ok(filtered)
}

/// Applies identifier criteria, then text criteria when any are set.
///
/// `references` is only consulted for text criteria.
pub fn flux(
    table: ObservationTable,
    criteria: &FilterCriteria,
    references: &References,
) -> Result<ObservationTable, regex::Error> {
    info!("Entering flux compensator: Filter and transform data");
    let table = filter_by_ids(table, criteria);
    if !criteria.has_text_criteria() {
        return Ok(table);
    }
    filter_by_text(table, criteria, references)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::megaframe::tests::{observation, references};
    use crate::types::dataset::Partition;

    fn table() -> ObservationTable {
        let mut later = observation(662, 113, 60);
        later.reference_year = 2022;
        later.quality_level = Some(10);
        ObservationTable {
            rows: vec![
                observation(19475, 113, 42),
                observation(662, 113, 46),
                observation(7521, 113, 50),
                later,
            ],
            has_quality_level: true,
            has_quality_byte: true,
        }
    }

    fn stations(table: &ObservationTable) -> Vec<i64> {
        table.rows.iter().map(|r| r.station_id).collect()
    }

    #[test]
    fn test_station_id_filter() {
        let criteria = FilterCriteria::builder()
            .partition(Partition::Recent)
            .station_id(vec![662, 7521])
            .build();
        let filtered = filter_by_ids(table(), &criteria);
        assert_eq!(stations(&filtered), [662, 7521, 662]);
    }

    #[test]
    fn test_id_fields_combine_with_and() {
        let criteria = FilterCriteria::builder()
            .partition(Partition::Recent)
            .station_id(vec![662])
            .year(vec![2022])
            .quality_level(vec![10])
            .build();
        let filtered = filter_by_ids(table(), &criteria);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows[0].reference_year, 2022);
    }

    #[test]
    fn test_absent_criteria_keep_everything() {
        let criteria = FilterCriteria::builder()
            .partition(Partition::Recent)
            .station_id(vec![])
            .build();
        assert_eq!(filter_by_ids(table(), &criteria), table());
    }

    #[test]
    fn test_quality_criteria_ignored_without_quality_column() {
        let mut source = table();
        source.has_quality_byte = false;
        let criteria = FilterCriteria::builder()
            .partition(Partition::Recent)
            .quality_byte(vec![5])
            .build();
        assert_eq!(filter_by_ids(source.clone(), &criteria), source);
    }

    #[test]
    fn test_station_text_matches_name_region_or_state() {
        let references = references();
        let criteria = FilterCriteria::builder()
            .partition(Partition::Recent)
            .station(vec!["BERLIN".to_string(), "brandenburg".to_string()])
            .build();
        let filtered = filter_by_text(table(), &criteria, &references).unwrap();
        assert_eq!(stations(&filtered), [19475, 7521]);

        let criteria = FilterCriteria::builder()
            .partition(Partition::Recent)
            .station(vec!["luch".to_string()])
            .build();
        let filtered = filter_by_text(table(), &criteria, &references).unwrap();
        assert_eq!(filtered.len(), 4);
    }

    #[test]
    fn test_text_groups_combine_with_and() {
        let references = references();
        let criteria = FilterCriteria::builder()
            .partition(Partition::Recent)
            .species(vec!["corylus".to_string()])
            .quality(vec!["routinemäßige".to_string()])
            .build();
        let filtered = filter_by_text(table(), &criteria, &references).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.rows[0].quality_level, Some(10));

        let criteria = FilterCriteria::builder()
            .partition(Partition::Recent)
            .species(vec!["hazel".to_string()])
            .phase(vec!["fruit".to_string()])
            .build();
        assert!(filter_by_text(table(), &criteria, &references)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_flux_combines_both_passes() {
        let criteria = FilterCriteria::builder()
            .partition(Partition::Recent)
            .station_id(vec![19475])
            .build();
        let filtered = flux(table(), &criteria, &References::default()).unwrap();
        assert_eq!(filtered.len(), 1);

        let criteria = FilterCriteria::builder()
            .partition(Partition::Recent)
            .station_id(vec![19475, 662])
            .station(vec!["sachsen".to_string()])
            .build();
        let filtered = flux(table(), &criteria, &references()).unwrap();
        assert_eq!(stations(&filtered), [662, 662]);
    }
}
