//! Strongly typed query options for observation retrieval.

use crate::types::dataset::Partition;
use bon::Builder;

/// Selection criteria applied while acquiring and filtering observations.
///
/// Every field except `partition` is optional. An unset field (or one set to an
/// empty list) imposes no constraint. Values within a field are OR-combined,
/// set fields are AND-combined with each other.
///
/// # Examples
///
/// ```
/// use phenodata::{FilterCriteria, Partition};
///
/// let criteria = FilterCriteria::builder()
///     .partition(Partition::Recent)
///     .files(vec!["Hasel".to_string()])
///     .station_id(vec![19475])
///     .build();
/// assert!(!criteria.has_text_criteria());
/// ```
#[derive(Debug, Clone, Builder, PartialEq)]
pub struct FilterCriteria {
    /// Upstream partition to scan.
    pub partition: Partition,
    /// Filename fragments, any match retains a file.
    pub files: Option<Vec<String>>,

    /// Reference years.
    pub year: Option<Vec<i64>>,
    pub station_id: Option<Vec<i64>>,
    pub species_id: Option<Vec<i64>>,
    pub phase_id: Option<Vec<i64>>,
    pub quality_level: Option<Vec<i64>>,
    pub quality_byte: Option<Vec<i64>>,

    /// Matched against station name, natural region group, natural region and state.
    pub station: Option<Vec<String>>,
    /// Matched against German, English and Latin species names.
    pub species: Option<Vec<String>>,
    /// Matched against German and English phase names.
    pub phase: Option<Vec<String>>,
    /// Matched against quality level and quality byte descriptions.
    pub quality: Option<Vec<String>>,
}

impl FilterCriteria {
    /// Creates criteria which only select a partition.
    pub fn for_partition(partition: Partition) -> Self {
        Self::builder().partition(partition).build()
    }

    /// Returns whether any humanized text criterion is set, which requires
    /// joining reference data before filtering.
    pub fn has_text_criteria(&self) -> bool {
        self.text_groups().iter().any(|(_, terms)| terms.is_some())
    }

    pub(crate) fn id_criteria(&self) -> [(IdField, Option<&[i64]>); 6] {
        [
            (IdField::Year, active(&self.year)),
            (IdField::QualityLevel, active(&self.quality_level)),
            (IdField::QualityByte, active(&self.quality_byte)),
            (IdField::StationId, active(&self.station_id)),
            (IdField::SpeciesId, active(&self.species_id)),
            (IdField::PhaseId, active(&self.phase_id)),
        ]
    }

    pub(crate) fn text_groups(&self) -> [(TextGroup, Option<&[String]>); 4] {
        [
            (TextGroup::Station, active(&self.station)),
            (TextGroup::Species, active(&self.species)),
            (TextGroup::Phase, active(&self.phase)),
            (TextGroup::Quality, active(&self.quality)),
        ]
    }

    pub(crate) fn file_fragments(&self) -> Option<&[String]> {
        active(&self.files)
    }
}

fn active<T>(values: &Option<Vec<T>>) -> Option<&[T]> {
    values.as_deref().filter(|values| !values.is_empty())
}

/// Observation columns addressable by numeric criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdField {
    Year,
    QualityLevel,
    QualityByte,
    StationId,
    SpeciesId,
    PhaseId,
}

/// Groups of reference attributes addressable by text criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TextGroup {
    Station,
    Species,
    Phase,
    Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_lists_are_unset() {
        let criteria = FilterCriteria::builder()
            .partition(Partition::Recent)
            .station_id(vec![])
            .species(vec![])
            .build();
        assert!(criteria.id_criteria().iter().all(|(_, v)| v.is_none()));
        assert!(!criteria.has_text_criteria());
        assert!(criteria.file_fragments().is_none());
    }

    #[test]
    fn test_text_criteria_detection() {
        let criteria = FilterCriteria::builder()
            .partition(Partition::Historical)
            .phase(vec!["flowering".to_string()])
            .build();
        assert!(criteria.has_text_criteria());
        let (group, terms) = criteria.text_groups()[2];
        assert_eq!(group, TextGroup::Phase);
        assert_eq!(terms.unwrap(), ["flowering".to_string()]);
    }
}
