//! Read-only reference tables describing the identifiers used in observations.

use log::warn;
use polars::prelude::{Column, DataFrame, PolarsResult};
use std::collections::HashMap;

/// A record addressable by its integer identifier.
pub trait Record {
    fn id(&self) -> i64;
}

/// Identifier → record mapping which keeps the upstream row order.
///
/// Identifiers are unique, later duplicates are discarded with a warning.
#[derive(Debug, Clone)]
pub struct ReferenceTable<T> {
    records: Vec<T>,
    index: HashMap<i64, usize>,
}

impl<T: Record> ReferenceTable<T> {
    pub fn get(&self, id: i64) -> Option<&T> {
        self.index.get(&id).map(|&position| &self.records[position])
    }

    pub fn contains(&self, id: i64) -> bool {
        self.index.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T: Record> Default for ReferenceTable<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Record> FromIterator<T> for ReferenceTable<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = ReferenceTable::default();
        for record in iter {
            let id = record.id();
            if table.index.contains_key(&id) {
                warn!("Duplicate reference identifier {}, keeping first occurrence", id);
                continue;
            }
            table.index.insert(id, table.records.len());
            table.records.push(record);
        }
        table
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    pub id: i64,
    pub name_de: String,
    pub name_en: String,
    pub name_la: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Phase {
    pub id: i64,
    pub name_de: String,
    pub name_en: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityLevel {
    pub id: i64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QualityByte {
    pub id: i64,
    pub description: String,
}

impl Record for Species {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Record for Phase {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Record for QualityLevel {
    fn id(&self) -> i64 {
        self.id
    }
}

impl Record for QualityByte {
    fn id(&self) -> i64 {
        self.id
    }
}

impl ReferenceTable<Species> {
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Column::new("Objekt_ID".into(), self.iter().map(|s| s.id).collect::<Vec<_>>()),
            Column::new("Objekt".into(), self.iter().map(|s| s.name_de.as_str()).collect::<Vec<_>>()),
            Column::new("Objekt_englisch".into(), self.iter().map(|s| s.name_en.as_str()).collect::<Vec<_>>()),
            Column::new("Objekt_latein".into(), self.iter().map(|s| s.name_la.as_str()).collect::<Vec<_>>()),
        ])
    }
}

impl ReferenceTable<Phase> {
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Column::new("Phase_ID".into(), self.iter().map(|p| p.id).collect::<Vec<_>>()),
            Column::new("Phase".into(), self.iter().map(|p| p.name_de.as_str()).collect::<Vec<_>>()),
            Column::new("Phase_englisch".into(), self.iter().map(|p| p.name_en.as_str()).collect::<Vec<_>>()),
        ])
    }
}

impl ReferenceTable<QualityLevel> {
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Column::new("Qualitaetsniveau".into(), self.iter().map(|q| q.id).collect::<Vec<_>>()),
            Column::new("Beschreibung".into(), self.iter().map(|q| q.description.as_str()).collect::<Vec<_>>()),
        ])
    }
}

impl ReferenceTable<QualityByte> {
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Column::new("Qualitaetsbyte".into(), self.iter().map(|q| q.id).collect::<Vec<_>>()),
            Column::new("Beschreibung".into(), self.iter().map(|q| q.description.as_str()).collect::<Vec<_>>()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase(id: i64, name_en: &str) -> Phase {
        Phase {
            id,
            name_de: String::new(),
            name_en: name_en.to_string(),
        }
    }

    #[test]
    fn test_lookup_keeps_order_and_first_duplicate() {
        let table: ReferenceTable<Phase> = vec![
            phase(5, "beginning of flowering"),
            phase(1, "beginning of turning green"),
            phase(5, "duplicate"),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get(5).unwrap().name_en, "beginning of flowering");
        assert!(table.get(7).is_none());
        let ids: Vec<i64> = table.iter().map(|p| p.id).collect();
        assert_eq!(ids, [5, 1]);
    }

    #[test]
    fn test_species_frame() {
        let table: ReferenceTable<Species> = vec![Species {
            id: 113,
            name_de: "Hasel".to_string(),
            name_en: "common hazel".to_string(),
            name_la: "Corylus avellana".to_string(),
        }]
        .into_iter()
        .collect();
        let frame = table.to_frame().unwrap();
        assert_eq!(frame.shape(), (1, 4));
    }
}
