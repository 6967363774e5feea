//! Renders joined rows as human readable labels.

use crate::error::PhenodataError;
use crate::query::forecast::ForecastRow;
use crate::query::megaframe::{JoinColumns, Joined};
use crate::types::observation::Observation;
use crate::types::reference::{Phase, QualityLevel, Species};
use crate::types::station::Station;
use bon::Builder;
use polars::prelude::{Column, DataFrame, PolarsResult};
use std::fmt;
use std::str::FromStr;

/// Output language for species, phase and quality level labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    English,
    German,
    /// Latin species names. Phases and quality levels are labelled in English.
    Latin,
}

impl Language {
    fn species_name<'a>(&self, species: &'a Species) -> &'a str {
        match self {
            Language::English => &species.name_en,
            Language::German => &species.name_de,
            Language::Latin => &species.name_la,
        }
    }

    fn phase_name<'a>(&self, phase: &'a Phase) -> &'a str {
        match self {
            Language::German => &phase.name_de,
            Language::English | Language::Latin => &phase.name_en,
        }
    }

    /// Short descriptions of the three quality levels in use.
    fn quality_level_text(&self, id: i64) -> Option<&'static str> {
        match (self, id) {
            (Language::German, 1) => Some("Vorabprüfung beim Laden"),
            (Language::German, 7) => Some("ROUTKLI geprüft"),
            (Language::German, 10) => Some("ROUTKLI geprüft und korrigiert"),
            (_, 1) => Some("Load time checks"),
            (_, 7) => Some("ROUTKLI validated"),
            (_, 10) => Some("ROUTKLI validated and corrected"),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Language::English => "english",
            Language::German => "german",
            Language::Latin => "latin",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Language {
    type Err = PhenodataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" => Ok(Language::English),
            "german" => Ok(Language::German),
            "latin" => Ok(Language::Latin),
            _ => Err(PhenodataError::UnknownLanguage(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Builder, PartialEq, Eq)]
pub struct HumanizeOptions {
    #[builder(default)]
    pub language: Language,
    /// Include natural region group and natural region in station labels.
    #[builder(default)]
    pub long_station: bool,
    /// Append ` [id]` to every label.
    #[builder(default)]
    pub show_ids: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Humanizer {
    options: HumanizeOptions,
}

impl Humanizer {
    pub fn new(options: HumanizeOptions) -> Self {
        Self { options }
    }

    fn with_id(&self, label: &str, id: i64) -> String {
        if self.options.show_ids {
            format!("{label} [{id}]")
        } else {
            label.to_string()
        }
    }

    fn station_label(&self, station: &Station) -> String {
        let label = if self.options.long_station {
            [
                station.name.as_str(),
                station.area_group.as_str(),
                station.area.as_str(),
                station.state.as_str(),
            ]
            .join(", ")
        } else {
            [station.name.as_str(), station.state.as_str()].join(", ")
        };
        self.with_id(&label, station.id)
    }

    fn species_label(&self, species: &Species) -> String {
        self.with_id(self.options.language.species_name(species), species.id)
    }

    fn phase_label(&self, phase: &Phase) -> String {
        self.with_id(self.options.language.phase_name(phase), phase.id)
    }

    fn quality_level_label(&self, level: &QualityLevel) -> String {
        let text = self
            .options
            .language
            .quality_level_text(level.id)
            .unwrap_or(level.description.as_str());
        self.with_id(text, level.id)
    }

    fn label_columns<R>(&self, rows: &[Joined<R>]) -> [Column; 3] {
        [
            Column::new(
                "Spezies".into(),
                rows.iter().map(|r| self.species_label(r.species)).collect::<Vec<_>>(),
            ),
            Column::new(
                "Phase".into(),
                rows.iter().map(|r| self.phase_label(r.phase)).collect::<Vec<_>>(),
            ),
            Column::new(
                "Station".into(),
                rows.iter().map(|r| self.station_label(r.station)).collect::<Vec<_>>(),
            ),
        ]
    }

    /// Columns: `Jahr`, `Datum`, `Tag`, `Spezies`, `Phase`, `Station`, then
    /// `QS-Level` and `QS-Byte` for the quality joins that were performed.
    pub fn observations(
        &self,
        rows: &[Joined<Observation>],
        columns: JoinColumns,
    ) -> PolarsResult<DataFrame> {
        let mut frame = vec![
            Column::new("Jahr".into(), rows.iter().map(|r| r.row.reference_year).collect::<Vec<_>>()),
            Column::new(
                "Datum".into(),
                rows.iter()
                    .map(|r| r.row.date.map(|d| d.format("%Y-%m-%d").to_string()))
                    .collect::<Vec<_>>(),
            ),
            Column::new("Tag".into(), rows.iter().map(|r| r.row.day_of_year).collect::<Vec<_>>()),
        ];
        frame.extend(self.label_columns(rows));
        if columns.quality_level {
            frame.push(Column::new(
                "QS-Level".into(),
                rows.iter()
                    .map(|r| r.quality_level.map(|level| self.quality_level_label(level)))
                    .collect::<Vec<_>>(),
            ));
        }
        if columns.quality_byte {
            frame.push(Column::new(
                "QS-Byte".into(),
                rows.iter()
                    .map(|r| r.quality_byte.map(|byte| self.with_id(&byte.description, byte.id)))
                    .collect::<Vec<_>>(),
            ));
        }
        DataFrame::new(frame)
    }

    /// Columns: `Jahr` (the target year), `Datum`, `Tag`, `Spezies`, `Phase`, `Station`.
    pub fn forecast(&self, rows: &[Joined<ForecastRow>], target_year: i32) -> PolarsResult<DataFrame> {
        let mut frame = vec![
            Column::new("Jahr".into(), vec![target_year as i64; rows.len()]),
            Column::new(
                "Datum".into(),
                rows.iter()
                    .map(|r| r.row.date.map(|d| d.format("%Y-%m-%d").to_string()))
                    .collect::<Vec<_>>(),
            ),
            Column::new("Tag".into(), rows.iter().map(|r| r.row.day_of_year).collect::<Vec<_>>()),
        ];
        frame.extend(self.label_columns(rows));
        DataFrame::new(frame)
    }
}
