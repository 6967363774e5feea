//! Defines the phenological observation station and its tabular representation.

use crate::types::reference::{Record, ReferenceTable};
use polars::prelude::{Column, DataFrame, PolarsResult};

/// A phenological observation station as listed in the station description files.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Station identifier (`Stations_id`).
    pub id: i64,
    /// Station name (`Stationsname`).
    pub name: String,
    /// Latitude in decimal degrees (`geograph.Breite`).
    pub latitude: f64,
    /// Longitude in decimal degrees (`geograph.Laenge`).
    pub longitude: f64,
    /// Elevation above sea level in meters (`Stationshoehe`).
    pub altitude: Option<i64>,
    /// Natural region group code and name (`Naturraumgruppe_Code`, `Naturraumgruppe`).
    pub area_group_code: Option<i64>,
    pub area_group: String,
    /// Natural region code and name (`Naturraum_Code`, `Naturraum`).
    pub area_code: Option<i64>,
    pub area: String,
    /// Raw decommission date (`Datum Stationsaufloesung`), `None` for active stations.
    pub decommissioned: Option<String>,
    /// Federal state (`Bundesland`).
    pub state: String,
}

impl Station {
    /// Returns `true` unless the station has a decommission date.
    pub fn is_active(&self) -> bool {
        self.decommissioned.is_none()
    }

    /// Reference attributes searched by the station text criterion.
    pub(crate) fn search_fields(&self) -> [&str; 4] {
        [&self.name, &self.area_group, &self.area, &self.state]
    }
}

impl Record for Station {
    fn id(&self) -> i64 {
        self.id
    }
}

impl ReferenceTable<Station> {
    pub fn to_frame(&self) -> PolarsResult<DataFrame> {
        let stations: Vec<&Station> = self.iter().collect();
        stations_frame(&stations, None)
    }
}

/// Builds the station listing frame. When `distances` is given, a `Distanz`
/// column is inserted after the station name.
pub(crate) fn stations_frame(
    stations: &[&Station],
    distances: Option<&[f64]>,
) -> PolarsResult<DataFrame> {
    let mut columns = vec![
        Column::new("Stations_id".into(), stations.iter().map(|s| s.id).collect::<Vec<_>>()),
        Column::new("Stationsname".into(), stations.iter().map(|s| s.name.as_str()).collect::<Vec<_>>()),
    ];
    if let Some(distances) = distances {
        columns.push(Column::new("Distanz".into(), distances.to_vec()));
    }
    columns.extend([
        Column::new("geograph.Breite".into(), stations.iter().map(|s| s.latitude).collect::<Vec<_>>()),
        Column::new("geograph.Laenge".into(), stations.iter().map(|s| s.longitude).collect::<Vec<_>>()),
        Column::new("Stationshoehe".into(), stations.iter().map(|s| s.altitude).collect::<Vec<_>>()),
        Column::new("Naturraumgruppe_Code".into(), stations.iter().map(|s| s.area_group_code).collect::<Vec<_>>()),
        Column::new("Naturraumgruppe".into(), stations.iter().map(|s| s.area_group.as_str()).collect::<Vec<_>>()),
        Column::new("Naturraum_Code".into(), stations.iter().map(|s| s.area_code).collect::<Vec<_>>()),
        Column::new("Naturraum".into(), stations.iter().map(|s| s.area.as_str()).collect::<Vec<_>>()),
        Column::new(
            "Datum Stationsaufloesung".into(),
            stations.iter().map(|s| s.decommissioned.clone()).collect::<Vec<_>>(),
        ),
        Column::new("Bundesland".into(), stations.iter().map(|s| s.state.as_str()).collect::<Vec<_>>()),
    ]);
    DataFrame::new(columns)
}
