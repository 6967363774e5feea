use crate::types::station::{stations_frame, Station};
use haversine::{distance, Location as HaversineLocation, Units};
use ordered_float::OrderedFloat;
use polars::prelude::{DataFrame, PolarsResult};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Number of stations returned by a nearest station query unless told otherwise.
pub const DEFAULT_LIMIT: usize = 10;

/// Heap entry ranked by distance alone, so the farthest kept station is on top.
struct StationCandidate<'a> {
    distance_m: OrderedFloat<f64>,
    station: &'a Station,
}
impl PartialEq for StationCandidate<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.distance_m == other.distance_m
    }
}
impl Eq for StationCandidate<'_> {}
impl PartialOrd for StationCandidate<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for StationCandidate<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance_m.cmp(&other.distance_m)
    }
}

/// Great-circle distance in meters on a sphere with a radius of 6,371 km.
pub fn distance_meters(latitude: f64, longitude: f64, station: &Station) -> f64 {
    let station_loc = HaversineLocation {
        latitude: station.latitude,
        longitude: station.longitude,
    };
    distance(
        HaversineLocation {
            latitude,
            longitude,
        },
        station_loc,
        Units::Kilometers,
    ) * 1000.0
}

/// A station together with its distance to the query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyStation<'a> {
    pub station: &'a Station,
    /// Meters.
    pub distance: f64,
}

/// Finds up to `limit` stations closest to the given point, nearest first.
pub fn nearest_stations<'a>(
    stations: impl IntoIterator<Item = &'a Station>,
    latitude: f64,
    longitude: f64,
    limit: usize,
) -> Vec<NearbyStation<'a>> {
    if limit == 0 {
        return vec![];
    }
    let mut heap: BinaryHeap<StationCandidate<'_>> = BinaryHeap::with_capacity(limit + 1);
    for station in stations {
        heap.push(StationCandidate {
            distance_m: OrderedFloat(distance_meters(latitude, longitude, station)),
            station,
        });
        // Keep the heap bounded by evicting the farthest candidate
        if heap.len() > limit {
            heap.pop();
        }
    }

    heap.into_sorted_vec()
        .into_iter()
        .map(|c| NearbyStation {
            station: c.station,
            distance: c.distance_m.into_inner(),
        })
        .collect()
}

/// Station listing frame with a `Distanz` column after the station name.
pub fn nearest_frame(nearby: &[NearbyStation<'_>]) -> PolarsResult<DataFrame> {
    let stations: Vec<&Station> = nearby.iter().map(|n| n.station).collect();
    let distances: Vec<f64> = nearby.iter().map(|n| n.distance).collect();
    stations_frame(&stations, Some(&distances))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(id: i64, latitude: f64, longitude: f64) -> Station {
        Station {
            id,
            name: format!("Station {id}"),
            latitude,
            longitude,
            altitude: None,
            area_group_code: None,
            area_group: String::new(),
            area_code: None,
            area: String::new(),
            decommissioned: None,
            state: "Brandenburg".to_string(),
        }
    }

    fn stations() -> Vec<Station> {
        vec![
            station(19475, 53.0325, 14.0125),
            station(12365, 52.6319, 13.0869),
            station(662, 52.2915, 10.4464),
            station(7521, 52.4537, 13.3017),
        ]
    }

    #[test]
    fn test_sorted_ascending_and_limited() {
        let stations = stations();
        let nearby = nearest_stations(&stations, 52.52, 13.40, 3);
        let ids: Vec<i64> = nearby.iter().map(|n| n.station.id).collect();
        assert_eq!(ids, [7521, 12365, 19475]);
        assert!(nearby.windows(2).all(|w| w[0].distance < w[1].distance));
    }

    #[test]
    fn test_distance_matches_haversine_formula() {
        let stations = stations();
        let (latitude, longitude) = (52.52_f64, 13.40_f64);
        let nearest = nearest_stations(&stations, latitude, longitude, 1)[0];

        let radius = 6_371_000.0;
        let (phi1, phi2) = (latitude.to_radians(), nearest.station.latitude.to_radians());
        let d_phi = (nearest.station.latitude - latitude).to_radians();
        let d_lambda = (nearest.station.longitude - longitude).to_radians();
        let a = (d_phi / 2.0).sin().powi(2)
            + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
        let expected = radius * 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        assert!((nearest.distance - expected).abs() < 1e-6 * expected);
    }

    #[test]
    fn test_zero_limit() {
        assert!(nearest_stations(&stations(), 52.0, 13.0, 0).is_empty());
    }

    #[test]
    fn test_nearest_frame() {
        let stations = stations();
        let nearby = nearest_stations(&stations, 52.52, 13.40, DEFAULT_LIMIT);
        let frame = nearest_frame(&nearby).unwrap();
        assert_eq!(frame.height(), 4);
        assert_eq!(frame.get_column_names()[2].as_str(), "Distanz");
        let distances = frame.column("Distanz").unwrap().f64().unwrap();
        assert!(distances.get(0).unwrap() < distances.get(3).unwrap());
    }
}
