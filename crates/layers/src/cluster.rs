use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::incident::Incident;

pub const DEFAULT_MIN_SIZE: usize = 3;
pub const DEFAULT_CELL_DEGREES: f64 = 18.0;

/// A group of incidents that fell into the same lat/lng grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub size: usize,
    pub lat: f64,
    pub lng: f64,
    pub label: String,
    pub nodes: Vec<Incident>,
}

/// Grid cell `(row, col)` for a coordinate.
///
/// Cells are not wrap-aware: the antimeridian and the poles are hard edges.
pub fn grid_cell(lat: f64, lng: f64, cell_degrees: f64) -> (i64, i64) {
    (
        ((lat + 90.0) / cell_degrees).floor() as i64,
        ((lng + 180.0) / cell_degrees).floor() as i64,
    )
}

/// Buckets incidents into `cell_degrees` cells and emits one cluster per cell
/// holding at least `min_size` members.
///
/// Output follows the order in which each cell was first seen, and members
/// keep input order. The centroid is the arithmetic mean of member lat/lng.
/// A non-finite or non-positive cell size yields no clusters.
pub fn cluster_by_grid(incidents: &[Incident], min_size: usize, cell_degrees: f64) -> Vec<Cluster> {
    if !cell_degrees.is_finite() || cell_degrees <= 0.0 {
        return Vec::new();
    }

    let mut slot_by_cell: HashMap<(i64, i64), usize> = HashMap::new();
    let mut cells: Vec<Vec<&Incident>> = Vec::new();
    for incident in incidents {
        let key = grid_cell(incident.lat, incident.lng, cell_degrees);
        let slot = *slot_by_cell.entry(key).or_insert_with(|| {
            cells.push(Vec::new());
            cells.len() - 1
        });
        cells[slot].push(incident);
    }

    cells
        .into_iter()
        .filter(|members| !members.is_empty() && members.len() >= min_size)
        .map(|members| {
            let n = members.len() as f64;
            let lat = members.iter().map(|m| m.lat).sum::<f64>() / n;
            let lng = members.iter().map(|m| m.lng).sum::<f64>() / n;
            let id = members
                .iter()
                .map(|m| m.id.as_str())
                .collect::<Vec<_>>()
                .join("-");
            Cluster {
                id,
                size: members.len(),
                lat,
                lng,
                label: members[0].label.clone(),
                nodes: members.into_iter().cloned().collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{cluster_by_grid, grid_cell, DEFAULT_CELL_DEGREES, DEFAULT_MIN_SIZE};
    use crate::incident::Incident;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn sample() -> Vec<Incident> {
        vec![
            Incident::new("a", 10.0, 20.0, 2, "Alpha"),
            Incident::new("b", -5.0, -100.0, 5, "Bravo"),
            Incident::new("c", 45.0, 60.0, 1, "Charlie"),
            Incident::new("d", 10.1, 20.1, 3, "Delta"),
        ]
    }

    #[test]
    fn nearby_incidents_share_a_cell() {
        let clusters = cluster_by_grid(&sample(), 2, 18.0);
        assert_eq!(clusters.len(), 1);
        let c = &clusters[0];
        assert_eq!(c.id, "a-d");
        assert_eq!(c.size, 2);
        assert_eq!(c.label, "Alpha");
        assert!((c.lat - 10.05).abs() < 1e-9);
        assert!((c.lng - 20.05).abs() < 1e-9);
        let ids: Vec<&str> = c.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "d"]);
    }

    #[test]
    fn default_threshold_drops_small_cells() {
        assert!(cluster_by_grid(&sample(), DEFAULT_MIN_SIZE, DEFAULT_CELL_DEGREES).is_empty());
    }

    #[test]
    fn output_follows_first_seen_cell_order() {
        let incidents = vec![
            Incident::new("s1", -55.0, 105.0, 1, "South"),
            Incident::new("n1", 65.0, -105.0, 1, "North"),
            Incident::new("s2", -56.0, 106.0, 1, "South"),
            Incident::new("n2", 66.0, -104.0, 1, "North"),
        ];
        let ids: Vec<String> = cluster_by_grid(&incidents, 2, 10.0)
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["s1-s2".to_string(), "n1-n2".to_string()]);
    }

    #[test]
    fn members_partition_the_input() {
        let incidents: Vec<Incident> = (0..200)
            .map(|i| {
                let lat = ((i * 37) % 170) as f64 - 85.0;
                let lng = ((i * 53) % 359) as f64 - 179.0;
                Incident::new(format!("i{i}"), lat, lng, (i % 5 + 1) as u8, "")
            })
            .collect();
        let clusters = cluster_by_grid(&incidents, 2, 10.0);

        let mut seen = BTreeSet::new();
        for c in &clusters {
            assert!(c.size >= 2);
            assert_eq!(c.size, c.nodes.len());
            for n in &c.nodes {
                assert!(seen.insert(n.id.clone()), "{} clustered twice", n.id);
            }
        }
        let unclustered = incidents.iter().filter(|i| !seen.contains(&i.id)).count();
        assert_eq!(seen.len() + unclustered, incidents.len());
    }

    #[test]
    fn seam_is_not_wrapped() {
        assert_ne!(grid_cell(0.0, 179.9, 18.0), grid_cell(0.0, -179.9, 18.0));
        let incidents = vec![
            Incident::new("e", 0.0, 179.9, 1, ""),
            Incident::new("w", 0.0, -179.9, 1, ""),
        ];
        assert!(cluster_by_grid(&incidents, 2, 18.0).is_empty());
    }

    #[test]
    fn degenerate_cell_size_yields_nothing() {
        assert!(cluster_by_grid(&sample(), 1, 0.0).is_empty());
        assert!(cluster_by_grid(&sample(), 1, -4.0).is_empty());
        assert!(cluster_by_grid(&sample(), 1, f64::NAN).is_empty());
    }
}
