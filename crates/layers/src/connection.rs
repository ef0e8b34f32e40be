use serde::{Deserialize, Serialize};

use crate::incident::Incident;

/// Offset between a source incident and the incident it links to.
pub const CONNECTION_STRIDE: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: String,
    pub from: Incident,
    pub to: Incident,
    pub intensity: f64,
}

impl Connection {
    /// True when either endpoint is the incident `id`.
    pub fn touches(&self, id: &str) -> bool {
        self.from.id == id || self.to.id == id
    }
}

/// Links each incident to the one `CONNECTION_STRIDE` positions ahead
/// (wrapping), dropping self-pairs.
///
/// `intensity = (severity_from + severity_to) / 6`.
pub fn derive_connections(incidents: &[Incident]) -> Vec<Connection> {
    let n = incidents.len();
    incidents
        .iter()
        .enumerate()
        .filter_map(|(i, from)| {
            let to = &incidents[(i + CONNECTION_STRIDE) % n];
            if from.id == to.id {
                return None;
            }
            Some(Connection {
                id: format!("{}-{}", from.id, to.id),
                from: from.clone(),
                to: to.clone(),
                intensity: (f64::from(from.severity) + f64::from(to.severity)) / 6.0,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::derive_connections;
    use crate::incident::Incident;
    use pretty_assertions::assert_eq;

    fn incidents(n: usize) -> Vec<Incident> {
        (0..n)
            .map(|i| {
                let id = char::from(b'a' + i as u8).to_string();
                Incident::new(id, i as f64, i as f64, (i % 5 + 1) as u8, "")
            })
            .collect()
    }

    fn pairs(list: &[Incident]) -> Vec<(String, String)> {
        derive_connections(list)
            .into_iter()
            .map(|c| (c.from.id, c.to.id))
            .collect()
    }

    #[test]
    fn four_incidents_form_a_stride_three_ring() {
        let got = pairs(&incidents(4));
        let want: Vec<(String, String)> = [("a", "d"), ("b", "a"), ("c", "b"), ("d", "c")]
            .into_iter()
            .map(|(f, t)| (f.to_string(), t.to_string()))
            .collect();
        assert_eq!(got, want);
    }

    #[test]
    fn intensity_averages_severity_over_six() {
        let list = vec![
            Incident::new("a", 0.0, 0.0, 2, ""),
            Incident::new("b", 0.0, 0.0, 5, ""),
            Incident::new("c", 0.0, 0.0, 1, ""),
            Incident::new("d", 0.0, 0.0, 3, ""),
        ];
        let conns = derive_connections(&list);
        assert_eq!(conns[0].id, "a-d");
        assert!((conns[0].intensity - 5.0 / 6.0).abs() < 1e-12);
        for c in &conns {
            assert!(c.intensity >= 1.0 / 3.0 && c.intensity <= 5.0 / 3.0);
        }
    }

    #[test]
    fn small_inputs_drop_self_pairs() {
        assert!(derive_connections(&[]).is_empty());
        assert!(derive_connections(&incidents(1)).is_empty());
        assert!(derive_connections(&incidents(3)).is_empty());
        assert_eq!(
            pairs(&incidents(2)),
            vec![
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "a".to_string())
            ]
        );
    }

    #[test]
    fn never_links_an_incident_to_itself() {
        for n in 0..12 {
            let conns = derive_connections(&incidents(n));
            assert!(conns.iter().all(|c| c.from.id != c.to.id));
            if n > 3 {
                assert_eq!(conns.len(), n);
            }
        }
    }

    #[test]
    fn touches_matches_either_endpoint() {
        let conns = derive_connections(&incidents(5));
        assert!(conns[0].touches("a"));
        assert!(conns[0].touches("d"));
        assert!(!conns[0].touches("b"));
    }
}
