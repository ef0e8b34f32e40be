use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const MIN_SEVERITY: u8 = 1;
pub const MAX_SEVERITY: u8 = 5;

/// A geolocated incident marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub severity: u8,
    #[serde(default)]
    pub label: String,
}

impl Incident {
    pub fn new(
        id: impl Into<String>,
        lat: f64,
        lng: f64,
        severity: u8,
        label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            lat,
            lng,
            severity,
            label: label.into(),
        }
    }

    pub fn validate(&self) -> Result<(), IncidentError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(IncidentError::LatitudeOutOfRange {
                id: self.id.clone(),
                lat: self.lat,
            });
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(IncidentError::LongitudeOutOfRange {
                id: self.id.clone(),
                lng: self.lng,
            });
        }
        if !(MIN_SEVERITY..=MAX_SEVERITY).contains(&self.severity) {
            return Err(IncidentError::SeverityOutOfRange {
                id: self.id.clone(),
                severity: self.severity,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IncidentError {
    DuplicateId(String),
    LatitudeOutOfRange { id: String, lat: f64 },
    LongitudeOutOfRange { id: String, lng: f64 },
    SeverityOutOfRange { id: String, severity: u8 },
}

impl std::fmt::Display for IncidentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentError::DuplicateId(id) => write!(f, "duplicate incident id: {id}"),
            IncidentError::LatitudeOutOfRange { id, lat } => {
                write!(f, "incident {id}: latitude {lat} outside [-90, 90]")
            }
            IncidentError::LongitudeOutOfRange { id, lng } => {
                write!(f, "incident {id}: longitude {lng} outside [-180, 180]")
            }
            IncidentError::SeverityOutOfRange { id, severity } => write!(
                f,
                "incident {id}: severity {severity} outside [{MIN_SEVERITY}, {MAX_SEVERITY}]"
            ),
        }
    }
}

impl std::error::Error for IncidentError {}

/// The session's ordered incident sequence.
///
/// Positions are stable for the lifetime of the set and double as instance
/// slots in the render buffer.
#[derive(Debug, Clone, Default)]
pub struct IncidentSet {
    incidents: Vec<Incident>,
    index_by_id: HashMap<String, usize>,
}

impl IncidentSet {
    pub fn new(incidents: Vec<Incident>) -> Result<Self, IncidentError> {
        let mut index_by_id = HashMap::with_capacity(incidents.len());
        for (index, incident) in incidents.iter().enumerate() {
            incident.validate()?;
            if index_by_id.insert(incident.id.clone(), index).is_some() {
                return Err(IncidentError::DuplicateId(incident.id.clone()));
            }
        }
        Ok(Self {
            incidents,
            index_by_id,
        })
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Incident> {
        self.incidents.get(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn as_slice(&self) -> &[Incident] {
        &self.incidents
    }

    pub fn iter(&self) -> impl Iterator<Item = &Incident> + '_ {
        self.incidents.iter()
    }
}
