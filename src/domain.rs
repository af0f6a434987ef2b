//! Canonical event shape persisted in the `events` table

use serde::{Deserialize, Serialize};

/// A validated coordinate inside the Paris bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Normalized event row. One row per `id`; re-ingesting an id replaces the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Kept as the source text; parsed by the dashboard layer
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub address_name: String,
    pub address_street: String,
    pub address_zipcode: String,
    pub address_city: String,
    /// Latitude and longitude travel together, so a row never holds only one
    pub location: Option<GeoPoint>,
    /// Comma-joined tag list, `"Unknown"` when the source had none
    pub tags: String,
    /// Load-time category (tags, then price type, then `"Other"`)
    pub category: String,
    pub price_type: String,
    pub access_type: String,
    pub price_detail: String,
}

impl Event {
    pub fn latitude(&self) -> Option<f64> {
        self.location.map(|p| p.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        self.location.map(|p| p.longitude)
    }

    /// Individual tags, split back out of the stored string
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags.split(',').map(str::trim).filter(|t| !t.is_empty()).collect()
    }
}
