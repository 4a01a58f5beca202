//! Catalog photo records.

use super::donor::Donor;
use super::tag::{PhotoTag, Term};

/// Prefix of every accession number.
const ACCESSION_PREFIX: &str = "FI";

/// One photo in the catalog, as seen by the search engine.
///
/// Image files, thumbnails and admin metadata live elsewhere; only the
/// fields that queries can reach are kept here.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Photo {
    pub id: u64,

    /// Year the photo was taken. Photos without a year are searchable but
    /// never appear in the ordered (paginated) view.
    pub year: Option<i32>,

    pub caption: String,
    pub city: String,
    pub county: String,
    pub state: String,
    pub country: String,

    pub donor: Option<Donor>,

    /// Unpublished photos are hidden from viewers without permission.
    pub is_published: bool,

    pub tags: Vec<PhotoTag>,
    pub terms: Vec<Term>,
}

impl Photo {
    /// Public identifier, e.g. `FI0000042`.
    pub fn accession_number(&self) -> String {
        format!("{ACCESSION_PREFIX}{:07}", self.id)
    }

    /// Parse an accession number back into a photo id.
    pub fn accession_to_id(accession: &str) -> Option<u64> {
        accession.strip_prefix(ACCESSION_PREFIX)?.parse().ok()
    }

    /// Human-readable location. A city makes the county redundant, and the
    /// country is only shown when nothing more specific is known.
    pub fn location(&self) -> String {
        let county = if self.city.is_empty() {
            self.county.as_str()
        } else {
            ""
        };
        let parts = location_parts(&self.city, county, &self.state, &self.country);
        if parts.is_empty() {
            "Location: n/a".to_string()
        } else {
            parts.join(", ")
        }
    }

    /// Sort key of the canonical result order.
    pub fn order_key(&self) -> Option<(i32, u64)> {
        self.year.map(|year| (year, self.id))
    }
}

/// Build the comma-separated pieces of a location description.
pub(crate) fn location_parts(city: &str, county: &str, state: &str, country: &str) -> Vec<String> {
    let mut parts = Vec::new();
    if !city.is_empty() {
        parts.push(city.to_string());
    }
    if !county.is_empty() {
        parts.push(format!("{county} County"));
    }
    if !state.is_empty() {
        parts.push(state.to_string());
    }
    if parts.is_empty() && !country.is_empty() {
        parts.push(country.to_string());
    }
    parts
}
