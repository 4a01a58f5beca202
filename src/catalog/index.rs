//! Browse indexes: every donor, term, tag and place with its photo count.

use std::collections::HashMap;

use serde::Serialize;

use crate::model::photo::{location_parts, Photo};

use super::PhotoSet;

/// One row of a browse index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexEntry {
    pub name: String,
    pub count: usize,
}

/// Photo count per donor.
pub fn donors(set: &PhotoSet<'_>) -> Vec<IndexEntry> {
    count_by(set, |photo| photo.donor.iter().map(|d| d.to_string()).collect())
}

/// Photo count per subject term.
pub fn terms(set: &PhotoSet<'_>) -> Vec<IndexEntry> {
    count_by(set, |photo| photo.terms.iter().map(|t| t.term.clone()).collect())
}

/// Photo count per accepted tag. Proposed tags are not listed.
pub fn tags(set: &PhotoSet<'_>) -> Vec<IndexEntry> {
    count_by(set, |photo| {
        let mut tags: Vec<String> = photo
            .tags
            .iter()
            .filter(|t| t.accepted)
            .map(|t| t.tag.clone())
            .collect();
        tags.dedup();
        tags
    })
}

/// Published photos per `(county, state)`.
pub fn counties(set: &PhotoSet<'_>) -> Vec<IndexEntry> {
    count_by(set, |photo| {
        if !photo.is_published || photo.county.is_empty() {
            return Vec::new();
        }
        vec![location_parts("", &photo.county, &photo.state, "").join(", ")]
    })
}

/// Published photos per `(city, state)`.
pub fn cities(set: &PhotoSet<'_>) -> Vec<IndexEntry> {
    count_by(set, |photo| {
        if !photo.is_published || photo.city.is_empty() {
            return Vec::new();
        }
        vec![location_parts(&photo.city, "", &photo.state, "").join(", ")]
    })
}

fn count_by(set: &PhotoSet<'_>, keys: impl Fn(&Photo) -> Vec<String>) -> Vec<IndexEntry> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for photo in set.iter() {
        for key in keys(photo) {
            *counts.entry(key).or_default() += 1;
        }
    }
    let mut sorted: Vec<IndexEntry> = counts
        .into_iter()
        .filter(|&(_, count)| count > 0)
        .map(|(name, count)| IndexEntry { name, count })
        .collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
}
