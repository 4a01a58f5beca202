//! In-memory photo catalog and filtered views over it.
//!
//! A [`Catalog`] owns every [`Photo`]; a [`PhotoSet`] is a cheap, immutable
//! selection of catalog members that searches narrow, combine and order.

pub mod index;
pub mod position;

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Result, SearchError};
use crate::model::photo::Photo;

/// Every photo known to the archive.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Catalog {
    #[serde(default)]
    photos: Vec<Photo>,
}

impl Catalog {
    pub fn new(photos: Vec<Photo>) -> Self {
        Self { photos }
    }

    /// Load a catalog from a JSON file of the form `{"photos": [...]}`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| SearchError::io(path, e))?;
        let catalog: Catalog =
            serde_json::from_str(&text).map_err(|e| SearchError::CatalogFormat {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        info!(
            path = %path.display(),
            photos = catalog.photos.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Look up a photo by id.
    pub fn get(&self, id: u64) -> Option<&Photo> {
        self.photos.iter().find(|photo| photo.id == id)
    }

    /// A view containing every photo.
    pub fn all(&self) -> PhotoSet<'_> {
        PhotoSet::all(self)
    }

    /// Smallest and largest year across the whole catalog.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        year_bounds(self.photos.iter())
    }
}

/// An immutable subset of a catalog.
///
/// Members are kept as catalog indices in ascending order, so set
/// operations are linear merges and iteration follows catalog order.
#[derive(Debug, Clone)]
pub struct PhotoSet<'a> {
    catalog: &'a Catalog,
    members: Vec<usize>,
}

impl<'a> PhotoSet<'a> {
    pub fn all(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            members: (0..catalog.photos.len()).collect(),
        }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Members for which `pred` holds.
    pub fn filter(&self, pred: impl Fn(&Photo) -> bool) -> PhotoSet<'a> {
        let members = self
            .members
            .iter()
            .copied()
            .filter(|&i| pred(&self.catalog.photos[i]))
            .collect();
        self.with_members(members)
    }

    pub fn intersect(&self, other: &PhotoSet<'a>) -> PhotoSet<'a> {
        let (mut a, mut b) = (self.members.iter().peekable(), other.members.iter().peekable());
        let mut members = Vec::new();
        while let (Some(&&x), Some(&&y)) = (a.peek(), b.peek()) {
            match x.cmp(&y) {
                std::cmp::Ordering::Less => {
                    a.next();
                }
                std::cmp::Ordering::Greater => {
                    b.next();
                }
                std::cmp::Ordering::Equal => {
                    members.push(x);
                    a.next();
                    b.next();
                }
            }
        }
        self.with_members(members)
    }

    pub fn union(&self, other: &PhotoSet<'a>) -> PhotoSet<'a> {
        let mut members = Vec::with_capacity(self.members.len() + other.members.len());
        let (mut a, mut b) = (self.members.iter().peekable(), other.members.iter().peekable());
        loop {
            let next = match (a.peek(), b.peek()) {
                (Some(&&x), Some(&&y)) if x < y => a.next(),
                (Some(&&x), Some(&&y)) if x > y => b.next(),
                (Some(_), Some(_)) => {
                    b.next();
                    a.next()
                }
                (Some(_), None) => a.next(),
                (None, Some(_)) => b.next(),
                (None, None) => break,
            };
            if let Some(&i) = next {
                members.push(i);
            }
        }
        self.with_members(members)
    }

    /// Members of `self` that are not in `other`.
    pub fn difference(&self, other: &PhotoSet<'a>) -> PhotoSet<'a> {
        let members = self
            .members
            .iter()
            .copied()
            .filter(|i| other.members.binary_search(i).is_err())
            .collect();
        self.with_members(members)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, photo_id: u64) -> bool {
        self.iter().any(|photo| photo.id == photo_id)
    }

    /// Members in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Photo> + '_ {
        self.members.iter().map(|&i| &self.catalog.photos[i])
    }

    /// Members in canonical result order: by year, then id. Photos without
    /// a year are left out.
    pub fn ordered(&self) -> Vec<&'a Photo> {
        let mut photos: Vec<&'a Photo> = self.iter().filter(|p| p.year.is_some()).collect();
        photos.sort_by_key(|photo| photo.order_key());
        photos
    }

    /// Ids in canonical result order.
    pub fn ordered_ids(&self) -> Vec<u64> {
        self.ordered().into_iter().map(|photo| photo.id).collect()
    }

    /// One page (1-based) of the ordered members. Page 0 is treated as page 1.
    pub fn page(&self, number: usize, page_size: usize) -> Vec<&'a Photo> {
        let page_size = page_size.max(1);
        self.ordered()
            .into_iter()
            .skip(number.saturating_sub(1).saturating_mul(page_size))
            .take(page_size)
            .collect()
    }

    /// Number of pages needed to show every ordered member.
    pub fn page_count(&self, page_size: usize) -> usize {
        let ordered = self.iter().filter(|p| p.year.is_some()).count();
        ordered.div_ceil(page_size.max(1))
    }

    fn with_members(&self, members: Vec<usize>) -> PhotoSet<'a> {
        PhotoSet {
            catalog: self.catalog,
            members,
        }
    }
}

pub(crate) fn year_bounds<'p>(photos: impl Iterator<Item = &'p Photo>) -> Option<(i32, i32)> {
    photos.filter_map(|photo| photo.year).fold(None, |range, year| {
        Some(match range {
            None => (year, year),
            Some((min, max)) => (min.min(year), max.max(year)),
        })
    })
}
