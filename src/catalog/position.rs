//! Positions of photos within an ordered result set.
//!
//! Results are always ordered by `(year, id)`. The helpers here back the
//! timeline (one entry per year, with the rank of its first photo) and
//! "jump to the page containing this photo" navigation.

use serde::Serialize;

use crate::model::photo::Photo;

use super::PhotoSet;

/// First photo of a year within an ordered set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearEntry {
    pub year: i32,
    /// Lowest photo id with this year.
    pub photo_id: u64,
    /// Number of photos in strictly earlier years.
    pub rank: usize,
}

/// Timeline slot for one calendar year, pointing at the nearest photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearLink {
    pub year: i32,
    pub photo_id: u64,
    pub rank: usize,
}

/// 1-based page holding the photo at `position`.
pub fn page_number(position: usize, page_size: usize) -> usize {
    position / page_size.max(1) + 1
}

impl<'a> PhotoSet<'a> {
    /// One entry per distinct year, in year order.
    pub fn year_index(&self) -> Vec<YearEntry> {
        let mut index: Vec<YearEntry> = Vec::new();
        for (rank, photo) in self.ordered().into_iter().enumerate() {
            let Some(year) = photo.year else { continue };
            if index.last().is_some_and(|entry| entry.year == year) {
                continue;
            }
            index.push(YearEntry {
                year,
                photo_id: photo.id,
                rank,
            });
        }
        index
    }

    /// Smallest and largest year among the members.
    pub fn year_range(&self) -> Option<(i32, i32)> {
        super::year_bounds(self.iter())
    }

    /// A link for every year of the catalog's full year range.
    ///
    /// Each year points at the representative of the latest indexed year
    /// not after it. Years before the first indexed year use the first.
    /// Empty when the set has no dated photos.
    ///
    /// This is a floor lookup. A ceiling lookup clamped to the last entry
    /// would send a gap year forward to the next photo; the floor keeps it
    /// on the last photo taken at or before that year instead.
    pub fn year_links(&self) -> Vec<YearLink> {
        let index = self.year_index();
        let (Some(first), Some((start, end))) = (index.first(), self.catalog().year_range()) else {
            return Vec::new();
        };

        (start..=end)
            .map(|year| {
                let floor = index.partition_point(|entry| entry.year <= year);
                let entry = floor.checked_sub(1).map_or(first, |i| &index[i]);
                YearLink {
                    year,
                    photo_id: entry.photo_id,
                    rank: entry.rank,
                }
            })
            .collect()
    }

    /// Zero-based position of `photo` in the ordered members: the number of
    /// members ordered strictly before it. `None` for undated photos.
    pub fn photo_position(&self, photo: &Photo) -> Option<usize> {
        let key = photo.order_key()?;
        Some(
            self.iter()
                .filter_map(Photo::order_key)
                .filter(|other| *other < key)
                .count(),
        )
    }
}
