//! Photo donors.

use std::fmt;

/// A person or institution who donated photos to the archive.
///
/// # Examples
/// - `Donor { first_name: "First", last_name: "Last", .. }` → `"Last, First"`
/// - `Donor { first_name: "", last_name: "Historical Society", .. }` → `"Historical Society"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Donor {
    pub id: u64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl Donor {
    pub fn new(id: u64, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }

    /// Whether `name` refers to this donor: first name, last name, or the
    /// full `"Last, First"` form, ignoring case.
    pub fn answers_to(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        (!self.last_name.is_empty() && self.last_name.to_lowercase() == name)
            || (!self.first_name.is_empty() && self.first_name.to_lowercase() == name)
            || self.to_string().to_lowercase() == name
    }
}

impl fmt::Display for Donor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first_name.is_empty() {
            write!(f, "{}", self.last_name)
        } else {
            write!(f, "{}, {}", self.last_name, self.first_name)
        }
    }
}
