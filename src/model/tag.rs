//! Subject terms and user-submitted tags.

use std::fmt;

/// A curated subject term ("Farm", "Airplane").
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Term {
    pub id: u64,
    pub term: String,
}

impl Term {
    pub fn new(id: u64, term: impl Into<String>) -> Self {
        Self {
            id,
            term: term.into(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.term)
    }
}

/// A tag attached to one photo.
///
/// Tags are proposed by users and only become public once accepted;
/// until then they are visible to their submitter and to reviewers.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PhotoTag {
    /// Tag text, always lower case.
    #[serde(deserialize_with = "lowercase")]
    pub tag: String,
    #[serde(default)]
    pub accepted: bool,
    /// User id of the submitter, if known.
    #[serde(default)]
    pub creator: Option<u64>,
}

impl PhotoTag {
    pub fn accepted(tag: &str) -> Self {
        Self {
            tag: tag.to_lowercase(),
            accepted: true,
            creator: None,
        }
    }

    pub fn proposed(tag: &str, creator: u64) -> Self {
        Self {
            tag: tag.to_lowercase(),
            accepted: false,
            creator: Some(creator),
        }
    }
}

fn lowercase<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: String = serde::Deserialize::deserialize(deserializer)?;
    Ok(raw.to_lowercase())
}
