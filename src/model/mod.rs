//! Core data model types for photos, donors, terms, tags and viewers.

pub mod donor;
pub mod photo;
pub mod tag;
pub mod user;
