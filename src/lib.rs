//! `fotosearch`: search query language for a historical photo archive.
//!
//! This crate provides the core library for parsing archive queries into
//! expression trees, describing them, evaluating them against an in-memory
//! catalog, and paginating the ordered results.

pub mod catalog;
pub mod config;
pub mod error;
pub mod model;
pub mod search;
