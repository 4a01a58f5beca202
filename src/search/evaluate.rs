//! Evaluation of expressions against a [`PhotoSet`].
//!
//! Each node denotes a subset of the base set: leaves filter it, `And`
//! intersects, `Or` unions, `Not` takes the complement within the base and
//! `Maximum` keeps its left result unless that is empty. Subtrees are
//! evaluated independently against the same base.
//!
//! Two modes differ only in how some leaves match:
//!
//! | leaf                      | search                       | collection              |
//! |---------------------------|------------------------------|-------------------------|
//! | caption                   | substring                    | substring               |
//! | city/county/state/country | substring                    | equality                |
//! | tag                       | equality, visible tags       | equality, accepted tags |
//! | term, donor               | equality                     | equality                |
//!
//! All text comparisons ignore case. Unpublished photos are removed from
//! the base first unless the viewer may see them.

use tracing::debug;

use crate::catalog::PhotoSet;
use crate::error::{Result, SearchError};
use crate::model::photo::Photo;
use crate::model::tag::PhotoTag;
use crate::model::user::Viewer;

use super::expression::Expression;

/// How leaves are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Free-form searching: loose text matching.
    Search,
    /// Canonical collections: exact field values.
    Collection,
}

type Predicate<'e> = Box<dyn Fn(&Photo) -> bool + 'e>;

/// Evaluates expressions for one viewer.
pub struct Evaluator<'v> {
    mode: Mode,
    viewer: &'v dyn Viewer,
}

impl<'v> Evaluator<'v> {
    pub fn new(mode: Mode, viewer: &'v dyn Viewer) -> Self {
        Self { mode, viewer }
    }

    /// Photos of `base` visible to the viewer that match `expr`.
    pub fn evaluate<'a>(&self, expr: &Expression, base: &PhotoSet<'a>) -> PhotoSet<'a> {
        let visible = if self.viewer.can_view_unpublished() {
            base.clone()
        } else {
            base.filter(|photo| photo.is_published)
        };
        let result = self.eval(expr, &visible);
        debug!(
            mode = ?self.mode,
            base = visible.len(),
            matched = result.len(),
            "Evaluated {expr}"
        );
        result
    }

    fn eval<'a>(&self, expr: &Expression, base: &PhotoSet<'a>) -> PhotoSet<'a> {
        match expr {
            Expression::And(left, right) => self.eval(left, base).intersect(&self.eval(right, base)),
            Expression::Or(left, right) => self.eval(left, base).union(&self.eval(right, base)),
            Expression::Not(inner) => base.difference(&self.eval(inner, base)),
            Expression::Maximum(left, right) => {
                let preferred = self.eval(left, base);
                if preferred.is_empty() {
                    self.eval(right, base)
                } else {
                    preferred
                }
            }
            leaf => base.filter(self.leaf_predicate(leaf)),
        }
    }

    fn leaf_predicate<'e>(&'e self, leaf: &'e Expression) -> Predicate<'e> {
        match leaf {
            Expression::YearEquals(year) => Box::new(move |p: &Photo| p.year == Some(*year)),
            Expression::YearLTE(year) => Box::new(move |p: &Photo| p.year.is_some_and(|y| y <= *year)),
            Expression::YearGTE(year) => Box::new(move |p: &Photo| p.year.is_some_and(|y| y >= *year)),

            Expression::Caption(value) => {
                let needle = value.to_lowercase();
                Box::new(move |p: &Photo| contains_ignore_case(&p.caption, &needle))
            }
            Expression::City(value) => self.place(value, |p| &p.city),
            Expression::County(value) => self.place(value, |p| &p.county),
            Expression::State(value) => self.place(value, |p| &p.state),
            Expression::Country(value) => self.place(value, |p| &p.country),

            Expression::Tag(value) | Expression::TagExactly(value) => {
                let wanted = value.to_lowercase();
                Box::new(move |p: &Photo| {
                    p.tags
                        .iter()
                        .any(|tag| tag.tag == wanted && self.tag_counts(tag))
                })
            }
            Expression::Term(value) => {
                let wanted = value.to_lowercase();
                Box::new(move |p: &Photo| p.terms.iter().any(|term| term.term.to_lowercase() == wanted))
            }
            Expression::TermExactly(wanted) => {
                Box::new(move |p: &Photo| p.terms.iter().any(|term| term.id == wanted.id))
            }
            Expression::Donor(name) => {
                Box::new(move |p: &Photo| p.donor.as_ref().is_some_and(|d| d.answers_to(name)))
            }
            Expression::DonorExactly(wanted) => {
                Box::new(move |p: &Photo| p.donor.as_ref().is_some_and(|d| d.id == wanted.id))
            }

            Expression::And(..) | Expression::Or(..) | Expression::Not(_) | Expression::Maximum(..) => {
                Box::new(|_: &Photo| false)
            }
        }
    }

    fn place<'e>(&self, value: &str, get: fn(&Photo) -> &String) -> Predicate<'e> {
        let needle = value.to_lowercase();
        match self.mode {
            Mode::Search => Box::new(move |p: &Photo| contains_ignore_case(get(p), &needle)),
            Mode::Collection => Box::new(move |p: &Photo| get(p).to_lowercase() == needle),
        }
    }

    fn tag_counts(&self, tag: &PhotoTag) -> bool {
        match self.mode {
            Mode::Search => self.viewer.can_see_tag(tag),
            Mode::Collection => tag.accepted,
        }
    }
}

fn contains_ignore_case(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

impl Expression {
    /// Photos of `base` matched by a free-form search.
    pub fn as_search<'a>(&self, base: &PhotoSet<'a>, viewer: &dyn Viewer) -> PhotoSet<'a> {
        Evaluator::new(Mode::Search, viewer).evaluate(self, base)
    }

    /// Photos of `base` in the collection this expression names.
    pub fn as_collection<'a>(
        &self,
        base: &PhotoSet<'a>,
        viewer: &dyn Viewer,
    ) -> Result<PhotoSet<'a>> {
        if !self.is_collection() {
            return Err(SearchError::NotACollection);
        }
        Ok(Evaluator::new(Mode::Collection, viewer).evaluate(self, base))
    }
}
