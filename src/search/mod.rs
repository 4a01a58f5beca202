//! Search engine: tokenizing, parsing, expression trees and evaluation.

pub mod collection;
pub mod description;
pub mod evaluate;
pub mod expression;
pub mod field;
pub mod form;
pub mod parser;
pub mod token;

use crate::catalog::PhotoSet;
use crate::model::user::UserContext;

use self::collection::CollectionQuery;
use self::form::SearchForm;

/// High-level search: build the form's expression, then narrow `base` to
/// the matching dated photos.
///
/// A form with nothing filled in matches every published photo.
pub fn execute<'a>(
    base: &PhotoSet<'a>,
    form: &SearchForm,
    user: &UserContext,
) -> (CollectionQuery, PhotoSet<'a>) {
    let query = CollectionQuery::new(form.as_expression().ok(), user.clone());
    let results = query.filter(base);
    (query, results)
}
