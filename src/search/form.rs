//! The structured search form: free query text plus dropdown filters.

use crate::error::{Result, SearchError};
use crate::model::donor::Donor;
use crate::model::tag::Term;

use super::expression::Expression;
use super::parser::parse_or_fallback;

/// Submitted search form. Empty strings and `None` mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchForm {
    pub query: String,
    pub term: Option<Term>,
    pub donor: Option<Donor>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub city: String,
    pub county: String,
    pub state: String,
    pub country: String,
}

impl SearchForm {
    /// Combine every filled-in field into one expression.
    ///
    /// The filters are alternatives: a photo matching any of them is found.
    /// The start and end year form a single range filter.
    pub fn as_expression(&self) -> Result<Expression> {
        let mut parts = Vec::new();

        if let Some(expr) = parse_or_fallback(&self.query) {
            parts.push(expr);
        }
        if let Some(term) = &self.term {
            parts.push(Expression::TermExactly(term.clone()));
        }

        let years = [
            self.start_year.map(Expression::YearGTE),
            self.end_year.map(Expression::YearLTE),
        ];
        if let Some(range) = years.into_iter().flatten().reduce(Expression::and) {
            parts.push(range);
        }

        if let Some(donor) = &self.donor {
            parts.push(Expression::DonorExactly(donor.clone()));
        }
        let places = [
            (&self.city, Expression::City as fn(String) -> Expression),
            (&self.county, Expression::County),
            (&self.state, Expression::State),
            (&self.country, Expression::Country),
        ];
        for (value, leaf) in places {
            let value = value.trim();
            if !value.is_empty() {
                parts.push(leaf(value.to_string()));
            }
        }

        parts
            .into_iter()
            .reduce(Expression::or)
            .ok_or(SearchError::NoExpression)
    }
}
