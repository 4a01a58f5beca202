//! Human-readable summaries of search expressions.
//!
//! A [`Description`] keeps the leaves (and `Maximum` nodes) of an
//! expression in order and renders them grouped by kind:
//!
//! ```text
//! [Term(dog), Term(Farm), YearEquals(1912)]  →  from 1912; and termed with dog and farm
//! [YearLTE(1920), YearGTE(1910)]             →  between 1910 and 1920
//! [City(Waterloo), State(IA)]                →  from Waterloo, IA
//! ```

use std::fmt;

use crate::model::photo::location_parts;

use super::expression::Expression;

/// Flattened view of an expression, used only for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    parts: Vec<Expression>,
}

impl Description {
    pub fn new(parts: Vec<Expression>) -> Self {
        Self { parts }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    fn years(&self) -> Option<String> {
        let mut equals = Vec::new();
        let mut from = None;
        let mut until = None;
        for part in &self.parts {
            match part {
                Expression::YearEquals(y) => equals.push(y.to_string()),
                Expression::YearGTE(y) if from.is_none() => from = Some(*y),
                Expression::YearLTE(y) if until.is_none() => until = Some(*y),
                _ => {}
            }
        }

        let mut phrases = Vec::new();
        if !equals.is_empty() {
            phrases.push(format!("from {}", equals.join(" and ")));
        }
        match (from, until) {
            (Some(start), Some(end)) => phrases.push(format!("between {start} and {end}")),
            (Some(start), None) => phrases.push(format!("from {start} and later")),
            (None, Some(end)) => phrases.push(format!("from {end} and earlier")),
            (None, None) => {}
        }
        join_nonempty(phrases, "; and ")
    }

    fn location(&self) -> Option<String> {
        let (mut city, mut county, mut state, mut country) = ("", "", "", "");
        for part in &self.parts {
            match part {
                Expression::City(v) if city.is_empty() => city = v.as_str(),
                Expression::County(v) if county.is_empty() => county = v.as_str(),
                Expression::State(v) if state.is_empty() => state = v.as_str(),
                Expression::Country(v) if country.is_empty() => country = v.as_str(),
                _ => {}
            }
        }
        let parts = location_parts(city, county, state, country);
        if parts.is_empty() {
            None
        } else {
            Some(format!("from {}", parts.join(", ")))
        }
    }

    /// `"<verb> a and b"` over the values `pick` extracts.
    fn values(&self, verb: &str, pick: impl Fn(&Expression) -> Option<String>) -> Option<String> {
        let values: Vec<String> = self.parts.iter().filter_map(pick).collect();
        if values.is_empty() {
            None
        } else {
            Some(format!("{verb} {}", values.join(" and ")))
        }
    }
}

fn join_nonempty(phrases: Vec<String>, separator: &str) -> Option<String> {
    if phrases.is_empty() {
        None
    } else {
        Some(phrases.join(separator))
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = [
            self.years(),
            self.location(),
            self.values("donated by", |e| match e {
                Expression::Donor(v) => Some(v.clone()),
                Expression::DonorExactly(donor) => Some(donor.to_string()),
                _ => None,
            }),
            self.values("termed with", |e| match e {
                Expression::Term(v) => Some(v.to_lowercase()),
                Expression::TermExactly(term) => Some(term.term.clone()),
                _ => None,
            }),
            self.values("tagged with", |e| match e {
                Expression::Tag(v) | Expression::TagExactly(v) => Some(v.clone()),
                _ => None,
            }),
            self.values("captioned with", |e| match e {
                Expression::Caption(v) => Some(v.clone()),
                _ => None,
            }),
            self.values("related to", |e| match e {
                Expression::Maximum(..) => Some(e.leftmost_value()),
                _ => None,
            }),
        ];
        let text = join_nonempty(sections.into_iter().flatten().collect(), "; and ");
        f.write_str(text.as_deref().unwrap_or(""))
    }
}
