//! The searchable fields and their `field:` keywords.
//!
//! Both the tokenizer (to recognize `field:value`) and the parser (to build
//! leaves and expand bare words) go through [`FIELDS`]. Adding a searchable
//! field is one row here plus one leaf variant in [`Expression`].

use super::expression::Expression;

/// A field that can be named in a `field:value` query term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Caption,
    Tag,
    Term,
    Donor,
    City,
    County,
    State,
    Country,
    Year,
}

/// Keyword → field table.
pub const FIELDS: &[(&str, Field)] = &[
    ("caption", Field::Caption),
    ("tag", Field::Tag),
    ("term", Field::Term),
    ("donor", Field::Donor),
    ("city", Field::City),
    ("county", Field::County),
    ("state", Field::State),
    ("country", Field::Country),
    ("year", Field::Year),
];

/// Textual fields searched by an unqualified word, highest priority first.
pub const TEXT_FIELDS: &[Field] = &[
    Field::Donor,
    Field::Caption,
    Field::State,
    Field::Country,
    Field::County,
    Field::City,
    Field::Tag,
    Field::Term,
];

/// Fields a bare word can denote exactly, used by the collection parser.
pub const COLLECTION_FIELDS: &[Field] = &[
    Field::Tag,
    Field::Term,
    Field::City,
    Field::State,
    Field::Country,
    Field::County,
];

impl Field {
    /// Look up a keyword (ASCII case-insensitive).
    pub fn from_keyword(keyword: &str) -> Option<Field> {
        FIELDS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(keyword))
            .map(|&(_, field)| field)
    }

    pub fn keyword(self) -> &'static str {
        FIELDS
            .iter()
            .find(|&&(_, field)| field == self)
            .map(|&(name, _)| name)
            .unwrap_or("")
    }

    /// Build the leaf expression for `self:value`.
    ///
    /// `year` accepts `1912`, `1912+` (and later), `1912-` (and earlier) and
    /// `1900..1920` (inclusive range). Returns `None` when the value does not
    /// fit the field, so the caller can treat the term as plain text.
    pub fn leaf(self, value: &str) -> Option<Expression> {
        if value.is_empty() {
            return None;
        }
        let text = value.to_string();
        let expr = match self {
            Field::Caption => Expression::Caption(text),
            Field::Tag => Expression::Tag(text),
            Field::Term => Expression::Term(text),
            Field::Donor => Expression::Donor(text),
            Field::City => Expression::City(text),
            Field::County => Expression::County(text),
            Field::State => Expression::State(text),
            Field::Country => Expression::Country(text),
            Field::Year => return parse_year(value),
        };
        Some(expr)
    }
}

/// Parse the value of a `year:` term.
fn parse_year(value: &str) -> Option<Expression> {
    if let Some((start, end)) = value.split_once("..") {
        let start: i32 = start.parse().ok()?;
        let end: i32 = end.parse().ok()?;
        return Some(Expression::And(
            Box::new(Expression::YearGTE(start)),
            Box::new(Expression::YearLTE(end)),
        ));
    }
    if let Some(year) = value.strip_suffix('+') {
        return year.parse().ok().map(Expression::YearGTE);
    }
    if let Some(year) = value.strip_suffix('-') {
        return year.parse().ok().map(Expression::YearLTE);
    }
    value.parse().ok().map(Expression::YearEquals)
}
