//! Compiled search expressions.
//!
//! An [`Expression`] is an immutable tree: leaves test one photo field
//! against one value, combinators join subtrees. Rewrites such as
//! [`Expression::shakeout`] build new trees instead of editing in place.
//!
//! Evaluation against a catalog lives in [`super::evaluate`]; rendering a
//! readable summary lives in [`super::description`].

use std::fmt;

use crate::error::{Result, SearchError};
use crate::model::donor::Donor;
use crate::model::tag::Term;

use super::description::Description;
use super::field::{COLLECTION_FIELDS, TEXT_FIELDS};

/// A node of a search expression tree.
///
/// Equality is structural: same variant, same children, same values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expression {
    Caption(String),
    Tag(String),
    Term(String),
    Donor(String),
    City(String),
    County(String),
    State(String),
    Country(String),
    YearEquals(i32),
    /// Year at most the value.
    YearLTE(i32),
    /// Year at least the value.
    YearGTE(i32),

    /// A specific catalog term, matched by id (structured form filter).
    TermExactly(Term),
    /// A specific donor, matched by id (structured form filter).
    DonorExactly(Donor),
    /// An exact tag name.
    TagExactly(String),

    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
    /// Relevance preference: the left side's matches if there are any,
    /// otherwise the right side's.
    Maximum(Box<Expression>, Box<Expression>),
}

impl Expression {
    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Or(Box::new(left), Box::new(right))
    }

    pub fn negate(inner: Expression) -> Self {
        Expression::Not(Box::new(inner))
    }

    pub fn maximum(left: Expression, right: Expression) -> Self {
        Expression::Maximum(Box::new(left), Box::new(right))
    }

    /// Full-text match of an unqualified word: `Or` across every textual
    /// field, in [`TEXT_FIELDS`] priority order.
    pub fn any_text(value: &str) -> Self {
        let leaves = TEXT_FIELDS.iter().filter_map(|field| field.leaf(value));
        nest_right(leaves, Expression::or).unwrap_or_else(|| Expression::Caption(value.into()))
    }

    /// Full-text match of an unqualified integer: the year first, then every
    /// textual field.
    pub fn any_number(value: i32, text: &str) -> Self {
        Expression::or(Expression::YearEquals(value), Expression::any_text(text))
    }

    /// Exact match of a word against the fields that can name a collection,
    /// preferring earlier fields via `Maximum`.
    pub fn collection_word(value: &str) -> Self {
        let leaves = COLLECTION_FIELDS.iter().filter_map(|field| field.leaf(value));
        nest_right(leaves, Expression::maximum).unwrap_or_else(|| Expression::Tag(value.into()))
    }

    /// Whether the expression is precise enough to name a canonical subset
    /// of photos.
    pub fn is_collection(&self) -> bool {
        match self {
            Expression::And(left, right) | Expression::Maximum(left, right) => {
                left.is_collection() && right.is_collection()
            }
            Expression::Or(..) | Expression::Not(_) => false,
            _ => true,
        }
    }

    /// Variant name, for diagnostics.
    pub fn node_name(&self) -> &'static str {
        match self {
            Expression::Caption(_) => "Caption",
            Expression::Tag(_) => "Tag",
            Expression::Term(_) => "Term",
            Expression::Donor(_) => "Donor",
            Expression::City(_) => "City",
            Expression::County(_) => "County",
            Expression::State(_) => "State",
            Expression::Country(_) => "Country",
            Expression::YearEquals(_) => "YearEquals",
            Expression::YearLTE(_) => "YearLTE",
            Expression::YearGTE(_) => "YearGTE",
            Expression::TermExactly(_) => "TermExactly",
            Expression::DonorExactly(_) => "DonorExactly",
            Expression::TagExactly(_) => "TagExactly",
            Expression::And(..) => "And",
            Expression::Or(..) => "Or",
            Expression::Not(_) => "Not",
            Expression::Maximum(..) => "Maximum",
        }
    }


    /// Compact label, e.g. `Year: 1912+` or `City: Waterloo`.
    ///
    /// Undefined for `And`, `Or` and `Not`; `Maximum` uses its left side.
    pub fn short_label(&self) -> Result<String> {
        let label = match self {
            Expression::Caption(v) => format!("Caption: {v}"),
            Expression::Tag(v) | Expression::TagExactly(v) => format!("Tag: {v}"),
            Expression::Term(v) => format!("Term: {}", v.to_lowercase()),
            Expression::TermExactly(term) => format!("Term: {term}"),
            Expression::Donor(v) => format!("Donor: {v}"),
            Expression::DonorExactly(donor) => format!("Donor: {donor}"),
            Expression::City(v) => format!("City: {v}"),
            Expression::County(v) => format!("County: {v}"),
            Expression::State(v) => format!("State: {v}"),
            Expression::Country(v) => format!("Country: {v}"),
            Expression::YearEquals(y) => format!("Year: {y}"),
            Expression::YearLTE(y) => format!("Year: {y}-"),
            Expression::YearGTE(y) => format!("Year: {y}+"),
            Expression::Maximum(left, _) => return left.short_label(),
            Expression::And(..) | Expression::Or(..) | Expression::Not(_) => {
                return Err(SearchError::NotImplemented {
                    operation: "short_label",
                    node: self.node_name(),
                })
            }
        };
        Ok(label)
    }

    /// Coarse category used to group labels in a UI.
    pub fn group(&self) -> Result<&'static str> {
        let group = match self {
            Expression::YearEquals(_) | Expression::YearLTE(_) | Expression::YearGTE(_) => "year",
            Expression::City(_)
            | Expression::County(_)
            | Expression::State(_)
            | Expression::Country(_) => "location",
            Expression::Term(_) | Expression::TermExactly(_) => "term",
            Expression::Tag(_) | Expression::TagExactly(_) => "tag",
            Expression::Donor(_) | Expression::DonorExactly(_) => "donor",
            Expression::Caption(_) => "caption",
            Expression::Maximum(..) => "max",
            Expression::And(..) | Expression::Or(..) | Expression::Not(_) => {
                return Err(SearchError::NotImplemented {
                    operation: "group",
                    node: self.node_name(),
                })
            }
        };
        Ok(group)
    }

    /// Leaves and `Maximum` nodes in left-to-right order, without the
    /// boolean structure.
    pub fn description(&self) -> Description {
        let mut parts = Vec::new();
        self.collect_described(&mut parts);
        Description::new(parts)
    }

    fn collect_described(&self, parts: &mut Vec<Expression>) {
        match self {
            Expression::And(left, right) | Expression::Or(left, right) => {
                left.collect_described(parts);
                right.collect_described(parts);
            }
            Expression::Not(inner) => inner.collect_described(parts),
            _ => parts.push(self.clone()),
        }
    }

    /// Plain value of the left-most leaf (`"dog"` for `Maximum(Tag("dog"), ..)`).
    pub fn leftmost_value(&self) -> String {
        match self {
            Expression::Caption(v)
            | Expression::Tag(v)
            | Expression::Term(v)
            | Expression::Donor(v)
            | Expression::City(v)
            | Expression::County(v)
            | Expression::State(v)
            | Expression::Country(v)
            | Expression::TagExactly(v) => v.clone(),
            Expression::YearEquals(y) | Expression::YearLTE(y) | Expression::YearGTE(y) => {
                y.to_string()
            }
            Expression::TermExactly(term) => term.term.clone(),
            Expression::DonorExactly(donor) => donor.to_string(),
            Expression::And(left, _) | Expression::Or(left, _) | Expression::Maximum(left, _) => {
                left.leftmost_value()
            }
            Expression::Not(inner) => inner.leftmost_value(),
        }
    }

    /// Remove no-op structure without changing which photos match:
    /// double negation, and binary nodes whose two sides are identical.
    ///
    /// Works bottom-up, so `e.shakeout().shakeout() == e.shakeout()`.
    pub fn shakeout(self) -> Expression {
        match self {
            Expression::Not(inner) => match (*inner).shakeout() {
                Expression::Not(twice) => *twice,
                inner => Expression::negate(inner),
            },
            Expression::And(left, right) => {
                collapse((*left).shakeout(), (*right).shakeout(), Expression::and)
            }
            Expression::Or(left, right) => {
                collapse((*left).shakeout(), (*right).shakeout(), Expression::or)
            }
            Expression::Maximum(left, right) => {
                collapse((*left).shakeout(), (*right).shakeout(), Expression::maximum)
            }
            leaf => leaf,
        }
    }

    /// Injective text encoding of the tree, used for cache keys.
    ///
    /// Strings are length-prefixed, so no two distinct trees share an
    /// encoding whatever characters their values contain.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        self.encode(&mut out);
        out
    }

    fn encode(&self, out: &mut String) {
        out.push_str(self.node_name());
        out.push('(');
        match self {
            Expression::Caption(v)
            | Expression::Tag(v)
            | Expression::Term(v)
            | Expression::Donor(v)
            | Expression::City(v)
            | Expression::County(v)
            | Expression::State(v)
            | Expression::Country(v)
            | Expression::TagExactly(v) => encode_str(out, v),
            Expression::YearEquals(y) | Expression::YearLTE(y) | Expression::YearGTE(y) => {
                out.push_str(&y.to_string());
            }
            Expression::TermExactly(term) => {
                out.push_str(&term.id.to_string());
                out.push(',');
                encode_str(out, &term.term);
            }
            Expression::DonorExactly(donor) => {
                out.push_str(&donor.id.to_string());
                out.push(',');
                encode_str(out, &donor.first_name);
                out.push(',');
                encode_str(out, &donor.last_name);
            }
            Expression::And(left, right)
            | Expression::Or(left, right)
            | Expression::Maximum(left, right) => {
                left.encode(out);
                out.push(',');
                right.encode(out);
            }
            Expression::Not(inner) => inner.encode(out),
        }
        out.push(')');
    }
}

fn encode_str(out: &mut String, value: &str) {
    out.push_str(&value.len().to_string());
    out.push(':');
    out.push_str(value);
}

/// `op(left, right)`, or just `left` when both sides are the same.
fn collapse(
    left: Expression,
    right: Expression,
    op: fn(Expression, Expression) -> Expression,
) -> Expression {
    if left == right {
        left
    } else {
        op(left, right)
    }
}

/// Fold `[a, b, c]` into `op(a, op(b, c))`.
fn nest_right(
    items: impl DoubleEndedIterator<Item = Expression>,
    op: fn(Expression, Expression) -> Expression,
) -> Option<Expression> {
    items.rev().reduce(|acc, item| op(item, acc))
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Caption(v)
            | Expression::Tag(v)
            | Expression::Term(v)
            | Expression::Donor(v)
            | Expression::City(v)
            | Expression::County(v)
            | Expression::State(v)
            | Expression::Country(v)
            | Expression::TagExactly(v) => write!(f, "{}({v:?})", self.node_name()),
            Expression::YearEquals(y) | Expression::YearLTE(y) | Expression::YearGTE(y) => {
                write!(f, "{}({y})", self.node_name())
            }
            Expression::TermExactly(term) => write!(f, "TermExactly({}, {:?})", term.id, term.term),
            Expression::DonorExactly(donor) => {
                write!(f, "DonorExactly({}, {:?})", donor.id, donor.to_string())
            }
            Expression::And(left, right)
            | Expression::Or(left, right)
            | Expression::Maximum(left, right) => {
                write!(f, "{}({left}, {right})", self.node_name())
            }
            Expression::Not(inner) => write!(f, "Not({inner})"),
        }
    }
}

impl std::ops::BitAnd for Expression {
    type Output = Expression;

    fn bitand(self, rhs: Expression) -> Expression {
        Expression::and(self, rhs)
    }
}

impl std::ops::BitOr for Expression {
    type Output = Expression;

    fn bitor(self, rhs: Expression) -> Expression {
        Expression::or(self, rhs)
    }
}

impl std::ops::Not for Expression {
    type Output = Expression;

    fn not(self) -> Expression {
        Expression::negate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::Expression::*;
    use super::{Description, Expression, SearchError};

    fn caption(v: &str) -> Expression {
        Caption(v.into())
    }

    fn term(v: &str) -> Expression {
        Term(v.into())
    }

    #[test]
    fn test_leaves_are_collections() {
        assert!(YearEquals(1912).is_collection());
        assert!(YearLTE(1912).is_collection());
        assert!(YearGTE(1912).is_collection());
        assert!(City("Waterloo".into()).is_collection());
        assert!(County("Black Hawk".into()).is_collection());
        assert!(State("IA".into()).is_collection());
        assert!(Country("USA".into()).is_collection());
        assert!(term("Farm").is_collection());
        assert!(caption("Farm").is_collection());
    }

    #[test]
    fn test_and_and_maximum_need_both_sides() {
        assert!((term("Farm") & term("Animals")).is_collection());
        assert!(Expression::maximum(term("Farm"), term("Animals")).is_collection());
        assert!(!(term("Farm") & !term("Animals")).is_collection());
        assert!(!Expression::maximum(term("Farm"), term("a") | term("b")).is_collection());
    }

    #[test]
    fn test_or_and_not_are_never_collections() {
        assert!(!(term("Farm") | term("Animals")).is_collection());
        assert!(!(!term("Farm")).is_collection());
    }

    #[test]
    fn test_any_text_field_order() {
        let v = || "dog".to_string();
        assert_eq!(
            Expression::any_text("dog"),
            Donor(v()) | (Caption(v()) | (State(v()) | (Country(v()) | (County(v()) | (City(v()) | (Tag(v()) | Term(v())))))))
        );
    }

    #[test]
    fn test_collection_word() {
        let v = || "dog".to_string();
        let expected = Expression::maximum(
            Tag(v()),
            Expression::maximum(
                Term(v()),
                Expression::maximum(
                    City(v()),
                    Expression::maximum(
                        State(v()),
                        Expression::maximum(Country(v()), County(v())),
                    ),
                ),
            ),
        );
        assert_eq!(Expression::collection_word("dog"), expected);
        assert!(expected.is_collection());
    }

    #[test]
    fn test_short_labels() {
        assert_eq!(YearEquals(1912).short_label().unwrap(), "Year: 1912");
        assert_eq!(YearLTE(1912).short_label().unwrap(), "Year: 1912-");
        assert_eq!(YearGTE(1912).short_label().unwrap(), "Year: 1912+");
        assert_eq!(City("Waterloo".into()).short_label().unwrap(), "City: Waterloo");
        assert_eq!(County("Black Hawk".into()).short_label().unwrap(), "County: Black Hawk");
        assert_eq!(State("IA".into()).short_label().unwrap(), "State: IA");
        assert_eq!(Country("USA".into()).short_label().unwrap(), "Country: USA");
        assert_eq!(term("Farm").short_label().unwrap(), "Term: farm");
        assert_eq!(
            Expression::maximum(term("Dog"), caption("dog")).short_label().unwrap(),
            "Term: dog"
        );
        let err = (term("dog") & term("Farm")).short_label().unwrap_err();
        assert!(matches!(
            err,
            SearchError::NotImplemented {
                operation: "short_label",
                node: "And"
            }
        ));
        assert!((!term("dog")).short_label().is_err());
    }

    #[test]
    fn test_groups() {
        assert_eq!(YearEquals(1912).group().unwrap(), "year");
        assert_eq!(YearLTE(1912).group().unwrap(), "year");
        assert_eq!(YearGTE(1912).group().unwrap(), "year");
        assert_eq!(City("Waterloo".into()).group().unwrap(), "location");
        assert_eq!(County("Black Hawk".into()).group().unwrap(), "location");
        assert_eq!(State("IA".into()).group().unwrap(), "location");
        assert_eq!(Country("USA".into()).group().unwrap(), "location");
        assert_eq!(term("Farm").group().unwrap(), "term");
        assert_eq!(Expression::maximum(term("dog"), term("dog")).group().unwrap(), "max");
        assert!((term("dog") | term("Farm")).group().is_err());
    }

    #[test]
    fn test_description_drops_boolean_structure() {
        assert_eq!(
            (term("dog") & !(term("Farm") | YearEquals(1912))).description(),
            Description::new(vec![term("dog"), term("Farm"), YearEquals(1912)])
        );
        let max = Expression::maximum(term("dog"), term("dog"));
        assert_eq!(max.description(), Description::new(vec![max.clone()]));
    }

    #[test]
    fn test_shakeout_removes_noops() {
        assert_eq!((!!caption("dog")).shakeout(), caption("dog"));
        assert_eq!((caption("dog") & caption("dog")).shakeout(), caption("dog"));
        assert_eq!(
            ((caption("a") | caption("a")) & !!caption("b")).shakeout(),
            caption("a") & caption("b")
        );
        assert_eq!((!!!caption("dog")).shakeout(), !caption("dog"));
    }

    #[test]
    fn test_shakeout_is_idempotent() {
        let exprs = vec![
            !!!!caption("x"),
            Expression::maximum(!!term("a") & !!term("a"), YearEquals(1) | YearEquals(1)),
            !(caption("a") & caption("b")) | !(caption("a") & caption("b")),
            Expression::any_number(1912, "1912"),
        ];
        for expr in exprs {
            let once = expr.shakeout();
            assert_eq!(once.clone().shakeout(), once);
        }
    }

    #[test]
    fn test_canonical_is_injective_over_values() {
        assert_ne!(caption("a,b").canonical(), caption("a").canonical());
        assert_ne!(
            (caption("a") & caption("b")).canonical(),
            caption("a), Caption(1:b").canonical()
        );
        assert_ne!(
            (caption("a") & caption("b")).canonical(),
            (caption("b") & caption("a")).canonical()
        );
        assert_ne!(Tag("dog".into()).canonical(), TagExactly("dog".into()).canonical());
        assert_eq!(
            (caption("dog") & YearEquals(1912)).canonical(),
            "And(Caption(3:dog),YearEquals(1912))"
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(
            (caption("dog") | !YearGTE(1900)).to_string(),
            "Or(Caption(\"dog\"), Not(YearGTE(1900)))"
        );
    }

    #[test]
    fn test_leftmost_value() {
        assert_eq!(Expression::collection_word("dog").leftmost_value(), "dog");
        assert_eq!((YearEquals(1912) & caption("x")).leftmost_value(), "1912");
    }
}
