//! Query parser.
//!
//! Builds an [`Expression`] tree from the tokens produced by
//! [`tokenize`](super::token::tokenize).
//!
//! # Grammar
//!
//! ```text
//! maximum := or ( "|" maximum )?          -- loosest, right-nested
//! or      := and ( "OR" and )*
//! and     := unary ( "AND"? unary )*       -- adjacency is AND
//! unary   := "-" unary | primary
//! primary := field:value | word | number | "(" maximum ")"
//! ```
//!
//! A bare word expands to a full-text `Or` over every textual field; a bare
//! integer additionally matches the year. Operators that lose an operand
//! (`dog AND`, a trailing `-`) are dropped; a query left with nothing at all
//! is [`SearchError::NoExpression`].

use tracing::debug;

use crate::error::{Result, SearchError};

use super::expression::Expression;
use super::token::{tokenize, Token};

/// Tokenize and parse a query.
pub fn parse_query(input: &str) -> Result<Expression> {
    let tokens = tokenize(input)?;
    Parser::new(tokens).parse()
}

/// Treat the whole input as one free-text value.
///
/// Used when [`parse_query`] rejects the input: quotes are dropped and
/// whitespace collapsed, then the text is matched across every field.
pub fn simple_parse(input: &str) -> Result<Expression> {
    let text = input
        .split_whitespace()
        .map(|word| word.replace('"', ""))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        return Err(SearchError::NoExpression);
    }
    Ok(match text.parse::<i32>() {
        Ok(value) => Expression::any_number(value, &text),
        Err(_) => Expression::any_text(&text),
    })
}

/// Parse user input the way the search page does.
///
/// Returns `None` for "no filter". Malformed queries are retried with
/// [`simple_parse`] instead of being rejected. The result is shaken out.
pub fn parse_or_fallback(input: &str) -> Option<Expression> {
    match parse_query(input) {
        Ok(expr) => Some(expr.shakeout()),
        Err(SearchError::NoExpression) => None,
        Err(e) => {
            debug!(query = input, error = %e, "Query rejected, falling back to free text");
            simple_parse(input).ok().map(Expression::shakeout)
        }
    }
}

/// Parse a space-separated list of words into a collection expression.
///
/// Each word must match exactly one of the collection fields (tag, term,
/// city, state, country, county, preferred in that order); typed
/// `field:value` terms are used as they are. Operators, parentheses and
/// negation cannot be expressed by a collection and are skipped.
pub fn parse_collection(input: &str) -> Result<Expression> {
    let tokens = tokenize(input)?;
    let words = tokens
        .iter()
        .filter(|t| matches!(t, Token::Field(..) | Token::Word(_) | Token::Number { .. }))
        .count();
    if words > MAX_TERMS {
        return Err(SearchError::TooManyTerms { limit: MAX_TERMS });
    }
    tokens
        .into_iter()
        .filter_map(|token| match token {
            Token::Field(field, value) => field.leaf(&value),
            Token::Word(text) => Some(Expression::collection_word(&text)),
            Token::Number { value, text } => Some(Expression::maximum(
                Expression::YearEquals(value),
                Expression::collection_word(&text),
            )),
            _ => None,
        })
        .reduce(Expression::and)
        .ok_or(SearchError::NoExpression)
}

/// Deepest allowed nesting of groups and negations.
pub const MAX_DEPTH: usize = 64;

/// Most terms a single query may contain.
pub const MAX_TERMS: usize = 256;

/// Recursive-descent parser over a token list.
///
/// Recursion only happens for `(` and `-`, and is capped at [`MAX_DEPTH`];
/// operator chains are parsed iteratively and capped at [`MAX_TERMS`]
/// terms, which keeps both the parser and the resulting tree shallow.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    terms: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
            terms: 0,
        }
    }

    /// Parse the whole token list into exactly one expression.
    pub fn parse(mut self) -> Result<Expression> {
        let expr = self.parse_maximum()?;
        if self.peek().is_some() {
            // Only an unmatched `)` can stop the top level early.
            return Err(SearchError::UnexpectedParenthesis { index: self.pos });
        }
        expr.ok_or(SearchError::NoExpression)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Whether the next token can start a term.
    fn at_term(&self) -> bool {
        matches!(
            self.peek(),
            Some(Token::Field(..) | Token::Word(_) | Token::Number { .. } | Token::LParen | Token::Not)
        )
    }

    /// Enter one level of `(` or `-` opened at token `index`.
    fn descend(&mut self, index: usize) -> Result<()> {
        if self.depth >= MAX_DEPTH {
            return Err(SearchError::TooDeep { index });
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_maximum(&mut self) -> Result<Option<Expression>> {
        let mut operands = vec![self.parse_or()?];
        while self.eat(&Token::Pipe) {
            operands.push(self.parse_or()?);
        }
        // Right-nested: a | b | c is Maximum(a, Maximum(b, c)).
        Ok(operands
            .into_iter()
            .rev()
            .fold(None, |right, left| combine(left, right, Expression::maximum)))
    }

    fn parse_or(&mut self) -> Result<Option<Expression>> {
        let mut expr = self.parse_and()?;
        while self.eat(&Token::Or) {
            let right = self.parse_and()?;
            expr = combine(expr, right, Expression::or);
        }
        Ok(expr)
    }

    fn parse_and(&mut self) -> Result<Option<Expression>> {
        let mut expr = None;
        loop {
            if self.eat(&Token::And) {
                continue;
            }
            if !self.at_term() {
                break;
            }
            let right = self.parse_unary()?;
            expr = combine(expr, right, Expression::and);
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Option<Expression>> {
        let index = self.pos;
        if self.eat(&Token::Not) {
            if !self.at_term() {
                // Dangling `-`
                return Ok(None);
            }
            self.descend(index)?;
            let inner = self.parse_unary()?;
            self.depth -= 1;
            return Ok(inner.map(Expression::negate));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Option<Expression>> {
        let index = self.pos;
        let Some(token) = self.tokens.get(index).cloned() else {
            return Ok(None);
        };
        self.pos += 1;

        if matches!(token, Token::Field(..) | Token::Word(_) | Token::Number { .. }) {
            self.terms += 1;
            if self.terms > MAX_TERMS {
                return Err(SearchError::TooManyTerms { limit: MAX_TERMS });
            }
        }

        match token {
            Token::Field(field, value) => Ok(field.leaf(&value)),
            Token::Word(text) => Ok(Some(Expression::any_text(&text))),
            Token::Number { value, text } => Ok(Some(Expression::any_number(value, &text))),
            Token::LParen => {
                self.descend(index)?;
                let inner = self.parse_maximum()?;
                self.depth -= 1;
                if self.peek() != Some(&Token::RParen) {
                    return Err(SearchError::ExpectedParenthesis { index });
                }
                let close = self.pos;
                self.pos += 1;
                match inner {
                    Some(expr) => Ok(Some(expr)),
                    None => Err(SearchError::UnexpectedParenthesis { index: close }),
                }
            }
            Token::And | Token::Or | Token::Not | Token::RParen | Token::Pipe => Ok(None),
        }
    }
}

/// Join two optional operands, keeping whichever side exists.
fn combine(
    left: Option<Expression>,
    right: Option<Expression>,
    op: fn(Expression, Expression) -> Expression,
) -> Option<Expression> {
    match (left, right) {
        (Some(left), Some(right)) => Some(op(left, right)),
        (left, right) => left.or(right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caption(v: &str) -> Expression {
        Expression::Caption(v.into())
    }

    #[test]
    fn test_typed_number() {
        assert_eq!(parse_query("year:1912").unwrap(), Expression::YearEquals(1912));
    }

    #[test]
    fn test_typed_string() {
        assert_eq!(parse_query("caption:dog").unwrap(), caption("dog"));
    }

    #[test]
    fn test_untyped_string() {
        assert_eq!(parse_query("dog").unwrap(), Expression::any_text("dog"));
    }

    #[test]
    fn test_untyped_number() {
        assert_eq!(
            parse_query("1912").unwrap(),
            Expression::YearEquals(1912) | Expression::any_text("1912")
        );
    }

    #[test]
    fn test_negation() {
        assert_eq!(parse_query("-caption:dog").unwrap(), !caption("dog"));
        assert_eq!(parse_query("-(caption:bird)").unwrap(), !caption("bird"));
    }

    #[test]
    fn test_and_or() {
        assert_eq!(
            parse_query("caption:dog AND caption:cat").unwrap(),
            caption("dog") & caption("cat")
        );
        assert_eq!(
            parse_query("caption:dog OR caption:cat").unwrap(),
            caption("dog") | caption("cat")
        );
    }

    #[test]
    fn test_adjacent_terms_are_anded() {
        assert_eq!(
            parse_query("caption:dog caption:cat").unwrap(),
            caption("dog") & caption("cat")
        );
        assert_eq!(
            parse_query("caption:a caption:b OR caption:c").unwrap(),
            (caption("a") & caption("b")) | caption("c")
        );
    }

    #[test]
    fn test_maximum_binds_loosest() {
        assert_eq!(
            parse_query("caption:bird OR caption:dog | caption:cat OR caption:banana").unwrap(),
            Expression::maximum(
                caption("bird") | caption("dog"),
                caption("cat") | caption("banana")
            )
        );
        assert_eq!(
            parse_query("caption:a | caption:b | caption:c").unwrap(),
            Expression::maximum(caption("a"), Expression::maximum(caption("b"), caption("c")))
        );
    }

    #[test]
    fn test_negation_stays_inside_its_maximum_half() {
        assert_eq!(
            parse_query("-caption:dog | caption:cat").unwrap(),
            Expression::maximum(!caption("dog"), caption("cat"))
        );
        assert_eq!(
            parse_query("caption:dog | -caption:cat").unwrap(),
            Expression::maximum(caption("dog"), !caption("cat"))
        );
        assert_eq!(
            parse_query("caption:dog - | caption:cat").unwrap(),
            Expression::maximum(caption("dog"), caption("cat"))
        );
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            parse_query("caption:bird AND caption:dog OR caption:cat AND caption:banana").unwrap(),
            (caption("bird") & caption("dog")) | (caption("cat") & caption("banana"))
        );
        assert_eq!(
            parse_query("-caption:bird AND caption:dog OR caption:cat AND caption:banana")
                .unwrap(),
            (!caption("bird") & caption("dog")) | (caption("cat") & caption("banana"))
        );
    }

    #[test]
    fn test_parentheses() {
        assert_eq!(parse_query("(caption:bird)").unwrap(), caption("bird"));
        assert_eq!(parse_query("((caption:bird))").unwrap(), caption("bird"));
        assert_eq!(
            parse_query("caption:bird AND (caption:dog OR caption:cat) AND caption:banana")
                .unwrap(),
            (caption("bird") & (caption("dog") | caption("cat"))) & caption("banana")
        );
        assert_eq!(
            parse_query("(caption:bird OR caption:dog) AND (caption:cat OR caption:banana)")
                .unwrap(),
            (caption("bird") | caption("dog")) & (caption("cat") | caption("banana"))
        );
        assert_eq!(
            parse_query("((caption:bird OR caption:dog) AND (caption:cat caption:banana))")
                .unwrap(),
            (caption("bird") | caption("dog")) & (caption("cat") & caption("banana"))
        );
    }

    #[test]
    fn test_negated_parentheses() {
        assert_eq!(
            parse_query("caption:bird AND -(caption:dog OR caption:cat) AND caption:banana")
                .unwrap(),
            (caption("bird") & !(caption("dog") | caption("cat"))) & caption("banana")
        );
        assert_eq!(
            parse_query(" -( caption:bird OR caption:dog  )AND(- caption:cat OR caption:banana) ")
                .unwrap(),
            !(caption("bird") | caption("dog")) & (!caption("cat") | caption("banana"))
        );
    }

    #[test]
    fn test_unmatched_parentheses() {
        let err =
            parse_query("caption:bird OR caption:dog) AND (-caption:cat OR caption:banana)")
                .unwrap_err();
        assert!(matches!(err, SearchError::UnexpectedParenthesis { index: 3 }));

        let err = parse_query("(caption:bird OR caption:dog) AND (-caption:cat OR caption:banana")
            .unwrap_err();
        assert!(matches!(err, SearchError::ExpectedParenthesis { index: 6 }));

        let err = parse_query("() AND (-caption:cat OR caption:banana").unwrap_err();
        assert!(matches!(err, SearchError::UnexpectedParenthesis { index: 1 }));
    }

    #[test]
    fn test_nothing_to_parse() {
        for input in ["", "   ", "-", "AND", "OR |", "- -"] {
            assert!(
                parse_query(input).unwrap_err().is_no_expression(),
                "expected NoExpression for {input:?}"
            );
        }
    }

    #[test]
    fn test_dangling_operators_are_dropped() {
        assert_eq!(parse_query("caption:dog AND").unwrap(), caption("dog"));
        assert_eq!(parse_query("OR caption:dog").unwrap(), caption("dog"));
        assert_eq!(parse_query("caption:dog -").unwrap(), caption("dog"));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let query = "-(tag:barn OR 1912) caption:\"main street\" | donor:smith";
        assert_eq!(parse_query(query).unwrap(), parse_query(query).unwrap());
    }

    #[test]
    fn test_simple_parse() {
        assert_eq!(
            simple_parse("  (main   \"street\" ").unwrap(),
            Expression::any_text("(main street")
        );
        assert_eq!(
            simple_parse("1912").unwrap(),
            Expression::any_number(1912, "1912")
        );
        assert!(simple_parse(" \"\" ").unwrap_err().is_no_expression());
    }

    #[test]
    fn test_parse_or_fallback() {
        assert_eq!(parse_or_fallback(""), None);
        assert_eq!(parse_or_fallback("caption:dog"), Some(caption("dog")));
        assert_eq!(
            parse_or_fallback("caption:dog)"),
            Some(Expression::any_text("caption:dog)"))
        );
        assert_eq!(
            parse_or_fallback("\"unterminated"),
            Some(Expression::any_text("unterminated"))
        );
        assert_eq!(parse_or_fallback("--caption:dog"), Some(caption("dog")));
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let parens = "(".repeat(5000);
        assert!(matches!(
            parse_query(&parens).unwrap_err(),
            SearchError::TooDeep { index: 64 }
        ));
        assert_eq!(parse_or_fallback(&parens), Some(Expression::any_text(&parens)));

        let negations = format!("{}dog", "-".repeat(5000));
        assert!(matches!(
            parse_query(&negations).unwrap_err(),
            SearchError::TooDeep { .. }
        ));
        assert_eq!(
            parse_or_fallback(&negations),
            Some(Expression::any_text(&negations))
        );
    }

    #[test]
    fn test_nesting_up_to_the_limit_parses() {
        let query = format!("{}caption:dog{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(parse_query(&query).unwrap(), caption("dog"));

        let negated = format!("{}caption:dog", "- ".repeat(MAX_DEPTH));
        assert_eq!(parse_or_fallback(&negated), Some(caption("dog")));
    }

    #[test]
    fn test_long_chains_are_capped() {
        let words = "dog ".repeat(MAX_TERMS + 1);
        assert!(matches!(
            parse_query(&words).unwrap_err(),
            SearchError::TooManyTerms { .. }
        ));
        assert_eq!(
            parse_or_fallback(&words),
            Some(Expression::any_text(words.trim()))
        );

        let pipes = vec!["caption:dog"; 2000].join(" | ");
        assert!(parse_query(&pipes).is_err());
        assert!(parse_or_fallback(&pipes).is_some());
        assert!(parse_collection(&words).is_err());

        let within = vec!["caption:dog"; MAX_TERMS].join(" | ");
        assert!(parse_query(&within).is_ok());
    }

    #[test]
    fn test_parse_collection() {
        let expr = parse_collection("dog").unwrap();
        assert!(expr.is_collection());
        assert_eq!(expr, Expression::collection_word("dog"));

        assert_eq!(
            parse_collection("dog waterloo").unwrap(),
            Expression::collection_word("dog") & Expression::collection_word("waterloo")
        );
        assert_eq!(
            parse_collection("-(year:1912 OR barn)").unwrap(),
            Expression::YearEquals(1912) & Expression::collection_word("barn")
        );
        assert!(parse_collection("( )").unwrap_err().is_no_expression());
    }
}
