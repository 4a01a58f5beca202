//! Query tokenizer.
//!
//! Splits raw query text into a flat list of [`Token`]s. Grouping,
//! precedence and bare-word expansion are left to the parser.
//!
//! # Token rules
//!
//! - whitespace separates tokens and is otherwise ignored
//! - `(`, `)` and `|` are tokens on their own, even without surrounding spaces
//! - `-` at the start of a token negates the following term or group
//! - `AND` / `OR` (exact case, unquoted) are operators
//! - `field:value` with a known field is a typed token; an unknown field or a
//!   value the field cannot take (`year:abc`) leaves the token as a word
//! - `"quoted text"` keeps spaces and punctuation together, both as a word
//!   and as a field value (`caption:"main street"`)
//! - an integer word (quoted or not) is a [`Token::Number`]

use std::fmt;

use crate::error::{Result, SearchError};

use super::field::Field;

/// One lexical unit of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// `field:value` for a recognized field.
    Field(Field, String),
    /// An unqualified word.
    Word(String),
    /// An unqualified integer word. `text` is kept verbatim for the string fields.
    Number { value: i32, text: String },
    And,
    Or,
    Not,
    LParen,
    RParen,
    Pipe,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Field(field, value) => write!(f, "{}:{}", field.keyword(), quote_if_needed(value)),
            Token::Word(text) => f.write_str(&quote_if_needed(text)),
            Token::Number { text, .. } => f.write_str(text),
            Token::And => f.write_str("AND"),
            Token::Or => f.write_str("OR"),
            Token::Not => f.write_str("-"),
            Token::LParen => f.write_str("("),
            Token::RParen => f.write_str(")"),
            Token::Pipe => f.write_str("|"),
        }
    }
}

fn quote_if_needed(text: &str) -> String {
    if text.chars().any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '|')) {
        format!("\"{text}\"")
    } else {
        text.to_string()
    }
}

/// Tokenize a query string.
///
/// Fails only on an unterminated quote, reporting the character offset of
/// the opening `"`.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        let ch = chars[pos];
        if ch.is_whitespace() {
            pos += 1;
            continue;
        }
        match ch {
            '(' => tokens.push(Token::LParen),
            ')' => tokens.push(Token::RParen),
            '|' => tokens.push(Token::Pipe),
            '-' => tokens.push(Token::Not),
            _ => {
                let (raw, next) = read_word(&chars, pos)?;
                if let Some(token) = classify(&raw) {
                    tokens.push(token);
                }
                pos = next;
                continue;
            }
        }
        pos += 1;
    }

    Ok(tokens)
}

/// Read one word starting at `start`, honoring quotes.
///
/// Returns the raw text (quotes included) and the offset just past it.
fn read_word(chars: &[char], start: usize) -> Result<(String, usize)> {
    let mut word = String::new();
    let mut pos = start;
    let mut quote_start = None;

    while pos < chars.len() {
        let ch = chars[pos];
        if ch == '"' {
            quote_start = match quote_start {
                Some(_) => None,
                None => Some(pos),
            };
        } else if quote_start.is_none() && (ch.is_whitespace() || matches!(ch, '(' | ')' | '|')) {
            break;
        }
        word.push(ch);
        pos += 1;
    }

    if let Some(offset) = quote_start {
        return Err(SearchError::Syntax { offset });
    }
    Ok((word, pos))
}

/// Turn a raw word into a token. Empty words (`""`) produce nothing.
fn classify(raw: &str) -> Option<Token> {
    match raw {
        "AND" => return Some(Token::And),
        "OR" => return Some(Token::Or),
        _ => {}
    }

    if let Some((name, value)) = raw.split_once(':') {
        if !name.contains('"') {
            if let Some(field) = Field::from_keyword(name) {
                let value = unquote(value);
                if field.leaf(&value).is_some() {
                    return Some(Token::Field(field, value));
                }
            }
        }
    }

    let text = unquote(raw);
    if text.is_empty() {
        return None;
    }
    match text.parse::<i32>() {
        Ok(value) => Some(Token::Number { value, text }),
        Err(_) => Some(Token::Word(text)),
    }
}

fn unquote(raw: &str) -> String {
    raw.chars().filter(|&c| c != '"').collect()
}
