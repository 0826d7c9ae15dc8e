//! Metadata filter expressions.
//!
//! A [`FilterExpr`] is a small boolean AST over document metadata. It can be
//! built directly or parsed from a string such as
//! `genre == 'drama' AND (year >= 2020 OR country IN ['BG', 'NL'])`.
//!
//! Grammar, lowest precedence first:
//!
//! ```text
//! or         := and (("OR" | "||") and)*
//! and        := unary (("AND" | "&&") unary)*
//! unary      := ("NOT" | "!") unary | primary
//! primary    := "(" or ")" | comparison
//! comparison := key ("==" | "=" | "!=" | ">" | ">=" | "<" | "<=") literal
//!             | key ("IN" | "NIN" | "NOT IN") "[" literal ("," literal)* "]"
//! literal    := 'string' | "string" | number | true | false
//! ```
//!
//! Keywords are case-insensitive. String literals accept JSON escapes
//! (`\n`, `\t`, `\uXXXX`, ...), so a [`Display`](fmt::Display)ed filter parses back
//! to the same expression. Nesting deeper than 128 levels is rejected.

use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use crate::{RagError, Result};

/// A parsed metadata filter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// `key == value`
    Eq {
        /// Metadata key.
        key: String,
        /// Literal to compare against.
        value: Value,
    },
    /// `key != value`
    Ne {
        /// Metadata key.
        key: String,
        /// Literal to compare against.
        value: Value,
    },
    /// `key > value`
    Gt {
        /// Metadata key.
        key: String,
        /// Literal to compare against.
        value: Value,
    },
    /// `key >= value`
    Gte {
        /// Metadata key.
        key: String,
        /// Literal to compare against.
        value: Value,
    },
    /// `key < value`
    Lt {
        /// Metadata key.
        key: String,
        /// Literal to compare against.
        value: Value,
    },
    /// `key <= value`
    Lte {
        /// Metadata key.
        key: String,
        /// Literal to compare against.
        value: Value,
    },
    /// `key IN [values]`
    In {
        /// Metadata key.
        key: String,
        /// Accepted literals.
        values: Vec<Value>,
    },
    /// `key NIN [values]`
    Nin {
        /// Metadata key.
        key: String,
        /// Rejected literals.
        values: Vec<Value>,
    },
    /// Both operands match.
    And(Box<FilterExpr>, Box<FilterExpr>),
    /// Either operand matches.
    Or(Box<FilterExpr>, Box<FilterExpr>),
    /// The operand does not match.
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    /// Parse a filter string.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use lynx_rag_core::FilterExpr;
    /// use serde_json::json;
    ///
    /// let filter = FilterExpr::parse("year >= 2020 && genre != 'horror'").unwrap();
    /// let metadata = [("year".to_string(), json!(2023)), ("genre".to_string(), json!("drama"))]
    ///     .into_iter()
    ///     .collect();
    /// assert!(filter.matches(&metadata));
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let tokens = tokenize(input)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            input_len: input.len(),
            nesting: 0,
        };
        let (expr, _) = parser.parse_or()?;
        if let Some((offset, token)) = parser.tokens.get(parser.pos) {
            return Err(parse_error(*offset, &format!("unexpected {token:?}")));
        }
        Ok(expr)
    }

    /// `key == value`
    pub fn eq<K: Into<String>, V: Into<Value>>(key: K, value: V) -> Self {
        Self::Eq {
            key: key.into(),
            value: value.into(),
        }
    }

    /// `key != value`
    pub fn ne<K: Into<String>, V: Into<Value>>(key: K, value: V) -> Self {
        Self::Ne {
            key: key.into(),
            value: value.into(),
        }
    }

    /// `key IN [values]`
    pub fn in_list<K, I, V>(key: K, values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In {
            key: key.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Conjunction of `self` and `other`.
    #[must_use]
    pub fn and(self, other: FilterExpr) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    /// Disjunction of `self` and `other`.
    #[must_use]
    pub fn or(self, other: FilterExpr) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Negation of `self`.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Evaluate the filter against document metadata.
    ///
    /// A missing key never satisfies a positive comparison. Ordering
    /// comparisons only apply between two numbers or two strings.
    #[must_use]
    pub fn matches(&self, metadata: &HashMap<String, Value>) -> bool {
        match self {
            Self::Eq { key, value } => metadata.get(key).is_some_and(|v| values_equal(v, value)),
            Self::Ne { key, value } => !metadata.get(key).is_some_and(|v| values_equal(v, value)),
            Self::Gt { key, value } => {
                compare(metadata.get(key), value).is_some_and(Ordering::is_gt)
            }
            Self::Gte { key, value } => {
                compare(metadata.get(key), value).is_some_and(Ordering::is_ge)
            }
            Self::Lt { key, value } => {
                compare(metadata.get(key), value).is_some_and(Ordering::is_lt)
            }
            Self::Lte { key, value } => {
                compare(metadata.get(key), value).is_some_and(Ordering::is_le)
            }
            Self::In { key, values } => metadata
                .get(key)
                .is_some_and(|v| values.iter().any(|c| values_equal(v, c))),
            Self::Nin { key, values } => !metadata
                .get(key)
                .is_some_and(|v| values.iter().any(|c| values_equal(v, c))),
            Self::And(left, right) => left.matches(metadata) && right.matches(metadata),
            Self::Or(left, right) => left.matches(metadata) || right.matches(metadata),
            Self::Not(inner) => !inner.matches(metadata),
        }
    }
}

impl FromStr for FilterExpr {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FilterExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq { key, value } => write!(f, "{key} == {value}"),
            Self::Ne { key, value } => write!(f, "{key} != {value}"),
            Self::Gt { key, value } => write!(f, "{key} > {value}"),
            Self::Gte { key, value } => write!(f, "{key} >= {value}"),
            Self::Lt { key, value } => write!(f, "{key} < {value}"),
            Self::Lte { key, value } => write!(f, "{key} <= {value}"),
            Self::In { key, values } => write!(f, "{key} IN {}", Value::Array(values.clone())),
            Self::Nin { key, values } => write!(f, "{key} NIN {}", Value::Array(values.clone())),
            Self::And(left, right) => write!(f, "({left} AND {right})"),
            Self::Or(left, right) => write!(f, "({left} OR {right})"),
            Self::Not(inner) => write!(f, "NOT ({inner})"),
        }
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
        _ => actual == expected,
    }
}

fn compare(actual: Option<&Value>, expected: &Value) -> Option<Ordering> {
    match (actual?, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Deepest expression tree, and deepest `NOT`/parenthesis nesting, a filter string may produce.
const MAX_FILTER_DEPTH: usize = 128;

fn parse_error(offset: usize, message: &str) -> RagError {
    RagError::invalid_input(format!(
        "invalid filter expression at offset {offset}: {message}"
    ))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Literal(Value),
    Cmp(CmpOp),
    And,
    Or,
    Not,
    In,
    Nin,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(offset, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        let token = match c {
            '(' | ')' | '[' | ']' | ',' => {
                chars.next();
                match c {
                    '(' => Token::LParen,
                    ')' => Token::RParen,
                    '[' => Token::LBracket,
                    ']' => Token::RBracket,
                    _ => Token::Comma,
                }
            }
            '=' | '!' | '>' | '<' => {
                chars.next();
                let followed_by_eq = chars.next_if(|&(_, n)| n == '=').is_some();
                match (c, followed_by_eq) {
                    ('=', _) => Token::Cmp(CmpOp::Eq),
                    ('!', true) => Token::Cmp(CmpOp::Ne),
                    ('!', false) => Token::Not,
                    ('>', true) => Token::Cmp(CmpOp::Gte),
                    ('>', false) => Token::Cmp(CmpOp::Gt),
                    ('<', true) => Token::Cmp(CmpOp::Lte),
                    _ => Token::Cmp(CmpOp::Lt),
                }
            }
            '&' | '|' => {
                chars.next();
                if chars.next_if(|&(_, n)| n == c).is_none() {
                    return Err(parse_error(offset, &format!("expected '{c}{c}'")));
                }
                if c == '&' { Token::And } else { Token::Or }
            }
            '\'' | '"' => {
                chars.next();
                let mut text = String::new();
                let mut closed = false;
                while let Some((at, ch)) = chars.next() {
                    match ch {
                        '\\' => match chars.next() {
                            Some((_, 'n')) => text.push('\n'),
                            Some((_, 't')) => text.push('\t'),
                            Some((_, 'r')) => text.push('\r'),
                            Some((_, 'b')) => text.push('\u{8}'),
                            Some((_, 'f')) => text.push('\u{c}'),
                            Some((_, 'u')) => text.push(unicode_escape(at, &mut chars)?),
                            Some((_, escaped)) => text.push(escaped),
                            None => {}
                        },
                        ch if ch == c => {
                            closed = true;
                            break;
                        }
                        ch => text.push(ch),
                    }
                }
                if !closed {
                    return Err(parse_error(offset, "unterminated string literal"));
                }
                Token::Literal(Value::String(text))
            }
            c if c.is_ascii_digit() || c == '-' => {
                let mut text = String::new();
                while let Some(&(_, ch)) = chars.peek() {
                    let sign_in_exponent = (ch == '-' || ch == '+') && text.ends_with(['e', 'E']);
                    let leading_minus = ch == '-' && text.is_empty();
                    if ch.is_ascii_digit()
                        || ch == '.'
                        || ch == 'e'
                        || ch == 'E'
                        || sign_in_exponent
                        || leading_minus
                    {
                        text.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                Token::Literal(parse_number(offset, &text)?)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut word = String::new();
                while let Some((_, ch)) =
                    chars.next_if(|&(_, ch)| ch.is_alphanumeric() || ch == '_' || ch == '.')
                {
                    word.push(ch);
                }
                match word.to_ascii_uppercase().as_str() {
                    "AND" => Token::And,
                    "OR" => Token::Or,
                    "NOT" => Token::Not,
                    "IN" => Token::In,
                    "NIN" => Token::Nin,
                    "TRUE" => Token::Literal(Value::Bool(true)),
                    "FALSE" => Token::Literal(Value::Bool(false)),
                    _ => Token::Ident(word),
                }
            }
            other => return Err(parse_error(offset, &format!("unexpected character '{other}'"))),
        };

        tokens.push((offset, token));
    }

    Ok(tokens)
}

fn hex4(offset: usize, chars: &mut Peekable<CharIndices<'_>>) -> Result<u32> {
    let mut code = 0;
    for _ in 0..4 {
        let digit = chars
            .next()
            .and_then(|(_, ch)| ch.to_digit(16))
            .ok_or_else(|| parse_error(offset, "invalid \\u escape"))?;
        code = code * 16 + digit;
    }
    Ok(code)
}

/// Decode the `XXXX` of a `\uXXXX` escape, joining a surrogate pair written as two escapes.
fn unicode_escape(offset: usize, chars: &mut Peekable<CharIndices<'_>>) -> Result<char> {
    let high = hex4(offset, chars)?;
    let code = if (0xD800..0xDC00).contains(&high) {
        if chars.next_if(|&(_, ch)| ch == '\\').is_none()
            || chars.next_if(|&(_, ch)| ch == 'u').is_none()
        {
            return Err(parse_error(offset, "unpaired surrogate in \\u escape"));
        }
        let low = hex4(offset, chars)?;
        if !(0xDC00..0xE000).contains(&low) {
            return Err(parse_error(offset, "unpaired surrogate in \\u escape"));
        }
        0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
    } else {
        high
    };
    char::from_u32(code).ok_or_else(|| parse_error(offset, "invalid \\u escape"))
}

fn parse_number(offset: usize, text: &str) -> Result<Value> {
    if let Ok(int) = text.parse::<i64>() {
        return Ok(Value::from(int));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| parse_error(offset, &format!("invalid number '{text}'")))
}

fn combined_depth(offset: usize, left: usize, right: usize) -> Result<usize> {
    let depth = left.max(right) + 1;
    if depth > MAX_FILTER_DEPTH {
        return Err(parse_error(offset, "filter nested too deeply"));
    }
    Ok(depth)
}

/// Parsed sub-expression and the depth of its tree.
type Parsed = (FilterExpr, usize);

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    input_len: usize,
    nesting: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, t)| t)
    }

    fn offset(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map_or(self.input_len, |(offset, _)| *offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(_, t)| t.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(parse_error(self.offset(), &format!("expected {what}")))
        }
    }

    fn parse_or(&mut self) -> Result<Parsed> {
        let (mut left, mut depth) = self.parse_and()?;
        while self.eat(&Token::Or) {
            let offset = self.offset();
            let (right, right_depth) = self.parse_and()?;
            depth = combined_depth(offset, depth, right_depth)?;
            left = left.or(right);
        }
        Ok((left, depth))
    }

    fn parse_and(&mut self) -> Result<Parsed> {
        let (mut left, mut depth) = self.parse_unary()?;
        while self.eat(&Token::And) {
            let offset = self.offset();
            let (right, right_depth) = self.parse_unary()?;
            depth = combined_depth(offset, depth, right_depth)?;
            left = left.and(right);
        }
        Ok((left, depth))
    }

    /// Run `parse` one nesting level deeper, refusing to recurse past the limit.
    fn nested(&mut self, parse: fn(&mut Self) -> Result<Parsed>) -> Result<Parsed> {
        if self.nesting >= MAX_FILTER_DEPTH {
            return Err(parse_error(self.offset(), "filter nested too deeply"));
        }
        self.nesting += 1;
        let parsed = parse(self);
        self.nesting -= 1;
        parsed
    }

    fn parse_unary(&mut self) -> Result<Parsed> {
        if self.eat(&Token::Not) {
            let offset = self.offset();
            let (inner, depth) = self.nested(Self::parse_unary)?;
            let depth = combined_depth(offset, depth, 0)?;
            return Ok((inner.negate(), depth));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Parsed> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::LParen) => {
                let inner = self.nested(Self::parse_or)?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident(key)) => Ok((self.parse_comparison(key)?, 1)),
            Some(other) => Err(parse_error(offset, &format!("expected a key, found {other:?}"))),
            None => Err(parse_error(offset, "unexpected end of input")),
        }
    }

    fn parse_comparison(&mut self, key: String) -> Result<FilterExpr> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Cmp(op)) => {
                let value = self.parse_literal()?;
                Ok(match op {
                    CmpOp::Eq => FilterExpr::Eq { key, value },
                    CmpOp::Ne => FilterExpr::Ne { key, value },
                    CmpOp::Gt => FilterExpr::Gt { key, value },
                    CmpOp::Gte => FilterExpr::Gte { key, value },
                    CmpOp::Lt => FilterExpr::Lt { key, value },
                    CmpOp::Lte => FilterExpr::Lte { key, value },
                })
            }
            Some(Token::In) => Ok(FilterExpr::In {
                key,
                values: self.parse_list()?,
            }),
            Some(Token::Nin) => Ok(FilterExpr::Nin {
                key,
                values: self.parse_list()?,
            }),
            Some(Token::Not) => {
                self.expect(&Token::In, "IN after NOT")?;
                Ok(FilterExpr::Nin {
                    key,
                    values: self.parse_list()?,
                })
            }
            _ => Err(parse_error(offset, &format!("expected an operator after '{key}'"))),
        }
    }

    fn parse_list(&mut self) -> Result<Vec<Value>> {
        self.expect(&Token::LBracket, "'['")?;
        let mut values = Vec::new();
        if self.eat(&Token::RBracket) {
            return Ok(values);
        }
        loop {
            values.push(self.parse_literal()?);
            if self.eat(&Token::Comma) {
                continue;
            }
            self.expect(&Token::RBracket, "',' or ']'")?;
            return Ok(values);
        }
    }

    fn parse_literal(&mut self) -> Result<Value> {
        let offset = self.offset();
        match self.advance() {
            Some(Token::Literal(value)) => Ok(value),
            Some(other) => Err(parse_error(
                offset,
                &format!("expected a literal, found {other:?}"),
            )),
            None => Err(parse_error(offset, "expected a literal, found end of input")),
        }
    }
}
