use std::fmt;

use crate::value::Value;

/// A lexical token together with the source text it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What the token is
    pub kind: TokenKind,
    /// The exact source text of the token (empty for spliced values and EOF)
    pub raw: String,
    /// Character offset of the token in the source
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, raw: impl Into<String>, position: usize) -> Self {
        Token {
            kind,
            raw: raw.into(),
            position,
        }
    }

    /// Text used when reporting this token in an error message.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Eof => "end of expression".to_string(),
            TokenKind::Literal(v) if self.raw.is_empty() => v.as_string(),
            _ => self.raw.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Number, string, boolean or null literal
    ///
    /// # Examples
    /// ```text
    /// 42
    /// 3.14
    /// "hello"
    /// 'item #1'
    /// true
    /// ```
    Literal(Value),

    /// Name of a context property, function or transform
    ///
    /// Must start with a letter, `_` or `$`, followed by letters, digits,
    /// `_` or `$`.
    ///
    /// # Examples
    /// ```text
    /// user
    /// item_count
    /// $root
    /// ```
    Identifier(String),

    /// Registered operator symbol in infix position
    ///
    /// # Examples
    /// ```text
    /// 1 + 2
    /// name in names
    /// ```
    BinaryOp(String),

    /// Registered operator symbol in prefix position
    ///
    /// # Examples
    /// ```text
    /// !done
    /// -total
    /// ```
    UnaryOp(String),

    /// Left parenthesis for grouping or function arguments
    OpenParen,

    /// Right parenthesis
    CloseParen,

    /// Left bracket for filters or array literals
    OpenBracket,

    /// Right bracket
    CloseBracket,

    /// Left brace for object literals
    OpenBrace,

    /// Right brace
    CloseBrace,

    /// Comma for separating arguments or elements
    Comma,

    /// Colon for object entries and conditional alternates
    Colon,

    /// Dot for member access or relative identifiers
    Dot,

    /// Transform pipe
    ///
    /// # Examples
    /// ```text
    /// name|upper
    /// price|round(2)
    /// ```
    Pipe,

    /// Conditional operator
    Question,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Whether an operator following this token sits in operand position
    /// (and is therefore a prefix operator).
    pub fn expects_operand(&self) -> bool {
        matches!(
            self,
            TokenKind::BinaryOp(_)
                | TokenKind::UnaryOp(_)
                | TokenKind::OpenParen
                | TokenKind::OpenBracket
                | TokenKind::OpenBrace
                | TokenKind::Comma
                | TokenKind::Colon
                | TokenKind::Question
                | TokenKind::Pipe
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Literal(_) => write!(f, "literal"),
            TokenKind::Identifier(_) => write!(f, "identifier"),
            TokenKind::BinaryOp(_) => write!(f, "binary operator"),
            TokenKind::UnaryOp(_) => write!(f, "unary operator"),
            TokenKind::OpenParen => write!(f, "`(`"),
            TokenKind::CloseParen => write!(f, "`)`"),
            TokenKind::OpenBracket => write!(f, "`[`"),
            TokenKind::CloseBracket => write!(f, "`]`"),
            TokenKind::OpenBrace => write!(f, "`{{`"),
            TokenKind::CloseBrace => write!(f, "`}}`"),
            TokenKind::Comma => write!(f, "`,`"),
            TokenKind::Colon => write!(f, "`:`"),
            TokenKind::Dot => write!(f, "`.`"),
            TokenKind::Pipe => write!(f, "`|`"),
            TokenKind::Question => write!(f, "`?`"),
            TokenKind::Eof => write!(f, "end of expression"),
        }
    }
}
