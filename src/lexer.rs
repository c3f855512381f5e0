use crate::{
    ast::{Token, TokenKind},
    grammar::Grammar,
    value::Value,
};

/// Errors raised while splitting source text into tokens.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    /// Text that is neither a literal, an identifier, punctuation nor a
    /// registered operator
    #[error("invalid expression token `{token}` at position {position}")]
    InvalidToken { token: String, position: usize },

    #[error("unterminated string starting at position {position}")]
    UnterminatedString { position: usize },

    #[error("invalid escape sequence `\\{escape}` at position {position}")]
    InvalidEscape { escape: char, position: usize },

    #[error("invalid number `{text}` at position {position}")]
    InvalidNumber { text: String, position: usize },
}

/// Splits source text into tokens.
///
/// Operator symbols are recognised against the grammar the lexer was built
/// with, longest match first, so custom operators such as `_=` or `***` need
/// no lexer changes.
pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    position: usize,
    offset: usize,
    grammar: &'a Grammar,
    /// Whether the next operator sits in operand (prefix) position
    expect_operand: bool,
    after_dot: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, grammar: &'a Grammar) -> Self {
        Lexer {
            source,
            chars: source.char_indices().collect(),
            position: 0,
            offset: 0,
            grammar,
            expect_operand: true,
            after_dot: false,
        }
    }

    /// Shifts reported positions, for sources that are part of a larger text.
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Tokenizes the whole source, ending with [`TokenKind::Eof`].
    pub fn tokenize(self) -> Result<Vec<Token>, LexError> {
        let end = self.offset + self.chars.len();
        let mut tokens = Vec::new();
        self.tokenize_into(&mut tokens)?;
        tokens.push(Token::new(TokenKind::Eof, "", end));
        Ok(tokens)
    }

    /// Appends the tokens of this source to `tokens`, without an EOF token.
    ///
    /// Whether a leading operator is prefix or infix is decided from the last
    /// token already in `tokens`.
    pub fn tokenize_into(mut self, tokens: &mut Vec<Token>) -> Result<(), LexError> {
        if let Some(last) = tokens.last() {
            self.expect_operand = last.kind.expects_operand();
            self.after_dot = last.kind == TokenKind::Dot;
        }
        loop {
            let token = self.next_token()?;
            if token.kind == TokenKind::Eof {
                return Ok(());
            }
            tokens.push(token);
        }
    }

    fn current_char(&self) -> Option<char> {
        self.chars.get(self.position).map(|(_, c)| *c)
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).map(|(_, c)| *c)
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn rest(&self) -> &'a str {
        match self.chars.get(self.position) {
            Some((byte, _)) => &self.source[*byte..],
            None => "",
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if is_identifier_char(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.offset + self.position;
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some('"') => result.push('"'),
                        Some('\'') => result.push('\''),
                        Some('\\') => result.push('\\'),
                        Some(escape) => {
                            return Err(LexError::InvalidEscape {
                                escape,
                                position: self.offset + self.position,
                            });
                        }
                        None => return Err(LexError::UnterminatedString { position: start }),
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(LexError::UnterminatedString { position: start })
    }

    fn read_number(&mut self) -> Result<Value, LexError> {
        let start = self.offset + self.position;
        let mut number = String::new();
        let mut is_float = false;

        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                number.push(ch);
                self.advance();
            } else if ch == '.'
                && !is_float
                && self.peek_char(1).is_some_and(|c| c.is_ascii_digit())
            {
                is_float = true;
                number.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let invalid = || LexError::InvalidNumber {
            text: number.clone(),
            position: start,
        };
        if is_float {
            number.parse::<f64>().map(Value::Float).map_err(|_| invalid())
        } else {
            // Integers too large for i64 are kept as floats
            match number.parse::<i64>() {
                Ok(n) => Ok(Value::Integer(n)),
                Err(_) => number.parse::<f64>().map(Value::Float).map_err(|_| invalid()),
            }
        }
    }

    /// Reads the next token, [`TokenKind::Eof`] once the source is exhausted.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();

        let start = self.position;
        let position = self.offset + start;
        let after_dot = std::mem::replace(&mut self.after_dot, false);

        let Some(ch) = self.current_char() else {
            return Ok(Token::new(TokenKind::Eof, "", position));
        };

        let kind = if let Some(symbol) = self.grammar.match_symbol(self.rest()) {
            self.position += symbol.chars().count();
            self.operator(symbol.to_string())
        } else {
            match ch {
                '"' | '\'' => TokenKind::Literal(Value::String(self.read_string(ch)?)),
                c if c.is_ascii_digit() => TokenKind::Literal(self.read_number()?),
                c if is_identifier_start(c) => {
                    let word = self.read_identifier();
                    if after_dot {
                        TokenKind::Identifier(word)
                    } else {
                        match word.as_str() {
                            "true" => TokenKind::Literal(Value::Boolean(true)),
                            "false" => TokenKind::Literal(Value::Boolean(false)),
                            "null" => TokenKind::Literal(Value::Null),
                            _ if self.grammar.is_word_operator(&word) => self.operator(word),
                            _ => TokenKind::Identifier(word),
                        }
                    }
                }
                _ => {
                    self.advance();
                    match ch {
                        '(' => TokenKind::OpenParen,
                        ')' => TokenKind::CloseParen,
                        '[' => TokenKind::OpenBracket,
                        ']' => TokenKind::CloseBracket,
                        '{' => TokenKind::OpenBrace,
                        '}' => TokenKind::CloseBrace,
                        ',' => TokenKind::Comma,
                        ':' => TokenKind::Colon,
                        '.' => TokenKind::Dot,
                        '|' => TokenKind::Pipe,
                        '?' => TokenKind::Question,
                        _ => {
                            return Err(LexError::InvalidToken {
                                token: ch.to_string(),
                                position,
                            });
                        }
                    }
                }
            }
        };

        let raw: String = self.chars[start..self.position].iter().map(|(_, c)| c).collect();
        self.expect_operand = kind.expects_operand();
        self.after_dot = kind == TokenKind::Dot;
        Ok(Token::new(kind, raw, position))
    }

    fn operator(&self, symbol: String) -> TokenKind {
        if self.expect_operand {
            TokenKind::UnaryOp(symbol)
        } else {
            TokenKind::BinaryOp(symbol)
        }
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}
