// tests/lexer_tests.rs

use pretty_assertions::assert_eq;
use sage_lang::{Grammar, LexError, Lexer, TokenKind, Value};

fn kinds(input: &str) -> Vec<TokenKind> {
    kinds_with(input, &Grammar::default())
}

fn kinds_with(input: &str, grammar: &Grammar) -> Vec<TokenKind> {
    Lexer::new(input, grammar)
        .tokenize()
        .unwrap_or_else(|e| panic!("failed to tokenize {input:?}: {e}"))
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

fn ident(name: &str) -> TokenKind {
    TokenKind::Identifier(name.to_string())
}

fn binary(symbol: &str) -> TokenKind {
    TokenKind::BinaryOp(symbol.to_string())
}

fn unary(symbol: &str) -> TokenKind {
    TokenKind::UnaryOp(symbol.to_string())
}

fn int(n: i64) -> TokenKind {
    TokenKind::Literal(Value::Integer(n))
}

fn string(s: &str) -> TokenKind {
    TokenKind::Literal(Value::from(s))
}

// ============================================================================
// Punctuation
// ============================================================================

#[test]
fn test_punctuation() {
    let test_cases = vec![
        ("(", TokenKind::OpenParen),
        (")", TokenKind::CloseParen),
        ("[", TokenKind::OpenBracket),
        ("]", TokenKind::CloseBracket),
        ("{", TokenKind::OpenBrace),
        ("}", TokenKind::CloseBrace),
        (",", TokenKind::Comma),
        (":", TokenKind::Colon),
        (".", TokenKind::Dot),
        ("|", TokenKind::Pipe),
        ("?", TokenKind::Question),
    ];

    for (input, expected) in test_cases {
        assert_eq!(kinds(input), vec![expected, TokenKind::Eof], "input: {input}");
    }
}

#[test]
fn test_whitespace_is_discarded() {
    assert_eq!(kinds("  \t\n a \n "), vec![ident("a"), TokenKind::Eof]);
    assert_eq!(kinds(""), vec![TokenKind::Eof]);
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numbers() {
    assert_eq!(kinds("42"), vec![int(42), TokenKind::Eof]);
    assert_eq!(
        kinds("3.25"),
        vec![TokenKind::Literal(Value::Float(3.25)), TokenKind::Eof]
    );
    assert_eq!(
        kinds("99999999999999999999"),
        vec![TokenKind::Literal(Value::Float(1e20)), TokenKind::Eof]
    );
}

#[test]
fn test_number_followed_by_member_dot() {
    assert_eq!(
        kinds("1.a"),
        vec![int(1), TokenKind::Dot, ident("a"), TokenKind::Eof]
    );
}

#[test]
fn test_strings_with_both_quotes() {
    assert_eq!(kinds(r#""hello""#), vec![string("hello"), TokenKind::Eof]);
    assert_eq!(kinds("'world'"), vec![string("world"), TokenKind::Eof]);
    assert_eq!(kinds(r#"'say "hi"'"#), vec![string(r#"say "hi""#), TokenKind::Eof]);
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        kinds(r#""a\"b\\c\nd\te""#),
        vec![string("a\"b\\c\nd\te"), TokenKind::Eof]
    );
    assert_eq!(kinds(r#"'it\'s'"#), vec![string("it's"), TokenKind::Eof]);
}

#[test]
fn test_keyword_literals() {
    assert_eq!(
        kinds("true false null"),
        vec![
            TokenKind::Literal(Value::Boolean(true)),
            TokenKind::Literal(Value::Boolean(false)),
            TokenKind::Literal(Value::Null),
            TokenKind::Eof,
        ]
    );
}

// ============================================================================
// Identifiers and Operators
// ============================================================================

#[test]
fn test_dotted_path() {
    assert_eq!(
        kinds("user.address.city"),
        vec![
            ident("user"),
            TokenKind::Dot,
            ident("address"),
            TokenKind::Dot,
            ident("city"),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_identifier_characters() {
    assert_eq!(kinds("$root _x a1"), vec![ident("$root"), ident("_x"), ident("a1"), TokenKind::Eof]);
}

#[test]
fn test_multi_char_operators() {
    assert_eq!(
        kinds("a <= b // c != d"),
        vec![
            ident("a"),
            binary("<="),
            ident("b"),
            binary("//"),
            ident("c"),
            binary("!="),
            ident("d"),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_operator_position_decides_unary() {
    assert_eq!(
        kinds("!a && -(b - -1)"),
        vec![
            unary("!"),
            ident("a"),
            binary("&&"),
            unary("-"),
            TokenKind::OpenParen,
            ident("b"),
            binary("-"),
            unary("-"),
            int(1),
            TokenKind::CloseParen,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn test_word_operator() {
    assert_eq!(
        kinds("x in list"),
        vec![ident("x"), binary("in"), ident("list"), TokenKind::Eof]
    );
    // Only whole words
    assert_eq!(kinds("inside"), vec![ident("inside"), TokenKind::Eof]);
}

#[test]
fn test_custom_operators_use_longest_match() {
    let mut grammar = Grammar::default();
    grammar.add_binary_op("**", 0, |_, _| Value::Null);
    grammar.add_binary_op("***", 1000, |_, _| Value::Null);
    grammar.add_binary_op("_=", 20, |_, _| Value::Null);

    assert_eq!(
        kinds_with("2 *** 3 ** 4 * 5", &grammar),
        vec![
            int(2),
            binary("***"),
            int(3),
            binary("**"),
            int(4),
            binary("*"),
            int(5),
            TokenKind::Eof,
        ]
    );
    assert_eq!(
        kinds_with("'a' _= 'b'", &grammar),
        vec![string("a"), binary("_="), string("b"), TokenKind::Eof]
    );
}

#[test]
fn test_removed_operator_is_not_recognised() {
    let mut grammar = Grammar::default();
    grammar.remove_op("+");
    let result = Lexer::new("1+2", &grammar).tokenize();
    assert_eq!(
        result,
        Err(LexError::InvalidToken {
            token: "+".to_string(),
            position: 1
        })
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_invalid_token_names_text_and_position() {
    let grammar = Grammar::default();
    let err = Lexer::new("2 & 2", &grammar).tokenize().unwrap_err();
    assert_eq!(err.to_string(), "invalid expression token `&` at position 2");
}

#[test]
fn test_unterminated_string() {
    let grammar = Grammar::default();
    assert_eq!(
        Lexer::new("a == 'open", &grammar).tokenize(),
        Err(LexError::UnterminatedString { position: 5 })
    );
}

#[test]
fn test_invalid_escape() {
    let grammar = Grammar::default();
    assert!(matches!(
        Lexer::new(r#""\q""#, &grammar).tokenize(),
        Err(LexError::InvalidEscape { escape: 'q', .. })
    ));
}
