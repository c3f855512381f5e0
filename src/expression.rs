use std::sync::OnceLock;

use crate::{
    ast::{Expr, Token, TokenKind},
    engine::{Error, SharedGrammar},
    evaluator::Evaluator,
    grammar::Grammar,
    lexer::Lexer,
    parser::Parser,
    value::Value,
};

/// A piece of a templated expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Expression source text
    Source(String),
    /// A value spliced in as a single literal; it is never re-read as source
    Value(Value),
}

impl From<&str> for Fragment {
    fn from(source: &str) -> Self {
        Fragment::Source(source.to_string())
    }
}

impl From<String> for Fragment {
    fn from(source: String) -> Self {
        Fragment::Source(source)
    }
}

impl From<Value> for Fragment {
    fn from(value: Value) -> Self {
        Fragment::Value(value)
    }
}

/// An expression bound to an engine's grammar.
///
/// Compilation happens on first use and is kept; evaluation always uses the
/// grammar as it is when evaluation starts, so operators, functions and
/// transforms registered after compiling are still found.
#[derive(Debug)]
pub struct Expression {
    fragments: Vec<Fragment>,
    grammar: SharedGrammar,
    ast: OnceLock<Expr>,
}

impl Expression {
    pub(crate) fn new(fragments: Vec<Fragment>, grammar: SharedGrammar) -> Self {
        Expression {
            fragments,
            grammar,
            ast: OnceLock::new(),
        }
    }

    /// The expression text, with spliced values written as JSON.
    pub fn source(&self) -> String {
        self.fragments
            .iter()
            .map(|fragment| match fragment {
                Fragment::Source(text) => text.clone(),
                Fragment::Value(value) => serde_json::Value::from(value.clone()).to_string(),
            })
            .collect()
    }

    /// Tokenizes and parses the expression, once.
    pub fn compile(&self) -> Result<&Expr, Error> {
        if let Some(ast) = self.ast.get() {
            return Ok(ast);
        }
        tracing::debug!(source = %self.source(), "compiling expression");
        let grammar = self.grammar.snapshot();
        let ast = compile_fragments(&self.fragments, &grammar)?;
        Ok(self.ast.get_or_init(|| ast))
    }

    /// Evaluates against `context` without waiting.
    ///
    /// Fails with [`EvalError::WouldBlock`](crate::EvalError::WouldBlock) if
    /// a registered callable suspends; use [`Expression::eval_async`] then.
    pub fn eval(&self, context: &Value) -> Result<Value, Error> {
        let ast = self.compile()?;
        let grammar = self.grammar.snapshot();
        Ok(Evaluator::new(&grammar, context).eval_sync(ast)?)
    }

    pub async fn eval_async(&self, context: &Value) -> Result<Value, Error> {
        let ast = self.compile()?;
        let grammar = self.grammar.snapshot();
        Ok(Evaluator::new(&grammar, context).eval(ast).await?)
    }
}

#[tracing::instrument(level = "debug", skip_all, fields(fragments = fragments.len()))]
pub(crate) fn compile_fragments(fragments: &[Fragment], grammar: &Grammar) -> Result<Expr, Error> {
    let mut tokens = Vec::new();
    let mut offset = 0;
    for fragment in fragments {
        match fragment {
            Fragment::Source(text) => {
                Lexer::new(text, grammar)
                    .with_offset(offset)
                    .tokenize_into(&mut tokens)?;
                offset += text.chars().count();
            }
            Fragment::Value(value) => {
                tokens.push(Token::new(TokenKind::Literal(value.clone()), "", offset));
            }
        }
    }
    tokens.push(Token::new(TokenKind::Eof, "", offset));
    tracing::debug!(tokens = tokens.len(), "tokenized expression");

    Ok(Parser::new(tokens, grammar).parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_renders_spliced_values() {
        let expression = Expression::new(
            vec!["name == ".into(), Value::from("x\"y").into()],
            SharedGrammar::default(),
        );
        assert_eq!(expression.source(), r#"name == "x\"y""#);
    }

    #[test]
    fn test_spliced_value_is_not_tokenized() {
        let grammar = Grammar::default();
        let fragments = vec![Fragment::Value(Value::from("1 + 1")), "+ 1".into()];
        let ast = compile_fragments(&fragments, &grammar).unwrap();
        assert_eq!(
            ast,
            Expr::BinaryOp {
                op: "+".into(),
                left: Box::new(Expr::Literal(Value::from("1 + 1"))),
                right: Box::new(Expr::Literal(Value::Integer(1))),
            }
        );
    }
}
