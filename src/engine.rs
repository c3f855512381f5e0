use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::{
    evaluator::{EvalError, Evaluator},
    expression::{Expression, Fragment, compile_fragments},
    grammar::{FunctionFn, Grammar, TransformFn},
    lexer::LexError,
    parser::ParseError,
    value::Value,
};

/// Any failure while compiling or evaluating an expression.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// A grammar shared between an engine and the expressions it created.
///
/// Readers take a snapshot, writers edit a copy and swap it in, so an
/// evaluation in flight keeps the grammar it started with.
#[derive(Debug, Clone)]
pub(crate) struct SharedGrammar(Arc<GrammarCell>);

#[derive(Debug)]
struct GrammarCell {
    current: RwLock<Arc<Grammar>>,
    /// Held for the whole of an update so concurrent writers do not lose
    /// each other's changes
    writer: Mutex<()>,
}

impl SharedGrammar {
    pub(crate) fn new(grammar: Grammar) -> Self {
        SharedGrammar(Arc::new(GrammarCell {
            current: RwLock::new(Arc::new(grammar)),
            writer: Mutex::new(()),
        }))
    }

    pub(crate) fn snapshot(&self) -> Arc<Grammar> {
        Arc::clone(&self.0.current.read())
    }

    /// Runs `f` on a copy of the grammar with no read lock held, then
    /// publishes the copy.
    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut Grammar) -> R) -> R {
        let _writer = self.0.writer.lock();
        let mut grammar = Grammar::clone(&self.snapshot());
        let result = f(&mut grammar);
        *self.0.current.write() = Arc::new(grammar);
        result
    }
}

impl Default for SharedGrammar {
    fn default() -> Self {
        SharedGrammar::new(Grammar::default())
    }
}

/// Compiles and evaluates expressions against one configurable grammar.
///
/// Clones share the grammar: a registration through any clone is seen by
/// all of them and by every [`Expression`] they created.
///
/// # Examples
///
/// ```
/// use sage_lang::{Engine, Value};
/// use serde_json::json;
///
/// let engine = Engine::new();
/// engine.configure(|grammar| {
///     grammar.add_transform("upper", |subject, _args| {
///         Value::from(subject.as_string().to_uppercase())
///     });
/// });
///
/// let context = Value::from(json!({"user": {"name": "ada", "age": 36}}));
/// let result = engine.eval(r#"user.age > 18 ? user.name|upper : "minor""#, &context).unwrap();
/// assert_eq!(result, Value::from("ADA"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Engine {
    grammar: SharedGrammar,
}

impl Engine {
    /// An engine with the default operators.
    pub fn new() -> Self {
        Engine::default()
    }

    pub fn with_grammar(grammar: Grammar) -> Self {
        Engine {
            grammar: SharedGrammar::new(grammar),
        }
    }

    /// Changes the grammar; later compilations and evaluations see the
    /// change.
    ///
    /// The closure may read from and evaluate with this engine, which still
    /// sees the grammar as it was before the call. Calling `configure` on
    /// the same engine from inside the closure deadlocks.
    pub fn configure<R>(&self, f: impl FnOnce(&mut Grammar) -> R) -> R {
        self.grammar.update(f)
    }

    /// The grammar as it is now.
    pub fn grammar(&self) -> Arc<Grammar> {
        self.grammar.snapshot()
    }

    pub fn function(&self, name: &str) -> Option<FunctionFn> {
        self.grammar.snapshot().function(name).cloned()
    }

    pub fn transform(&self, name: &str) -> Option<TransformFn> {
        self.grammar.snapshot().transform(name).cloned()
    }

    /// An expression that compiles on first use.
    pub fn create_expression(&self, source: impl Into<String>) -> Expression {
        Expression::new(vec![Fragment::Source(source.into())], self.grammar.clone())
    }

    /// An expression compiled now, so syntax errors surface here.
    pub fn compile(&self, source: impl Into<String>) -> Result<Expression, Error> {
        let expression = self.create_expression(source);
        expression.compile()?;
        Ok(expression)
    }

    /// Builds an expression from source pieces and spliced values.
    ///
    /// ```
    /// use sage_lang::{Engine, Fragment, Value};
    ///
    /// let engine = Engine::new();
    /// let untrusted = Value::from("x\" || true || \"");
    /// let expression = engine
    ///     .template([Fragment::from("name == "), Fragment::from(untrusted)])
    ///     .unwrap();
    /// let context = Value::from(serde_json::json!({"name": "bob"}));
    /// assert_eq!(expression.eval(&context).unwrap(), Value::Boolean(false));
    /// ```
    pub fn template<I>(&self, fragments: I) -> Result<Expression, Error>
    where
        I: IntoIterator,
        I::Item: Into<Fragment>,
    {
        let fragments: Vec<Fragment> = fragments.into_iter().map(Into::into).collect();
        let expression = Expression::new(fragments, self.grammar.clone());
        expression.compile()?;
        Ok(expression)
    }

    /// Compiles and evaluates `source` without waiting.
    pub fn eval(&self, source: &str, context: &Value) -> Result<Value, Error> {
        let grammar = self.grammar.snapshot();
        let ast = compile_fragments(&[Fragment::from(source)], &grammar)?;
        Ok(Evaluator::new(&grammar, context).eval_sync(&ast)?)
    }

    pub async fn eval_async(&self, source: &str, context: &Value) -> Result<Value, Error> {
        let grammar = self.grammar.snapshot();
        let ast = compile_fragments(&[Fragment::from(source)], &grammar)?;
        Ok(Evaluator::new(&grammar, context).eval(&ast).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_grammar() {
        let engine = Engine::new();
        let other = engine.clone();
        other.configure(|g| g.add_function("one", |_| Value::Integer(1)));
        assert!(engine.function("one").is_some());
    }

    #[test]
    fn test_configure_can_use_the_engine() {
        let engine = Engine::new();
        engine.configure(|g| g.add_function("one", |_| Value::Integer(1)));

        let seen = engine.configure(|g| {
            g.add_function("two", |_| Value::Integer(2));
            let one = engine.function("one").is_some();
            let two = engine.function("two").is_some();
            let sum = engine.eval("one() + 1", &Value::Null).ok();
            (one, two, sum)
        });

        assert_eq!(seen, (true, false, Some(Value::Integer(2))));
        assert!(engine.function("two").is_some());
    }

    #[test]
    fn test_concurrent_configures_keep_every_registration() {
        let engine = Engine::new();
        std::thread::scope(|scope| {
            for i in 0..8 {
                let engine = engine.clone();
                scope.spawn(move || {
                    engine.configure(|g| g.add_function(format!("f{i}"), |_| Value::Null));
                });
            }
        });
        assert_eq!(engine.grammar().function_names().len(), 8);
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_writes() {
        let engine = Engine::new();
        let before = engine.grammar();
        engine.configure(|g| g.remove_op("+"));
        assert!(before.binary_op("+").is_some());
        assert!(engine.grammar().binary_op("+").is_none());
    }
}
