use std::{collections::HashMap, error::Error, sync::Arc};

use futures::FutureExt;

use crate::{
    ast::Expr,
    deferred::EvalFuture,
    grammar::{BinaryEval, Grammar},
    value::Value,
};

/// The element a filter predicate is currently being tested against.
///
/// Relative identifiers (`.name`) read from the innermost frame.
pub type Frame = Option<Arc<Value>>;

/// Errors that can occur during expression evaluation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
    /// Type mismatch or invalid operation for the given type
    #[error("type error: {0}")]
    TypeError(String),

    /// Division or remainder by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Call to a function that is not in the grammar
    #[error("function `{0}` is not defined")]
    UnknownFunction(String),

    /// Pipe into a transform that is not in the grammar
    #[error("transform `{0}` is not defined")]
    UnknownTransform(String),

    /// Operator removed from the grammar after the expression was compiled
    #[error("operator `{0}` is not defined")]
    UnknownOperator(String),

    /// Failure raised by a registered operator, function or transform,
    /// carried unchanged
    #[error("{0}")]
    Callback(Arc<dyn Error + Send + Sync>),

    /// A callable suspended during synchronous evaluation
    #[error("evaluation is waiting on an asynchronous result; use the async entry point")]
    WouldBlock,
}

impl EvalError {
    /// Wraps a failure raised inside a registered callable.
    pub fn callback(error: impl Into<Box<dyn Error + Send + Sync>>) -> Self {
        EvalError::Callback(Arc::from(error.into()))
    }
}

/// Walks a syntax tree against a context.
///
/// Every node evaluates to a future. [`Evaluator::eval`] hands that future to
/// the caller; [`Evaluator::eval_sync`] polls it exactly once and fails with
/// [`EvalError::WouldBlock`] if some registered callable is still pending.
///
/// # Examples
///
/// ```
/// use sage_lang::{Evaluator, Expr, Grammar, Value};
///
/// let grammar = Grammar::default();
/// let context = Value::Integer(42);
/// let expr = Expr::Literal(Value::from("hi"));
///
/// let result = Evaluator::new(&grammar, &context).eval_sync(&expr).unwrap();
/// assert_eq!(result, Value::from("hi"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    grammar: &'a Grammar,
    context: &'a Value,
}

impl<'a> Evaluator<'a> {
    pub fn new(grammar: &'a Grammar, context: &'a Value) -> Self {
        Evaluator { grammar, context }
    }

    /// Evaluates `expr`, suspending wherever a registered callable does.
    pub fn eval(self, expr: &'a Expr) -> EvalFuture<'a> {
        self.eval_in(expr, None)
    }

    /// Evaluates `expr` without waiting.
    pub fn eval_sync(self, expr: &'a Expr) -> Result<Value, EvalError> {
        self.eval(expr)
            .now_or_never()
            .unwrap_or(Err(EvalError::WouldBlock))
    }

    fn eval_in(self, expr: &'a Expr, frame: Frame) -> EvalFuture<'a> {
        self.eval_node(expr, frame).boxed()
    }

    async fn eval_node(self, expr: &'a Expr, frame: Frame) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Identifier(name) => Ok(self.context.property(name)),
            Expr::RelativeIdentifier(name) => {
                Ok(frame.map_or(Value::Null, |element| element.property(name)))
            }
            Expr::Member {
                object, property, ..
            } => Ok(self.eval_in(object, frame).await?.property(property)),
            Expr::Filter {
                subject,
                predicate,
                relative,
            } => {
                let subject = self.eval_in(subject, frame.clone()).await?;
                if *relative {
                    self.filter_relative(subject, predicate).await
                } else {
                    self.filter_static(subject, predicate, frame).await
                }
            }
            Expr::Array(items) => Ok(Value::Array(self.eval_all(items, &frame).await?)),
            Expr::Object(entries) => {
                let mut map = HashMap::with_capacity(entries.len());
                for (key, expr) in entries {
                    let value = self.eval_in(expr, frame.clone()).await?;
                    map.insert(key.clone(), value);
                }
                Ok(Value::Object(map))
            }
            Expr::UnaryOp { op, operand } => {
                let f = self
                    .grammar
                    .unary_op(op)
                    .ok_or_else(|| EvalError::UnknownOperator(op.clone()))?;
                let value = self.eval_in(operand, frame).await?;
                f(value).resolve().await
            }
            Expr::BinaryOp { op, left, right } => {
                let binary = self
                    .grammar
                    .binary_op(op)
                    .ok_or_else(|| EvalError::UnknownOperator(op.clone()))?;
                match &binary.eval {
                    BinaryEval::Eager(f) => {
                        let l = self.eval_in(left, frame.clone()).await?;
                        let r = self.eval_in(right, frame).await?;
                        f(l, r).resolve().await
                    }
                    BinaryEval::Lazy(f) => {
                        let l = Operand::new(self, left, frame.clone());
                        let r = Operand::new(self, right, frame);
                        f(l, r).resolve().await
                    }
                }
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let test_value = self.eval_in(test, frame.clone()).await?;
                match consequent {
                    Some(consequent) if test_value.is_truthy() => {
                        self.eval_in(consequent, frame).await
                    }
                    None if test_value.is_truthy() => Ok(test_value),
                    _ => self.eval_in(alternate, frame).await,
                }
            }
            Expr::FunctionCall { name, args } => {
                let function = self
                    .grammar
                    .function(name)
                    .ok_or_else(|| EvalError::UnknownFunction(name.clone()))?;
                let args = self.eval_all(args, &frame).await?;
                tracing::trace!(function = %name, args = args.len(), "calling function");
                function(args).resolve().await
            }
            Expr::Transform {
                name,
                subject,
                args,
            } => {
                let transform = self
                    .grammar
                    .transform(name)
                    .ok_or_else(|| EvalError::UnknownTransform(name.clone()))?;
                let subject = self.eval_in(subject, frame.clone()).await?;
                let args = self.eval_all(args, &frame).await?;
                tracing::trace!(transform = %name, args = args.len(), "applying transform");
                transform(subject, args).resolve().await
            }
        }
    }

    /// Evaluates expressions one after another, left to right.
    async fn eval_all(self, exprs: &'a [Expr], frame: &Frame) -> Result<Vec<Value>, EvalError> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            values.push(self.eval_in(expr, frame.clone()).await?);
        }
        Ok(values)
    }

    /// Keeps the elements of `subject` for which `predicate` is truthy.
    ///
    /// A non-array subject is filtered as a one-element collection, `null`
    /// as an empty one.
    async fn filter_relative(self, subject: Value, predicate: &'a Expr) -> Result<Value, EvalError> {
        let items = match subject {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        };

        let mut kept = Vec::new();
        for item in items {
            let element = Arc::new(item);
            let keep = self.eval_in(predicate, Some(Arc::clone(&element))).await?;
            if keep.is_truthy() {
                kept.push(Arc::unwrap_or_clone(element));
            }
        }
        Ok(Value::Array(kept))
    }

    /// Evaluates a predicate that does not mention the element once.
    ///
    /// A boolean keeps (`true`) or drops (`false`) the whole subject; any
    /// other value is used as an index into it.
    async fn filter_static(
        self,
        subject: Value,
        predicate: &'a Expr,
        frame: Frame,
    ) -> Result<Value, EvalError> {
        let key = self.eval_in(predicate, frame).await?;
        Ok(match key {
            Value::Boolean(true) => subject,
            Value::Boolean(false) => Value::Null,
            key => subject.index(&key),
        })
    }
}

/// An operand handed to a lazily evaluated binary operator.
///
/// Nothing is evaluated until [`Operand::eval`] is called, and each call
/// evaluates the operand again.
#[derive(Debug, Clone)]
pub struct Operand<'a> {
    evaluator: Evaluator<'a>,
    expr: &'a Expr,
    frame: Frame,
}

impl<'a> Operand<'a> {
    fn new(evaluator: Evaluator<'a>, expr: &'a Expr, frame: Frame) -> Self {
        Operand {
            evaluator,
            expr,
            frame,
        }
    }

    pub fn eval(&self) -> EvalFuture<'a> {
        self.evaluator.eval_in(self.expr, self.frame.clone())
    }

    /// The unevaluated operand.
    pub fn expr(&self) -> &'a Expr {
        self.expr
    }
}
