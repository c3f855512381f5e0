//! Sage, an embeddable expression language for JSON-like data.
//!
//! Expressions are tokenized and parsed against a [`Grammar`] of operators,
//! functions and transforms, then evaluated against a context [`Value`]:
//!
//! ```
//! use sage_lang::{Engine, Value};
//! use serde_json::json;
//!
//! let engine = Engine::new();
//! let context = Value::from(json!({"items": [{"price": 5}, {"price": 50}]}));
//! let expensive = engine.eval("items[.price > 10]", &context).unwrap();
//! assert_eq!(expensive, Value::from(json!([{"price": 50}])));
//! ```
pub mod ast;
pub mod deferred;
pub mod engine;
pub mod evaluator;
pub mod expression;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{Expr, Token, TokenKind};
pub use deferred::{Deferred, EvalFuture};
pub use engine::{Engine, Error};
pub use evaluator::{EvalError, Evaluator, Frame, Operand};
pub use expression::{Expression, Fragment};
pub use grammar::{
    BinaryEval, BinaryOp, EagerBinaryFn, FunctionFn, Grammar, LazyBinaryFn, TransformFn, UnaryFn,
    function_fn, transform_fn,
};
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, Parser};
pub use value::Value;
