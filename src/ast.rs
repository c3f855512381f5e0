//! # Sage Expression Language - Abstract Syntax Tree
//!
//! This module defines the tokens and syntax tree of the Sage expression
//! language, a small language for evaluating filters, conditionals and
//! derived fields against JSON data.
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Expression nodes produced by the parser
//!
//! ## Quick Start
//!
//! ```text
//! users[.age >= 18 && .active].name|upper
//! ```
//!
//! This expression keeps the active adult users, reads the first name and
//! applies the `upper` transform to it.
//!
//! ## Core Concepts
//!
//! ### Identifiers and Member Access
//!
//! Bare names read from the context (`user`), dots walk into objects
//! (`user.address.city`). Missing properties evaluate to `null`.
//!
//! ### Filters
//!
//! Brackets after a value either filter or index it:
//!
//! - **Relative predicates** (`items[.price > 10]`) are evaluated against each
//!   element; a leading dot names a property of that element
//! - **Other predicates** are evaluated once: booleans keep or drop the whole
//!   subject, anything else is used as an index (`items[0]`, `obj["key"]`)
//!
//! ### Operators, Functions and Transforms
//!
//! All operators come from the grammar and carry a precedence. Functions are
//! called as `name(args)`, transforms are piped as `value|name(args)`. Both are
//! looked up by name at evaluation time.
//!
//! ## Examples
//!
//! ```text
//! price * qty > 100 ? "bulk" : "retail"
//! tags[.label == "new"]
//! nickname ?: name
//! "hello"|toCase({case: "upper"})
//! ```
pub mod expressions;
pub mod tokens;

pub use expressions::Expr;
pub use tokens::{Token, TokenKind};
