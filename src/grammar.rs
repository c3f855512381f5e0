//! The grammar registry: operators, functions and transforms by name.
//!
//! The lexer consults it to recognise operator symbols, the parser to read
//! precedences, and the evaluator to find the implementation of every
//! operator, function and transform when a tree is evaluated.

mod builtins;

use std::{collections::HashMap, fmt, sync::Arc};

use regex::Regex;

use crate::{deferred::Deferred, evaluator::Operand, value::Value};

/// Implementation of a prefix operator.
pub type UnaryFn = Arc<dyn Fn(Value) -> Deferred<'static> + Send + Sync>;

/// Implementation of an infix operator receiving evaluated operands.
pub type EagerBinaryFn = Arc<dyn Fn(Value, Value) -> Deferred<'static> + Send + Sync>;

/// Implementation of an infix operator receiving unevaluated operands.
pub type LazyBinaryFn =
    Arc<dyn for<'a> Fn(Operand<'a>, Operand<'a>) -> Deferred<'a> + Send + Sync>;

/// Implementation of a function, called as `name(args...)`.
pub type FunctionFn = Arc<dyn Fn(Vec<Value>) -> Deferred<'static> + Send + Sync>;

/// Implementation of a transform, applied as `subject|name(args...)`.
pub type TransformFn = Arc<dyn Fn(Value, Vec<Value>) -> Deferred<'static> + Send + Sync>;

/// Calling convention of a binary operator.
#[derive(Clone)]
pub enum BinaryEval {
    /// Both operands are evaluated, left first, before the call
    Eager(EagerBinaryFn),
    /// The operator decides which operands to evaluate, and when
    Lazy(LazyBinaryFn),
}

/// A registered binary operator.
#[derive(Clone)]
pub struct BinaryOp {
    /// Binding strength; higher binds tighter
    pub precedence: i32,
    pub eval: BinaryEval,
}

impl BinaryOp {
    pub fn is_lazy(&self) -> bool {
        matches!(self.eval, BinaryEval::Lazy(_))
    }
}

impl fmt::Debug for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryOp")
            .field("precedence", &self.precedence)
            .field("lazy", &self.is_lazy())
            .finish()
    }
}

/// Wraps a closure as a [`FunctionFn`], for batch registration.
pub fn function_fn<F, R>(f: F) -> FunctionFn
where
    F: Fn(Vec<Value>) -> R + Send + Sync + 'static,
    R: Into<Deferred<'static>>,
{
    Arc::new(move |args: Vec<Value>| -> Deferred<'static> { f(args).into() })
}

/// Wraps a closure as a [`TransformFn`], for batch registration.
pub fn transform_fn<F, R>(f: F) -> TransformFn
where
    F: Fn(Value, Vec<Value>) -> R + Send + Sync + 'static,
    R: Into<Deferred<'static>>,
{
    Arc::new(move |subject: Value, args: Vec<Value>| -> Deferred<'static> {
        f(subject, args).into()
    })
}

/// The set of operators, functions and transforms an engine understands.
///
/// Names are unique within each category; registering a name again replaces
/// the previous entry.
///
/// # Examples
///
/// ```
/// use sage_lang::{Grammar, Value};
///
/// let mut grammar = Grammar::default();
/// grammar.add_binary_op("_=", 20, |left, right| {
///     Value::Boolean(left.as_string().to_lowercase() == right.as_string().to_lowercase())
/// });
/// grammar.add_transform("upper", |subject, _args| Value::from(subject.as_string().to_uppercase()));
/// grammar.remove_op("^");
/// assert!(grammar.binary_op("_=").is_some());
/// assert!(grammar.binary_op("^").is_none());
/// ```
#[derive(Clone)]
pub struct Grammar {
    binary_ops: HashMap<String, BinaryOp>,
    unary_ops: HashMap<String, UnaryFn>,
    functions: HashMap<String, FunctionFn>,
    transforms: HashMap<String, TransformFn>,
    /// Non-word operator symbols, longest first
    symbols: Vec<String>,
    /// Matches the longest of `symbols`; `None` when it could not be built
    matcher: Option<Regex>,
}

impl Default for Grammar {
    /// Arithmetic, comparison, logical and membership operators, with no
    /// functions or transforms.
    fn default() -> Self {
        let mut grammar = Grammar::empty();
        builtins::install(&mut grammar);
        grammar
    }
}

impl Grammar {
    /// A grammar with no operators, functions or transforms.
    pub fn empty() -> Self {
        Grammar {
            binary_ops: HashMap::new(),
            unary_ops: HashMap::new(),
            functions: HashMap::new(),
            transforms: HashMap::new(),
            symbols: Vec::new(),
            matcher: None,
        }
    }

    /// Registers a binary operator whose operands are evaluated first.
    pub fn add_binary_op<F, R>(&mut self, symbol: impl Into<String>, precedence: i32, f: F)
    where
        F: Fn(Value, Value) -> R + Send + Sync + 'static,
        R: Into<Deferred<'static>>,
    {
        let eval = BinaryEval::Eager(Arc::new(
            move |left: Value, right: Value| -> Deferred<'static> { f(left, right).into() },
        ));
        self.insert_binary(symbol.into(), BinaryOp { precedence, eval });
    }

    /// Registers a binary operator that receives its operands unevaluated.
    ///
    /// The operator calls [`Operand::eval`] on the operands it needs, so it
    /// can skip the right-hand side entirely.
    pub fn add_lazy_binary_op<F>(&mut self, symbol: impl Into<String>, precedence: i32, f: F)
    where
        F: for<'a> Fn(Operand<'a>, Operand<'a>) -> Deferred<'a> + Send + Sync + 'static,
    {
        let eval = BinaryEval::Lazy(Arc::new(f));
        self.insert_binary(symbol.into(), BinaryOp { precedence, eval });
    }

    /// Registers a prefix operator.
    pub fn add_unary_op<F, R>(&mut self, symbol: impl Into<String>, f: F)
    where
        F: Fn(Value) -> R + Send + Sync + 'static,
        R: Into<Deferred<'static>>,
    {
        let symbol: String = symbol.into();
        tracing::trace!(%symbol, "registering unary operator");
        self.unary_ops.insert(
            symbol,
            Arc::new(move |operand: Value| -> Deferred<'static> { f(operand).into() }),
        );
        self.rebuild_symbols();
    }

    pub fn add_function<F, R>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Vec<Value>) -> R + Send + Sync + 'static,
        R: Into<Deferred<'static>>,
    {
        let name: String = name.into();
        tracing::trace!(%name, "registering function");
        self.functions.insert(name, function_fn(f));
    }

    /// Registers several functions at once, see [`function_fn`].
    pub fn add_functions<I, S>(&mut self, functions: I)
    where
        I: IntoIterator<Item = (S, FunctionFn)>,
        S: Into<String>,
    {
        self.functions
            .extend(functions.into_iter().map(|(name, f)| (name.into(), f)));
    }

    pub fn add_transform<F, R>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Value, Vec<Value>) -> R + Send + Sync + 'static,
        R: Into<Deferred<'static>>,
    {
        let name: String = name.into();
        tracing::trace!(%name, "registering transform");
        self.transforms.insert(name, transform_fn(f));
    }

    /// Registers several transforms at once, see [`transform_fn`].
    pub fn add_transforms<I, S>(&mut self, transforms: I)
    where
        I: IntoIterator<Item = (S, TransformFn)>,
        S: Into<String>,
    {
        self.transforms
            .extend(transforms.into_iter().map(|(name, f)| (name.into(), f)));
    }

    /// Removes an operator symbol from both the unary and binary sets.
    pub fn remove_op(&mut self, symbol: &str) {
        tracing::trace!(%symbol, "removing operator");
        self.binary_ops.remove(symbol);
        self.unary_ops.remove(symbol);
        self.rebuild_symbols();
    }

    pub fn binary_op(&self, symbol: &str) -> Option<&BinaryOp> {
        self.binary_ops.get(symbol)
    }

    pub fn unary_op(&self, symbol: &str) -> Option<&UnaryFn> {
        self.unary_ops.get(symbol)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionFn> {
        self.functions.get(name)
    }

    pub fn transform(&self, name: &str) -> Option<&TransformFn> {
        self.transforms.get(name)
    }

    /// Binary operators sorted by descending precedence, then symbol.
    pub fn binary_ops(&self) -> Vec<(&str, &BinaryOp)> {
        let mut ops: Vec<_> = self
            .binary_ops
            .iter()
            .map(|(symbol, op)| (symbol.as_str(), op))
            .collect();
        ops.sort_by(|a, b| b.1.precedence.cmp(&a.1.precedence).then(a.0.cmp(b.0)));
        ops
    }

    pub fn unary_symbols(&self) -> Vec<&str> {
        sorted_keys(&self.unary_ops)
    }

    pub fn function_names(&self) -> Vec<&str> {
        sorted_keys(&self.functions)
    }

    pub fn transform_names(&self) -> Vec<&str> {
        sorted_keys(&self.transforms)
    }

    /// Whether `word` is an operator spelled like an identifier, such as `in`.
    pub fn is_word_operator(&self, word: &str) -> bool {
        self.binary_ops.contains_key(word) || self.unary_ops.contains_key(word)
    }

    /// The longest registered non-word operator symbol at the start of `input`.
    pub fn match_symbol<'s>(&self, input: &'s str) -> Option<&'s str> {
        match &self.matcher {
            Some(re) => re.find(input).map(|m| m.as_str()),
            None => self
                .symbols
                .iter()
                .find(|symbol| input.starts_with(symbol.as_str()))
                .map(|symbol| &input[..symbol.len()]),
        }
    }

    fn insert_binary(&mut self, symbol: String, op: BinaryOp) {
        tracing::trace!(%symbol, precedence = op.precedence, lazy = op.is_lazy(), "registering binary operator");
        self.binary_ops.insert(symbol, op);
        self.rebuild_symbols();
    }

    fn rebuild_symbols(&mut self) {
        let mut symbols: Vec<String> = self
            .binary_ops
            .keys()
            .chain(self.unary_ops.keys())
            .filter(|s| !s.is_empty() && !is_word(s))
            .cloned()
            .collect();
        // Alternation is leftmost-first, so longer symbols must come first
        symbols.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        symbols.dedup();

        self.matcher = if symbols.is_empty() {
            None
        } else {
            let alternatives: Vec<String> = symbols.iter().map(|s| regex::escape(s)).collect();
            match Regex::new(&format!("^(?:{})", alternatives.join("|"))) {
                Ok(re) => Some(re),
                Err(error) => {
                    tracing::warn!(%error, symbols = symbols.len(), "operator matcher unavailable, scanning symbols instead");
                    None
                }
            }
        };
        self.symbols = symbols;
    }
}

/// Whether a symbol is spelled entirely with identifier characters.
pub(crate) fn is_word(symbol: &str) -> bool {
    symbol
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

fn sorted_keys<V>(map: &HashMap<String, V>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

impl fmt::Debug for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("binary_ops", &self.binary_ops())
            .field("unary_ops", &self.unary_symbols())
            .field("functions", &self.function_names())
            .field("transforms", &self.transform_names())
            .finish()
    }
}
