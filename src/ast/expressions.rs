use crate::value::Value;

/// Abstract Syntax Tree node representing a parsed expression.
///
/// Nodes only carry data; operators, functions and transforms are referenced
/// by name and resolved against the grammar when the tree is evaluated.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Literal value, either written in the source or spliced in by a
    /// template
    ///
    /// # Example
    /// ```text
    /// 42
    /// "hello"
    /// ```
    Literal(Value),

    /// Top-level context property
    ///
    /// # Example
    /// ```text
    /// user
    /// ```
    Identifier(String),

    /// Property of the element currently being filtered
    ///
    /// Only valid inside a filter predicate.
    ///
    /// # Example
    /// ```text
    /// users[.age > 18]
    /// ```
    RelativeIdentifier(String),

    /// Property access
    ///
    /// `relative` is set when the chain starts at a relative identifier.
    ///
    /// # Examples
    /// ```text
    /// user.name
    /// .address.city
    /// ```
    Member {
        object: Box<Expr>,
        property: String,
        relative: bool,
    },

    /// Collection filter or index
    ///
    /// `relative` is set when the predicate refers to the filtered element,
    /// in which case it is evaluated once per element. Otherwise the
    /// predicate is evaluated once and used as a boolean or an index.
    ///
    /// # Examples
    /// ```text
    /// items[.price > 100]
    /// items[0]
    /// user["first name"]
    /// ```
    Filter {
        subject: Box<Expr>,
        predicate: Box<Expr>,
        relative: bool,
    },

    /// Array literal
    ///
    /// # Example
    /// ```text
    /// [1, "two", three]
    /// ```
    Array(Vec<Expr>),

    /// Object literal, entries in source order
    ///
    /// # Example
    /// ```text
    /// {name: user.name, "total": price * qty}
    /// ```
    Object(Vec<(String, Expr)>),

    /// Prefix operator application
    UnaryOp { op: String, operand: Box<Expr> },

    /// Infix operator application
    BinaryOp {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Conditional
    ///
    /// A missing consequent (`test ?: alternate`) yields the test value
    /// itself when it is truthy.
    ///
    /// # Examples
    /// ```text
    /// age >= 18 ? "adult" : "minor"
    /// nickname ?: name
    /// ```
    Conditional {
        test: Box<Expr>,
        consequent: Option<Box<Expr>>,
        alternate: Box<Expr>,
    },

    /// Registered function call
    ///
    /// # Example
    /// ```text
    /// max(a, b)
    /// ```
    FunctionCall { name: String, args: Vec<Expr> },

    /// Registered transform applied to a subject
    ///
    /// # Examples
    /// ```text
    /// name|upper
    /// price|round(2)
    /// ```
    Transform {
        name: String,
        subject: Box<Expr>,
        args: Vec<Expr>,
    },
}

impl Expr {
    /// Whether this node is a relative identifier or a member chain rooted
    /// at one.
    pub fn is_relative_path(&self) -> bool {
        match self {
            Expr::RelativeIdentifier(_) => true,
            Expr::Member { relative, .. } => *relative,
            _ => false,
        }
    }

    /// Whether evaluating this tree reads the current filter element.
    ///
    /// Predicates of nested filters belong to those filters and are not
    /// searched, their subjects are.
    pub fn references_relative(&self) -> bool {
        match self {
            Expr::Literal(_) | Expr::Identifier(_) => false,
            Expr::RelativeIdentifier(_) => true,
            Expr::Member { object, .. } => object.references_relative(),
            Expr::Filter { subject, .. } => subject.references_relative(),
            Expr::Array(items) => items.iter().any(Expr::references_relative),
            Expr::Object(entries) => entries.iter().any(|(_, e)| e.references_relative()),
            Expr::UnaryOp { operand, .. } => operand.references_relative(),
            Expr::BinaryOp { left, right, .. } => {
                left.references_relative() || right.references_relative()
            }
            Expr::Conditional {
                test,
                consequent,
                alternate,
            } => {
                test.references_relative()
                    || consequent.as_ref().is_some_and(|c| c.references_relative())
                    || alternate.references_relative()
            }
            Expr::FunctionCall { args, .. } => args.iter().any(Expr::references_relative),
            Expr::Transform { subject, args, .. } => {
                subject.references_relative() || args.iter().any(Expr::references_relative)
            }
        }
    }
}
