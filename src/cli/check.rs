//! Check and run expressions against JSON input

use super::CliError;
use crate::{Engine, Value};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The expression to run
    pub expression: String,
    /// JSON context
    pub input: Option<String>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug, PartialEq)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Expression evaluated with JSON output
    Success(serde_json::Value),
}

/// Compiles the expression and, unless only syntax is checked, evaluates it
/// against the JSON input.
pub fn execute_check(engine: &Engine, options: &CheckOptions) -> Result<CheckResult, CliError> {
    let expression = engine.compile(options.expression.as_str())?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let json = options.input.as_ref().ok_or(CliError::NoInput)?;
    let context = Value::from(serde_json::from_str::<serde_json::Value>(json)?);
    tracing::debug!(context = context.type_name(), "evaluating against input");

    let result = expression.eval(&context)?;
    Ok(CheckResult::Success(result.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(expression: &str, input: Option<&str>) -> CheckOptions {
        CheckOptions {
            expression: expression.to_string(),
            input: input.map(str::to_string),
            syntax_only: false,
        }
    }

    #[test]
    fn test_evaluates_against_input() {
        let engine = Engine::new();
        let result = execute_check(&engine, &options("a.b * 2", Some(r#"{"a": {"b": 21}}"#))).unwrap();
        assert_eq!(result, CheckResult::Success(json!(42)));
    }

    #[test]
    fn test_syntax_only_needs_no_input() {
        let engine = Engine::new();
        let mut opts = options("a[.b > 1]", None);
        opts.syntax_only = true;
        assert_eq!(execute_check(&engine, &opts).unwrap(), CheckResult::SyntaxValid);
    }

    #[test]
    fn test_missing_input() {
        let engine = Engine::new();
        let result = execute_check(&engine, &options("1", None));
        assert!(matches!(result, Err(CliError::NoInput)));
    }

    #[test]
    fn test_syntax_error_reported_before_input() {
        let engine = Engine::new();
        let result = execute_check(&engine, &options("2 & 2", None));
        assert!(matches!(result, Err(CliError::Expression(crate::Error::Lex(_)))));
    }
}
