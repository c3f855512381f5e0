//! Grammar listing for `sage operators`

use std::fmt::Write;

use crate::Grammar;

/// Lists the operators, functions and transforms of a grammar.
pub fn describe_grammar(grammar: &Grammar) -> String {
    let mut out = String::from("BINARY OPERATORS (tightest first)\n\n");
    for (symbol, op) in grammar.binary_ops() {
        let lazy = if op.is_lazy() { "  short-circuit" } else { "" };
        let _ = writeln!(out, "  {symbol:<6} {:>5}{lazy}", op.precedence);
    }

    out.push_str("\nUNARY OPERATORS\n\n");
    for symbol in grammar.unary_symbols() {
        let _ = writeln!(out, "  {symbol}");
    }

    for (title, names) in [
        ("FUNCTIONS", grammar.function_names()),
        ("TRANSFORMS", grammar.transform_names()),
    ] {
        let _ = writeln!(out, "\n{title}\n");
        if names.is_empty() {
            out.push_str("  (none)\n");
        }
        for name in names {
            let _ = writeln!(out, "  {name}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_default_operators() {
        let listing = describe_grammar(&Grammar::default());
        assert!(listing.contains("  ^         50"));
        assert!(listing.contains("  &&        10  short-circuit"));
        assert!(listing.contains("FUNCTIONS\n\n  (none)"));
    }

    #[test]
    fn test_power_listed_before_addition() {
        let listing = describe_grammar(&Grammar::default());
        let power = listing.find("  ^ ").unwrap();
        let plus = listing.find("  + ").unwrap();
        assert!(power < plus);
    }
}
