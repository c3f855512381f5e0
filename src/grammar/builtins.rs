//! Operators installed by [`Grammar::default`](super::Grammar).

use std::cmp::Ordering;

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use super::Grammar;
use crate::{deferred::Deferred, evaluator::EvalError, value::Value};

pub(super) fn install(grammar: &mut Grammar) {
    grammar.add_binary_op("+", 30, add);
    grammar.add_binary_op("-", 30, |l, r| {
        arithmetic("subtract", &l, &r, i64::checked_sub, Decimal::checked_sub, |a, b| a - b)
    });
    grammar.add_binary_op("*", 40, |l, r| {
        arithmetic("multiply", &l, &r, i64::checked_mul, Decimal::checked_mul, |a, b| a * b)
    });
    grammar.add_binary_op("/", 40, divide);
    grammar.add_binary_op("//", 40, floor_divide);
    grammar.add_binary_op("%", 40, modulo);
    grammar.add_binary_op("^", 50, power);

    grammar.add_binary_op("==", 20, |l, r| Value::Boolean(l.loose_eq(&r)));
    grammar.add_binary_op("!=", 20, |l, r| Value::Boolean(!l.loose_eq(&r)));
    grammar.add_binary_op("<", 20, |l, r| compare("<", &l, &r, Ordering::is_lt));
    grammar.add_binary_op("<=", 20, |l, r| compare("<=", &l, &r, Ordering::is_le));
    grammar.add_binary_op(">", 20, |l, r| compare(">", &l, &r, Ordering::is_gt));
    grammar.add_binary_op(">=", 20, |l, r| compare(">=", &l, &r, Ordering::is_ge));
    grammar.add_binary_op("in", 20, |l, r| Value::Boolean(contains(&r, &l)));

    // Short-circuiting: the right operand is only evaluated when it decides
    // the result, and the deciding operand itself is returned.
    grammar.add_lazy_binary_op("&&", 10, |left, right| {
        Deferred::pending(async move {
            let l = left.eval().await?;
            if l.is_truthy() { right.eval().await } else { Ok(l) }
        })
    });
    grammar.add_lazy_binary_op("||", 10, |left, right| {
        Deferred::pending(async move {
            let l = left.eval().await?;
            if l.is_truthy() { Ok(l) } else { right.eval().await }
        })
    });

    grammar.add_unary_op("!", |operand| Value::Boolean(!operand.is_truthy()));
    grammar.add_unary_op("-", negate);
}

fn to_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Integer(n) => Decimal::from_i64(*n),
        Value::Float(n) => Decimal::from_f64(*n),
        _ => None,
    }
}

/// Converts back, keeping whole results integral.
fn from_decimal(d: Decimal) -> Option<Value> {
    if d.is_integer()
        && let Some(i) = d.to_i64()
    {
        return Some(Value::Integer(i));
    }
    d.to_f64().map(Value::Float)
}

/// Integer results stay integers unless they overflow; mixed integer/float
/// operands go through decimal arithmetic to avoid binary rounding noise.
fn arithmetic(
    verb: &str,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    dec_op: fn(Decimal, Decimal) -> Option<Decimal>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Ok(int_op(*a, *b)
            .map_or_else(|| Value::Float(float_op(*a as f64, *b as f64)), Value::Integer)),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(*a, *b))),
        (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => {
            let exact = to_decimal(left)
                .zip(to_decimal(right))
                .and_then(|(a, b)| dec_op(a, b))
                .and_then(from_decimal);
            Ok(exact.unwrap_or_else(|| {
                Value::Float(float_op(
                    left.as_float().unwrap_or(f64::NAN),
                    right.as_float().unwrap_or(f64::NAN),
                ))
            }))
        }
        (a, b) => Err(EvalError::TypeError(format!(
            "Cannot {} {} and {}",
            verb,
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn add(left: Value, right: Value) -> Result<Value, EvalError> {
    match (&left, &right) {
        (Value::String(a), b) => Ok(Value::String(format!("{}{}", a, b.as_string()))),
        (a, Value::String(b)) => Ok(Value::String(format!("{}{}", a.as_string(), b))),
        _ => arithmetic("add", &left, &right, i64::checked_add, Decimal::checked_add, |a, b| a + b),
    }
}

fn check_divisor(right: &Value) -> Result<(), EvalError> {
    match right.as_float() {
        Some(d) if d == 0.0 => Err(EvalError::DivisionByZero),
        _ => Ok(()),
    }
}

fn divide(left: Value, right: Value) -> Result<Value, EvalError> {
    check_divisor(&right)?;
    arithmetic(
        "divide",
        &left,
        &right,
        |a, b| a.checked_rem(b).filter(|r| *r == 0).and_then(|_| a.checked_div(b)),
        Decimal::checked_div,
        |a, b| a / b,
    )
}

fn floor_divide(left: Value, right: Value) -> Result<Value, EvalError> {
    check_divisor(&right)?;
    let quotient = arithmetic(
        "divide",
        &left,
        &right,
        |a, b| {
            let q = a.checked_div(b)?;
            if a % b != 0 && ((a < 0) != (b < 0)) { q.checked_sub(1) } else { Some(q) }
        },
        |a, b| a.checked_div(b).map(|q| q.floor()),
        |a, b| (a / b).floor(),
    )?;
    Ok(match quotient {
        Value::Float(f) if f.is_finite() && f.abs() < i64::MAX as f64 => Value::Integer(f as i64),
        other => other,
    })
}

fn modulo(left: Value, right: Value) -> Result<Value, EvalError> {
    check_divisor(&right)?;
    arithmetic("take the remainder of", &left, &right, i64::checked_rem, Decimal::checked_rem, |a, b| a % b)
}

fn power(left: Value, right: Value) -> Result<Value, EvalError> {
    arithmetic(
        "raise",
        &left,
        &right,
        |a, b| u32::try_from(b).ok().and_then(|e| a.checked_pow(e)),
        |_, _| None,
        f64::powf,
    )
}

fn negate(operand: Value) -> Result<Value, EvalError> {
    match operand {
        Value::Integer(n) => Ok(n
            .checked_neg()
            .map_or(Value::Float(-(n as f64)), Value::Integer)),
        Value::Float(n) => Ok(Value::Float(-n)),
        other => Err(EvalError::TypeError(format!("Cannot negate {}", other.type_name()))),
    }
}

fn compare(
    symbol: &str,
    left: &Value,
    right: &Value,
    test: fn(Ordering) -> bool,
) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Integer(_) | Value::Float(_), Value::Integer(_) | Value::Float(_)) => {
            left.numeric_cmp(right)
        }
        _ => {
            return Err(EvalError::TypeError(format!(
                "Cannot compare {} {} {} (comparison requires two numbers or two strings)",
                left.type_name(),
                symbol,
                right.type_name()
            )));
        }
    };
    // NaN compares false in every direction
    Ok(Value::Boolean(ordering.is_some_and(test)))
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::Array(items) => items.iter().any(|item| item.loose_eq(needle)),
        Value::String(s) => s.contains(&needle.as_string()),
        _ => false,
    }
}
