use std::{cmp::Ordering, collections::HashMap};

/// A JSON value used as context, operand and result throughout Sage.
///
/// The language keeps integers and floats apart (unlike standard JSON, which
/// only has "number"): arithmetic stays integral whenever the result is a
/// whole number.
///
/// There is no separate "undefined": a lookup that finds nothing yields
/// [`Value::Null`].
///
/// # Examples
///
/// ```
/// use sage_lang::Value;
/// use std::collections::HashMap;
///
/// let integer = Value::Integer(42);
/// let string = Value::from("hello");
/// let array = Value::Array(vec![Value::Integer(1), Value::Integer(2)]);
///
/// let mut obj = HashMap::new();
/// obj.insert("key".to_string(), Value::from("value"));
/// let object = Value::Object(obj);
/// assert!(object.is_truthy());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// JSON null, also the result of a missing lookup
    Null,

    /// JSON boolean (true/false)
    Boolean(bool),

    /// Floating-point number
    Float(f64),

    /// Integer number (preserved separately from floats)
    Integer(i64),

    /// UTF-8 string
    String(String),

    /// Array of values (homogeneous or heterogeneous)
    Array(Vec<Value>),

    /// Object with string keys
    Object(HashMap<String, Value>),
}

impl Value {
    /// Truthiness used by `!`, `&&`, `||`, conditionals and filters.
    ///
    /// `null`, `false`, zero, NaN and the empty string are falsy; every
    /// array and object is truthy.
    pub fn is_truthy(&self) -> bool {
        use Value::*;
        match self {
            Null => false,
            Boolean(b) => *b,
            Float(n) => *n != 0.0 && !n.is_nan(),
            Integer(n) => *n != 0,
            String(s) => !s.is_empty(),
            Array(_) | Object(_) => true,
        }
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as integer, accepting floats only when they are whole
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Float(n) if n.fract() == 0.0 && n.is_finite() => Some(*n as i64),
            _ => None,
        }
    }

    /// Get as string (concatenation)
    pub fn as_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Float(n) => n.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Null => "null".to_string(),
            other => serde_json::Value::from(other.clone()).to_string(),
        }
    }

    /// Returns a human-readable type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// Equality used by `==`, `!=` and `in`: integers and floats compare
    /// numerically, containers compare element by element.
    pub fn loose_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                cmp_int_float(*a, *b) == Some(Ordering::Equal)
            }
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loose_eq(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|other| v.loose_eq(other)))
            }
            (a, b) => a == b,
        }
    }

    /// Orders two numbers exactly; integers beyond 2^53 are not rounded.
    ///
    /// `None` when either side is not a number or is NaN.
    pub fn numeric_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Float(b)) => cmp_int_float(*a, *b),
            (Value::Float(a), Value::Integer(b)) => cmp_int_float(*b, *a).map(Ordering::reverse),
            _ => None,
        }
    }

    /// Reads a property, yielding `Null` when it is missing.
    ///
    /// Arrays are read through their first element.
    pub fn property(&self, name: &str) -> Value {
        match self {
            Value::Object(map) => map.get(name).cloned().unwrap_or(Value::Null),
            Value::Array(items) => items
                .first()
                .map(|first| first.property(name))
                .unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// Indexes into an array or object with an evaluated key.
    ///
    /// Integer keys on arrays count from the end when negative; string,
    /// boolean and numeric keys on objects are matched by their text.
    pub fn index(&self, key: &Value) -> Value {
        match (self, key) {
            (Value::Array(arr), key) => match key.as_int() {
                Some(n) => {
                    let index = if n < 0 {
                        // Negative index: count from end (-1 = last)
                        let abs_idx = n.unsigned_abs() as usize;
                        if abs_idx > arr.len() {
                            return Value::Null;
                        }
                        arr.len() - abs_idx
                    } else {
                        n as usize
                    };
                    arr.get(index).cloned().unwrap_or(Value::Null)
                }
                None => Value::Null,
            },
            (
                Value::Object(map),
                Value::String(_) | Value::Integer(_) | Value::Float(_) | Value::Boolean(_),
            ) => map.get(&key.as_string()).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }
}

fn cmp_int_float(int: i64, float: f64) -> Option<Ordering> {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

    if float.is_nan() {
        return None;
    }
    let whole = float.trunc();
    if whole >= TWO_POW_63 {
        return Some(Ordering::Less);
    }
    if whole < -TWO_POW_63 {
        return Some(Ordering::Greater);
    }
    // `whole` is in range, so the cast is exact
    match int.cmp(&(whole as i64)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(float - whole)),
        unequal => Some(unequal),
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => {
                Value::Array(arr.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_cmp_is_exact_for_large_integers() {
        let big = Value::Integer(9_007_199_254_740_993);
        let below = Value::Integer(9_007_199_254_740_992);
        assert_eq!(big.numeric_cmp(&below), Some(Ordering::Greater));
        assert!(!big.loose_eq(&below));

        // 2^53 + 1 has no f64 of its own; the nearest is 2^53
        let nearest = Value::Float(9_007_199_254_740_992.0);
        assert_eq!(big.numeric_cmp(&nearest), Some(Ordering::Greater));
        assert!(!big.loose_eq(&nearest));
        assert!(below.loose_eq(&nearest));

        assert_eq!(Value::Integer(3).numeric_cmp(&Value::Float(3.5)), Some(Ordering::Less));
        assert_eq!(Value::Integer(-3).numeric_cmp(&Value::Float(-3.5)), Some(Ordering::Greater));
        assert_eq!(Value::Float(f64::INFINITY).numeric_cmp(&Value::Integer(i64::MAX)), Some(Ordering::Greater));
        assert_eq!(Value::Integer(i64::MIN).numeric_cmp(&Value::Float(-1e300)), Some(Ordering::Greater));
        assert_eq!(Value::Integer(1).numeric_cmp(&Value::Float(f64::NAN)), None);
        assert_eq!(Value::Integer(1).numeric_cmp(&Value::from("1")), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Integer(0).is_truthy());
        assert!(Value::Integer(-2).is_truthy());
        assert!(!Value::from("").is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
    }

    #[test]
    fn test_loose_eq_mixes_numbers() {
        assert!(Value::Integer(4).loose_eq(&Value::Float(4.0)));
        assert!(!Value::Integer(4).loose_eq(&Value::from("4")));
    }

    #[test]
    fn test_property_reads_through_arrays() {
        let v = Value::from(json!([{"name": "first"}, {"name": "second"}]));
        assert_eq!(v.property("name"), Value::from("first"));
        assert_eq!(Value::Integer(3).property("name"), Value::Null);
    }

    #[test]
    fn test_index() {
        let arr = Value::from(json!(["a", "b", "c"]));
        assert_eq!(arr.index(&Value::Integer(1)), Value::from("b"));
        assert_eq!(arr.index(&Value::Integer(-1)), Value::from("c"));
        assert_eq!(arr.index(&Value::Integer(9)), Value::Null);

        let obj = Value::from(json!({"1": "one", "k": "v"}));
        assert_eq!(obj.index(&Value::Integer(1)), Value::from("one"));
        assert_eq!(obj.index(&Value::from("k")), Value::from("v"));
    }
}
