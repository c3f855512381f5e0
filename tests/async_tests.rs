// tests/async_tests.rs

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use sage_lang::{Deferred, Engine, Error, EvalError, Value};
use serde_json::json;

/// An engine with a `slow(ms, label)` function that sleeps before returning
/// its label, recording completion order in the returned log.
fn engine_with_slow() -> (Engine, Arc<Mutex<Vec<String>>>) {
    let engine = Engine::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    engine.configure(|g| {
        g.add_function("slow", move |args: Vec<Value>| {
            let sink = Arc::clone(&sink);
            Deferred::pending(async move {
                let ms = args.first().and_then(Value::as_int).unwrap_or_default();
                let label = args.get(1).cloned().unwrap_or(Value::Null);
                tokio::time::sleep(Duration::from_millis(ms.unsigned_abs())).await;
                sink.lock().push(label.as_string());
                Ok(label)
            })
        })
    });
    (engine, log)
}

#[tokio::test]
async fn test_async_function_resolves() {
    let (engine, _) = engine_with_slow();
    let result = engine.eval_async(r#"slow(5, "done") + "!""#, &Value::Null).await;
    assert_eq!(result.unwrap(), Value::from("done!"));
}

#[tokio::test]
async fn test_sync_evaluation_would_block() {
    let (engine, log) = engine_with_slow();
    let result = engine.eval(r#"slow(5, "never")"#, &Value::Null);
    assert!(matches!(result, Err(Error::Eval(EvalError::WouldBlock))));
    assert!(log.lock().is_empty());
}

#[tokio::test]
async fn test_ready_callables_work_synchronously() {
    let engine = Engine::new();
    engine.configure(|g| {
        g.add_transform("twice", |subject: Value, _args| {
            Deferred::pending(async move {
                Ok(Value::Integer(subject.as_int().unwrap_or_default() * 2))
            })
        })
    });
    // A future that is ready on first poll does not block
    assert_eq!(engine.eval("21|twice", &Value::Null).unwrap(), Value::Integer(42));
}

#[tokio::test]
async fn test_arguments_evaluated_left_to_right() {
    let (engine, log) = engine_with_slow();
    let result = engine
        .eval_async(r#"[slow(20, "a"), slow(1, "b"), slow(5, "c")]"#, &Value::Null)
        .await
        .unwrap();
    assert_eq!(result, Value::from(json!(["a", "b", "c"])));
    assert_eq!(*log.lock(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_async_short_circuit() {
    let (engine, log) = engine_with_slow();
    let result = engine
        .eval_async(r#"slow(1, "") && slow(1, "skipped")"#, &Value::Null)
        .await
        .unwrap();
    assert_eq!(result, Value::from(""));
    assert_eq!(*log.lock(), vec![""]);
}

#[tokio::test]
async fn test_async_transform_in_filter() {
    let engine = Engine::new();
    engine.configure(|g| {
        g.add_transform("lookup", |subject: Value, _args| {
            Deferred::pending(async move {
                tokio::task::yield_now().await;
                Ok(Value::Boolean(subject.as_int().is_some_and(|n| n % 2 == 0)))
            })
        })
    });
    let context = Value::from(json!({"items": [{"id": 1}, {"id": 2}, {"id": 4}]}));
    let result = engine.eval_async("items[.id|lookup]", &context).await.unwrap();
    assert_eq!(result, Value::from(json!([{"id": 2}, {"id": 4}])));
}

#[tokio::test]
async fn test_async_callback_error() {
    let engine = Engine::new();
    engine.configure(|g| {
        g.add_function("fail", |_args| {
            Deferred::pending(async {
                tokio::task::yield_now().await;
                Err(EvalError::callback("backend unavailable"))
            })
        })
    });
    let err = engine.eval_async("1 + fail()", &Value::Null).await.unwrap_err();
    assert_eq!(err.to_string(), "backend unavailable");
}

#[tokio::test]
async fn test_independent_evaluations_interleave() {
    let (engine, log) = engine_with_slow();
    let expression = engine.compile("slow(ms, label)").unwrap();
    let first = Value::from(json!({"ms": 30, "label": "first"}));
    let second = Value::from(json!({"ms": 1, "label": "second"}));

    let (a, b) = futures::join!(expression.eval_async(&first), expression.eval_async(&second));
    assert_eq!(a.unwrap(), Value::from("first"));
    assert_eq!(b.unwrap(), Value::from("second"));
    // The shorter evaluation finished without waiting for the longer one
    assert_eq!(*log.lock(), vec!["second", "first"]);
}
