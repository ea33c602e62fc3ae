//! Integration tests for interface proxies
//!
//! Covers targets supplied by the caller, target-less proxies answering
//! with defaults, and the handler protocol (argument rewriting, error
//! propagation, synchronous completion).

mod common;

use std::sync::Arc;

use futures::FutureExt;
use interpose::{
    ContractBuilder, Handler, Implementation, InvocationError, MethodDefinition, ObjectExt,
    ProxyFactory, ReturnShape, TargetKind, TypeInfo, Value,
};
use parking_lot::Mutex;

use common::{append_test_handler, short_delay, some_service, some_service_target};

// ============================================================================
// Explicit target
// ============================================================================

#[tokio::test]
async fn test_handler_decorates_target_results() {
    let factory = ProxyFactory::new();
    let contract = some_service();
    let target = some_service_target(&contract);
    let proxy = factory
        .create_proxy(&contract, Some(target), append_test_handler())
        .unwrap();

    let async_string = proxy.call_async("asyncGetString", vec![]).await.unwrap();
    assert_eq!(async_string.as_str(), Some("Some async string Test"));

    let string = proxy.call_sync("getString", vec![]).unwrap();
    assert_eq!(string.as_str(), Some("Some non async string Test"));

    let sum = proxy
        .call_sync("sum", vec![Value::I32(2), Value::I32(3)])
        .unwrap();
    assert_eq!(sum, Value::I32(5));

    let async_sum = proxy
        .call_async("asyncSum", vec![Value::I32(2), Value::I32(3)])
        .await
        .unwrap();
    assert_eq!(async_sum, Value::I32(5));
}

#[test]
fn test_sync_methods_work_without_a_runtime() {
    let contract = some_service();
    let proxy = ProxyFactory::new()
        .create_proxy(&contract, Some(some_service_target(&contract)), append_test_handler())
        .unwrap();

    let string = proxy.call_sync("getString", vec![]).unwrap();
    assert_eq!(string.as_str(), Some("Some non async string Test"));

    // Task-returning methods can also be waited on from plain threads
    let async_sum = proxy
        .call_sync("asyncSum", vec![Value::I32(40), Value::I32(2)])
        .unwrap();
    assert_eq!(async_sum, Value::I32(42));
}

#[tokio::test]
async fn test_passthrough_matches_direct_calls() {
    let contract = some_service();
    let target = some_service_target(&contract);
    let proxy = ProxyFactory::new()
        .create_proxy(&contract, Some(target.clone()), Handler::passthrough())
        .unwrap();

    for (name, args) in [
        ("asyncGetString", vec![]),
        ("getString", vec![]),
        ("sum", vec![Value::I32(7), Value::I32(-3)]),
        ("asyncSum", vec![Value::I32(1), Value::I32(1)]),
    ] {
        let direct = target.call_async(name, args.clone()).await.unwrap();
        let proxied = proxy.call_async(name, args).await.unwrap();
        assert_eq!(direct, proxied, "{} differs through the proxy", name);
    }
}

#[tokio::test]
async fn test_passthrough_preserves_ordering() {
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let contract = ContractBuilder::interface("IStepper")
        .method(
            MethodDefinition::new("step")
                .param("label", TypeInfo::string())
                .returns(TypeInfo::task()),
        )
        .build()
        .unwrap();

    let recorded = log.clone();
    let target = Implementation::builder(&contract)
        .async_method("step", move |_, args| {
            let recorded = recorded.clone();
            async move {
                let label = args[0].as_str().unwrap_or_default().to_string();
                recorded.lock().push(format!("{} start", label));
                short_delay().await;
                recorded.lock().push(format!("{} end", label));
                Ok(Value::Unit)
            }
        })
        .build()
        .unwrap();

    let proxy = ProxyFactory::new()
        .create_proxy(&contract, Some(target), Handler::passthrough())
        .unwrap();

    log.lock().push("before".to_string());
    proxy.call_async("step", vec![Value::from("a")]).await.unwrap();
    log.lock().push("between".to_string());
    proxy.call_async("step", vec![Value::from("b")]).await.unwrap();
    log.lock().push("after".to_string());

    assert_eq!(
        *log.lock(),
        vec!["before", "a start", "a end", "between", "b start", "b end", "after"]
    );
}

// ============================================================================
// No target: shape defaults
// ============================================================================

#[tokio::test]
async fn test_no_target_returns_defaults() {
    let contract = some_service();
    let proxy = ProxyFactory::new()
        .create_proxy(&contract, None, Handler::passthrough())
        .unwrap();
    assert_eq!(proxy.target_kind(), TargetKind::Defaults);

    assert_eq!(proxy.call_sync("getString", vec![]).unwrap(), Value::Null);
    assert_eq!(
        proxy
            .call_sync("sum", vec![Value::I32(2), Value::I32(3)])
            .unwrap(),
        Value::I32(0)
    );

    // Already complete: resolves on first poll
    let async_string = proxy
        .call_async("asyncGetString", vec![])
        .now_or_never()
        .expect("default task should be complete");
    assert_eq!(async_string.unwrap(), Value::Null);

    let async_sum = proxy
        .call_async("asyncSum", vec![Value::I32(2), Value::I32(3)])
        .await
        .unwrap();
    assert_eq!(async_sum, Value::I32(0));
}

#[tokio::test]
async fn test_no_target_void_and_plain_task() {
    let contract = ContractBuilder::interface("IJobs")
        .method(MethodDefinition::new("reset"))
        .method(MethodDefinition::new("flush").returns(TypeInfo::task()))
        .method(MethodDefinition::new("ready").returns(TypeInfo::bool()))
        .method(MethodDefinition::new("load").returns(TypeInfo::f64()))
        .build()
        .unwrap();
    let proxy = ProxyFactory::new()
        .create_proxy(&contract, None, Handler::passthrough())
        .unwrap();

    assert_eq!(proxy.call_sync("reset", vec![]).unwrap(), Value::Unit);
    assert_eq!(proxy.call_async("flush", vec![]).await.unwrap(), Value::Unit);
    assert_eq!(proxy.call_sync("ready", vec![]).unwrap(), Value::Bool(false));
    assert_eq!(proxy.call_sync("load", vec![]).unwrap(), Value::F64(0.0));
}

#[test]
fn test_inherited_interface_methods_are_intercepted() {
    let base = ContractBuilder::interface("INamed")
        .method(MethodDefinition::new("name").returns(TypeInfo::string()))
        .build()
        .unwrap();
    let derived = ContractBuilder::interface("IPerson")
        .extends(base)
        .method(MethodDefinition::new("age").returns(TypeInfo::i32()))
        .build()
        .unwrap();

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();
    let proxy = ProxyFactory::new()
        .create_proxy(
            &derived,
            None,
            Handler::sync(move |invocation| {
                recorded.lock().push(invocation.key().name().to_string());
                invocation.proceed_blocking()
            }),
        )
        .unwrap();

    proxy.call_sync("age", vec![]).unwrap();
    proxy.call_sync("name", vec![]).unwrap();
    assert_eq!(*seen.lock(), vec!["age", "name"]);
    assert_eq!(proxy.proxy_type().method_count(), 2);
}

// ============================================================================
// Handler protocol
// ============================================================================

#[test]
fn test_handler_can_rewrite_arguments() {
    let contract = some_service();
    let proxy = ProxyFactory::new()
        .create_proxy(
            &contract,
            Some(some_service_target(&contract)),
            Handler::sync(|mut invocation| {
                if invocation.key().name() == "sum" {
                    invocation.replace_argument(1, Value::I32(100));
                }
                invocation.proceed_blocking()
            }),
        )
        .unwrap();

    let sum = proxy
        .call_sync("sum", vec![Value::I32(1), Value::I32(2)])
        .unwrap();
    assert_eq!(sum, Value::I32(101));
}

#[test]
fn test_handler_can_skip_proceed() {
    let contract = some_service();
    let calls = Arc::new(Mutex::new(0));
    let counted = calls.clone();
    let target = Implementation::builder(&contract)
        .async_method("asyncGetString", |_, _| async { Ok(Value::from("x")) })
        .sync_method("getString", move |_, _| {
            *counted.lock() += 1;
            Ok(Value::from("real"))
        })
        .sync_method("sum", |_, _| Ok(Value::I32(0)))
        .async_method("asyncSum", |_, _| async { Ok(Value::I32(0)) })
        .build()
        .unwrap();

    let proxy = ProxyFactory::new()
        .create_proxy(
            &contract,
            Some(target),
            Handler::sync(|_| Ok(Value::from("replaced"))),
        )
        .unwrap();

    let value = proxy.call_sync("getString", vec![]).unwrap();
    assert_eq!(value.as_str(), Some("replaced"));
    assert_eq!(*calls.lock(), 0);
}

#[tokio::test]
async fn test_handler_errors_propagate_unchanged() {
    let contract = some_service();
    let proxy = ProxyFactory::new()
        .create_proxy(
            &contract,
            Some(some_service_target(&contract)),
            Handler::new(|_| async { Err(InvocationError::from("handler refused")) }),
        )
        .unwrap();

    let sync_err = proxy.call_sync("getString", vec![]).unwrap_err();
    assert!(matches!(&sync_err, InvocationError::Failed(msg) if msg == "handler refused"));

    let async_err = proxy.call_async("asyncSum", vec![Value::I32(1), Value::I32(1)]).await.unwrap_err();
    assert!(matches!(&async_err, InvocationError::Failed(msg) if msg == "handler refused"));
}

#[test]
fn test_target_errors_propagate_through_proceed() {
    let contract = ContractBuilder::interface("IFragile")
        .method(MethodDefinition::new("explode").returns(TypeInfo::i32()))
        .build()
        .unwrap();
    let target = Implementation::builder(&contract)
        .sync_method("explode", |_, _| {
            Err(InvocationError::custom(std::io::Error::new(
                std::io::ErrorKind::Other,
                "boom",
            )))
        })
        .build()
        .unwrap();
    let proxy = ProxyFactory::new()
        .create_proxy(&contract, Some(target), Handler::passthrough())
        .unwrap();

    let err = proxy.call_sync("explode", vec![]).unwrap_err();
    assert!(matches!(err, InvocationError::Custom(_)));
    assert_eq!(err.to_string(), "boom");
}

#[test]
fn test_sync_handler_completes_synchronously() {
    let contract = some_service();
    let proxy = ProxyFactory::new()
        .create_proxy(
            &contract,
            None,
            Handler::sync(|invocation| match invocation.shape() {
                ReturnShape::AsyncValue(_) | ReturnShape::Value(_) => Ok(Value::I32(9)),
                _ => Ok(Value::Unit),
            }),
        )
        .unwrap();

    // A sync handler's result is ready on the first poll, even for tasks
    let result = proxy
        .call_async("asyncSum", vec![Value::I32(0), Value::I32(0)])
        .now_or_never()
        .expect("sync handler result should be ready");
    assert_eq!(result.unwrap(), Value::I32(9));
}

#[test]
fn test_invocation_exposes_call_identity() {
    let contract = some_service();
    let seen: Arc<Mutex<Option<(String, usize, Vec<Value>)>>> = Arc::new(Mutex::new(None));
    let recorded = seen.clone();
    let proxy = ProxyFactory::new()
        .create_proxy(
            &contract,
            None,
            Handler::from_fn(move |invocation| {
                *recorded.lock() = Some((
                    invocation.method().info().signature(),
                    invocation.method().slot(),
                    invocation.arguments().to_vec(),
                ));
                invocation.proceed()
            }),
        )
        .unwrap();

    proxy
        .call_sync("asyncSum", vec![Value::I32(4), Value::I32(5)])
        .unwrap();
    let (signature, slot, args) = seen.lock().take().unwrap();
    assert_eq!(signature, "asyncSum(a: i32, b: i32) -> Task<i32>");
    assert_eq!(slot, 3);
    assert_eq!(args, vec![Value::I32(4), Value::I32(5)]);
}

#[test]
fn test_proxy_can_target_another_proxy() {
    let contract = some_service();
    let factory = ProxyFactory::new();
    let inner = factory
        .create_proxy(&contract, Some(some_service_target(&contract)), append_test_handler())
        .unwrap();
    let outer = factory
        .create_proxy(&contract, Some(inner), append_test_handler())
        .unwrap();

    let string = outer.call_sync("getString", vec![]).unwrap();
    assert_eq!(string.as_str(), Some("Some non async string Test Test"));
    assert_eq!(factory.synthesis_count(), 1);
}
