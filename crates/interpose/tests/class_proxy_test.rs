//! Integration tests for class proxies
//!
//! A class proxy intercepts the overridable methods of a class. Without a
//! target, proceeding runs the class's own bodies with the proxy as `this`;
//! with a target, the class bodies are bypassed. Non-overridable methods are
//! never intercepted. A call in flight keeps its proxy alive.

use std::sync::Arc;

use interpose::{
    ClassInstance, ContractBuilder, ContractType, Handler, Implementation, Invocation,
    MethodDefinition, ObjectExt, ProxyError, ProxyFactory, TargetKind, TypeInfo, Value,
};
use parking_lot::Mutex;

type Journal = Arc<Mutex<Vec<String>>>;

/// `Account` with an overridable `deposit`, a non-virtual `audit` that calls
/// `deposit` through `this`, and an overridable async `balance`
fn account(journal: &Journal) -> Arc<ContractType> {
    let deposits = journal.clone();
    let audits = journal.clone();
    ContractBuilder::class("Account")
        .method(
            MethodDefinition::new("deposit")
                .param("amount", TypeInfo::i64())
                .returns(TypeInfo::i64())
                .as_virtual()
                .sync_body(move |_, args| {
                    let amount = args[0].as_i64().unwrap_or_default();
                    deposits.lock().push(format!("base deposit {}", amount));
                    Ok(Value::I64(amount))
                }),
        )
        .method(
            MethodDefinition::new("audit")
                .returns(TypeInfo::i64())
                .sync_body(move |this, _| {
                    audits.lock().push("audit".to_string());
                    this.call_sync("deposit", vec![Value::I64(0)])
                }),
        )
        .method(
            MethodDefinition::new("balance")
                .returns(TypeInfo::task_of(TypeInfo::i64()))
                .as_virtual()
                .async_body(|_, _| async { Ok(Value::I64(250)) }),
        )
        .build()
        .unwrap()
}

/// `Ledger` with an overridable void `reset` and an overridable `flush`
/// returning a bare `Task` whose body still produces a value
fn ledger(journal: &Journal) -> Arc<ContractType> {
    let resets = journal.clone();
    let flushes = journal.clone();
    ContractBuilder::class("Ledger")
        .method(MethodDefinition::new("reset").as_virtual().sync_body(move |_, _| {
            resets.lock().push("base reset".to_string());
            Ok(Value::Unit)
        }))
        .method(
            MethodDefinition::new("flush")
                .returns(TypeInfo::task())
                .as_virtual()
                .async_body(move |_, _| {
                    let flushes = flushes.clone();
                    async move {
                        flushes.lock().push("base flush".to_string());
                        Ok(Value::I64(7))
                    }
                }),
        )
        .build()
        .unwrap()
}

fn recording_handler(journal: &Journal) -> Handler {
    let journal = journal.clone();
    Handler::sync(move |invocation| {
        journal
            .lock()
            .push(format!("intercept {}", invocation.key().name()));
        invocation.proceed_blocking()
    })
}

// ============================================================================
// No target: delegate to base
// ============================================================================

#[test]
fn test_no_target_proceeds_to_base_body() {
    let journal = Journal::default();
    let contract = account(&journal);
    let proxy = ProxyFactory::new()
        .create_proxy(&contract, None, recording_handler(&journal))
        .unwrap();
    assert_eq!(proxy.target_kind(), TargetKind::Base);

    let result = proxy.call_sync("deposit", vec![Value::I64(40)]).unwrap();
    assert_eq!(result, Value::I64(40));
    assert_eq!(
        *journal.lock(),
        vec!["intercept deposit", "base deposit 40"]
    );
}

#[tokio::test]
async fn test_no_target_async_base_body() {
    let journal = Journal::default();
    let contract = account(&journal);
    let proxy = ProxyFactory::new()
        .create_proxy(&contract, None, Handler::passthrough())
        .unwrap();

    let balance = proxy.call_async("balance", vec![]).await.unwrap();
    assert_eq!(balance, Value::I64(250));
}

#[tokio::test]
async fn test_no_target_void_and_task_base_bodies() {
    let journal = Journal::default();
    let contract = ledger(&journal);
    let proxy = ProxyFactory::new()
        .create_proxy(&contract, None, recording_handler(&journal))
        .unwrap();

    assert_eq!(proxy.call_sync("reset", vec![]).unwrap(), Value::Unit);
    // The body's value is discarded for a bare task
    assert_eq!(proxy.call_async("flush", vec![]).await.unwrap(), Value::Unit);
    assert_eq!(
        *journal.lock(),
        vec!["intercept reset", "base reset", "intercept flush", "base flush"]
    );
}

#[tokio::test]
async fn test_no_target_call_outlives_dropped_proxy() {
    let journal = Journal::default();
    let contract = account(&journal);
    let proxy = ProxyFactory::new()
        .create_proxy(
            &contract,
            None,
            Handler::new(|invocation| async move { invocation.proceed().await }),
        )
        .unwrap();

    let balance = proxy.call_async("balance", vec![]);
    drop(proxy);
    assert_eq!(balance.await.unwrap(), Value::I64(250));
}

#[test]
fn test_stored_invocation_keeps_base_delegate_alive() {
    let journal = Journal::default();
    let contract = account(&journal);
    let stash: Arc<Mutex<Option<Invocation>>> = Arc::new(Mutex::new(None));
    let kept = stash.clone();
    let proxy = ProxyFactory::new()
        .create_proxy(
            &contract,
            None,
            Handler::sync(move |invocation| {
                *kept.lock() = Some(invocation);
                Ok(Value::I64(0))
            }),
        )
        .unwrap();
    proxy.call_sync("deposit", vec![Value::I64(5)]).unwrap();
    drop(proxy);

    let invocation = stash.lock().take().unwrap();
    assert_eq!(invocation.target_kind(), TargetKind::Base);
    assert_eq!(invocation.proceed_blocking().unwrap(), Value::I64(5));
    assert_eq!(*journal.lock(), vec!["base deposit 5"]);
}

#[test]
fn test_non_virtual_method_is_not_intercepted() {
    let journal = Journal::default();
    let contract = account(&journal);
    let proxy = ProxyFactory::new()
        .create_proxy(&contract, None, recording_handler(&journal))
        .unwrap();
    assert!(proxy
        .proxy_type()
        .methods()
        .iter()
        .all(|m| m.name() != "audit"));

    // The body runs directly; its virtual call back into `deposit` goes
    // through the proxy and is intercepted
    proxy.call_sync("audit", vec![]).unwrap();
    assert_eq!(
        *journal.lock(),
        vec!["audit", "intercept deposit", "base deposit 0"]
    );
}

#[test]
fn test_non_virtual_behavior_matches_plain_instance() {
    let plain_journal = Journal::default();
    let plain = ClassInstance::new(&account(&plain_journal)).unwrap();
    let plain_result = plain.call_sync("audit", vec![]).unwrap();

    let proxy_journal = Journal::default();
    let contract = account(&proxy_journal);
    let proxy = ProxyFactory::new()
        .create_proxy(&contract, None, Handler::passthrough())
        .unwrap();
    let proxy_result = proxy.call_sync("audit", vec![]).unwrap();

    assert_eq!(plain_result, proxy_result);
    assert_eq!(*plain_journal.lock(), *proxy_journal.lock());
}

#[test]
fn test_abstract_method_without_target_uses_default() {
    let contract = ContractBuilder::class("Shape")
        .method(
            MethodDefinition::new("area")
                .returns(TypeInfo::f64())
                .as_abstract(),
        )
        .method(
            MethodDefinition::new("label")
                .returns(TypeInfo::string())
                .as_virtual()
                .sync_body(|_, _| Ok(Value::from("shape"))),
        )
        .build()
        .unwrap();
    let proxy = ProxyFactory::new()
        .create_proxy(&contract, None, Handler::passthrough())
        .unwrap();

    assert_eq!(proxy.call_sync("area", vec![]).unwrap(), Value::F64(0.0));
    assert_eq!(proxy.call_sync("label", vec![]).unwrap().as_str(), Some("shape"));
}

// ============================================================================
// Explicit target
// ============================================================================

#[test]
fn test_explicit_target_bypasses_base() {
    let journal = Journal::default();
    let contract = account(&journal);

    let overrides = journal.clone();
    let target = Implementation::builder(&contract)
        .sync_method("deposit", move |_, args| {
            overrides.lock().push("target deposit".to_string());
            Ok(Value::I64(args[0].as_i64().unwrap_or_default() * 2))
        })
        .build()
        .unwrap();

    let proxy = ProxyFactory::new()
        .create_proxy(&contract, Some(target), recording_handler(&journal))
        .unwrap();
    assert_eq!(proxy.target_kind(), TargetKind::Explicit);

    let result = proxy.call_sync("deposit", vec![Value::I64(21)]).unwrap();
    assert_eq!(result, Value::I64(42));
    assert_eq!(
        *journal.lock(),
        vec!["intercept deposit", "target deposit"]
    );
}

#[tokio::test]
async fn test_explicit_target_void_and_task_methods() {
    let journal = Journal::default();
    let contract = ledger(&journal);

    let resets = journal.clone();
    let flushes = journal.clone();
    let target = Implementation::builder(&contract)
        .sync_method("reset", move |_, _| {
            resets.lock().push("target reset".to_string());
            Ok(Value::Unit)
        })
        .async_method("flush", move |_, _| {
            let flushes = flushes.clone();
            async move {
                flushes.lock().push("target flush".to_string());
                Ok(Value::from("ignored"))
            }
        })
        .build()
        .unwrap();

    let proxy = ProxyFactory::new()
        .create_proxy(&contract, Some(target), recording_handler(&journal))
        .unwrap();

    assert_eq!(proxy.call_sync("reset", vec![]).unwrap(), Value::Unit);
    assert_eq!(proxy.call_async("flush", vec![]).await.unwrap(), Value::Unit);
    assert_eq!(
        *journal.lock(),
        vec!["intercept reset", "target reset", "intercept flush", "target flush"]
    );
}

#[test]
fn test_subclass_override_is_intercepted() {
    let journal = Journal::default();
    let base = account(&journal);
    let savings = ContractBuilder::class("Savings")
        .parent(base)
        .method(
            MethodDefinition::new("deposit")
                .param("amount", TypeInfo::i64())
                .returns(TypeInfo::i64())
                .as_virtual()
                .sync_body(|_, args| Ok(Value::I64(args[0].as_i64().unwrap_or_default() + 1))),
        )
        .build()
        .unwrap();

    let proxy = ProxyFactory::new()
        .create_proxy(&savings, None, recording_handler(&journal))
        .unwrap();
    let result = proxy.call_sync("deposit", vec![Value::I64(1)]).unwrap();
    assert_eq!(result, Value::I64(2));
    assert_eq!(*journal.lock(), vec!["intercept deposit"]);
}

// ============================================================================
// Contract shape errors
// ============================================================================

#[test]
fn test_class_without_overridable_methods_is_rejected() {
    let contract = ContractBuilder::class("Fixed")
        .method(
            MethodDefinition::new("value")
                .returns(TypeInfo::i32())
                .sync_body(|_, _| Ok(Value::I32(1))),
        )
        .build()
        .unwrap();
    let err = ProxyFactory::new()
        .create_proxy(&contract, None, Handler::passthrough())
        .unwrap_err();
    assert!(matches!(err, ProxyError::NoOverridableMethods(name) if name == "Fixed"));
}

#[test]
fn test_sealed_class_is_rejected() {
    let contract = ContractBuilder::class("Final")
        .sealed()
        .method(
            MethodDefinition::new("value")
                .returns(TypeInfo::i32())
                .as_virtual()
                .sync_body(|_, _| Ok(Value::I32(1))),
        )
        .build()
        .unwrap();
    let err = ProxyFactory::new()
        .create_proxy(&contract, None, Handler::passthrough())
        .unwrap_err();
    assert!(matches!(err, ProxyError::SealedContract(_)));
}

#[test]
fn test_unrelated_target_is_rejected() {
    let journal = Journal::default();
    let contract = account(&journal);
    let other = ContractBuilder::class("Other")
        .method(
            MethodDefinition::new("deposit")
                .param("amount", TypeInfo::i64())
                .returns(TypeInfo::i64())
                .as_virtual()
                .sync_body(|_, _| Ok(Value::I64(0))),
        )
        .build()
        .unwrap();
    let target = ClassInstance::new(&other).unwrap();

    let err = ProxyFactory::new()
        .create_proxy(&contract, Some(target), Handler::passthrough())
        .unwrap_err();
    assert!(matches!(err, ProxyError::TargetMismatch { .. }));
}
