//! Shared fixtures for the interpose integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use futures::channel::oneshot;
use interpose::{
    ContractBuilder, ContractType, FromValue, Handler, Implementation, MethodDefinition, Object,
    TypeInfo, Value,
};

/// Wait a few milliseconds without relying on any particular runtime's timer
pub async fn short_delay() {
    let (tx, rx) = oneshot::channel();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(5));
        let _ = tx.send(());
    });
    let _ = rx.await;
}

/// `{ asyncGetString(): Task<string>, getString(): string,
///    sum(a: i32, b: i32): i32, asyncSum(a: i32, b: i32): Task<i32> }`
pub fn some_service() -> Arc<ContractType> {
    ContractBuilder::interface("ISomeService")
        .method(
            MethodDefinition::new("asyncGetString")
                .returns(TypeInfo::task_of(TypeInfo::string())),
        )
        .method(MethodDefinition::new("getString").returns(TypeInfo::string()))
        .method(
            MethodDefinition::new("sum")
                .param("a", TypeInfo::i32())
                .param("b", TypeInfo::i32())
                .returns(TypeInfo::i32()),
        )
        .method(
            MethodDefinition::new("asyncSum")
                .param("a", TypeInfo::i32())
                .param("b", TypeInfo::i32())
                .returns(TypeInfo::task_of(TypeInfo::i32())),
        )
        .build()
        .unwrap()
}

fn add(args: &[Value]) -> Result<Value, interpose::InvocationError> {
    let a = i32::from_value(args[0].clone())?;
    let b = i32::from_value(args[1].clone())?;
    Ok(Value::I32(a + b))
}

/// Straightforward implementation of `ISomeService`
pub fn some_service_target(contract: &Arc<ContractType>) -> Arc<dyn Object> {
    Implementation::builder(contract)
        .async_method("asyncGetString", |_, _| async {
            short_delay().await;
            Ok(Value::from("Some async string"))
        })
        .sync_method("getString", |_, _| Ok(Value::from("Some non async string")))
        .sync_method("sum", |_, args| add(&args))
        .async_method("asyncSum", |_, args| async move {
            short_delay().await;
            add(&args)
        })
        .build()
        .unwrap()
}

/// Delays, proceeds, and appends `" Test"` to string results
pub fn append_test_handler() -> Handler {
    Handler::new(|invocation| async move {
        short_delay().await;
        match invocation.proceed().await? {
            Value::Str(s) => Ok(Value::from(format!("{} Test", s))),
            other => Ok(other),
        }
    })
}
