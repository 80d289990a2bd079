// tests/memory.rs

mod common;

use futures_util::future::join_all;
use prost_reflect::{DynamicMessage, Value};
use std::sync::Arc;

use protobuf_rpc::{
    // ---
    memory_transport,
    BinaryPayloadCodec,
    JsonEnvelopeCodec,
    Protocol,
    RpcError,
    ServiceProxy,
    ServiceProxyBuilder,
};

async fn calculator() -> anyhow::Result<ServiceProxy> {
    // ---
    common::init_logging();

    let proxy = ServiceProxyBuilder::new(common::service()?)
        .address("memory://calculator")
        .transport(memory_transport(common::server()?))
        .build()
        .await?;

    Ok(proxy)
}

async fn eval(proxy: &ServiceProxy, op: &str, lhs: i32, rhs: i32) -> anyhow::Result<i32> {
    // ---
    let method = proxy.method(op)?;
    let result = method.invoke(&common::request(&method, lhs, rhs)).await?;
    common::value(&result)
}

#[tokio::test]
async fn test_each_operation() -> anyhow::Result<()> {
    // ---
    let proxy = calculator().await?;

    assert_eq!(eval(&proxy, "add", 2, 3).await?, 5);
    assert_eq!(eval(&proxy, "sub", 2, 3).await?, -1);
    assert_eq!(eval(&proxy, "mul", 6, 7).await?, 42);
    assert_eq!(eval(&proxy, "div", 7, 2).await?, 3);

    assert_eq!(proxy.pending_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_division_rounds_toward_negative_infinity() -> anyhow::Result<()> {
    // ---
    let proxy = calculator().await?;

    assert_eq!(eval(&proxy, "div", -7, 2).await?, -4);
    assert_eq!(eval(&proxy, "div", 7, -2).await?, -4);
    assert_eq!(eval(&proxy, "div", -7, -2).await?, 3);
    assert_eq!(eval(&proxy, "div", -8, 2).await?, -4);
    assert_eq!(eval(&proxy, "div", i32::MIN, -1).await?, i32::MIN);
    Ok(())
}

#[tokio::test]
async fn test_division_by_zero_is_remote_error() -> anyhow::Result<()> {
    // ---
    let proxy = calculator().await?;
    let div = proxy.method("div")?;

    let err = div.invoke(&common::request(&div, 5, 0)).await.unwrap_err();
    assert_eq!(err, RpcError::Remote("division by zero".into()));

    // The proxy is still usable afterwards.
    assert_eq!(eval(&proxy, "div", 9, 3).await?, 3);
    Ok(())
}

#[tokio::test]
async fn test_callback_form_completes_once() -> anyhow::Result<()> {
    // ---
    let proxy = calculator().await?;
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let add = proxy.method("add")?;
    let request = common::request(&add, 20, 22);
    proxy
        .call("add", &request, move |outcome| {
            let _ = tx.send(outcome);
        })
        .await?;

    let outcome = rx.recv().await.expect("completion ran");
    assert_eq!(common::value(&outcome?)?, 42);

    // Sender dropped with the completion: it ran exactly once.
    assert!(rx.recv().await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_concurrent_calls_are_matched() -> anyhow::Result<()> {
    // ---
    let proxy = Arc::new(calculator().await?);

    let calls = (0..64).map(|i| {
        let proxy = proxy.clone();
        async move {
            let op = common::OPERATIONS[i % 4];
            let (lhs, rhs) = (i as i32 * 3, i as i32 % 7 + 1);
            let value = eval(&proxy, op, lhs, rhs).await?;
            anyhow::ensure!(value == common::evaluate(op, lhs, rhs)?, "{op}({lhs}, {rhs}) = {value}");
            Ok::<(), anyhow::Error>(())
        }
    });

    for result in join_all(calls).await {
        result?;
    }
    assert_eq!(proxy.pending_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_method_lookup() -> anyhow::Result<()> {
    // ---
    let proxy = calculator().await?;

    assert_eq!(proxy.methods().count(), 4);
    assert_eq!(proxy.method("add")?.key(), ".Calculator.Service.add");
    assert_eq!(proxy.method(".Calculator.Service.mul")?.name(), "mul");

    let err = proxy.method("pow").err().expect("pow is not declared");
    assert_eq!(err, RpcError::MethodNotFound("pow".into()));

    let err = proxy
        .call("pow", &common::request(&proxy.method("add")?, 1, 1), |_| {
            panic!("completion must not run")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::MethodNotFound(_)));
    Ok(())
}

#[tokio::test]
async fn test_wrong_request_type_fails_call() -> anyhow::Result<()> {
    // ---
    let proxy = calculator().await?;
    let add = proxy.method("add")?;
    let div = proxy.method("div")?;

    let err = div.invoke(&common::request(&add, 1, 1)).await.unwrap_err();
    assert!(matches!(err, RpcError::Encode(_)), "got {err:?}");
    assert_eq!(proxy.pending_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_request_from_separately_loaded_descriptor() -> anyhow::Result<()> {
    // ---
    let proxy = calculator().await?;

    // Same schema, distinct descriptor pool.
    let other = common::service()?;
    let input = other
        .methods()
        .find(|m| m.name() == "add")
        .map(|m| m.input())
        .ok_or_else(|| anyhow::anyhow!("add not declared"))?;

    let mut request = DynamicMessage::new(input);
    request.set_field_by_name("lhs", Value::I32(2));
    request.set_field_by_name("rhs", Value::I32(3));

    let result = proxy.method("add")?.invoke(&request).await?;
    assert_eq!(common::value(&result)?, 5);
    Ok(())
}

#[tokio::test]
async fn test_json_envelope_protocol() -> anyhow::Result<()> {
    // ---
    common::init_logging();

    let server = common::server_with_codecs(Arc::new(JsonEnvelopeCodec), Arc::new(BinaryPayloadCodec))?;
    let proxy = ServiceProxyBuilder::new(common::service()?)
        .address("memory://calculator-json")
        .transport(memory_transport(server))
        .protocol(Protocol::Json)
        .build()
        .await?;

    assert_eq!(eval(&proxy, "mul", -4, 8).await?, -32);
    Ok(())
}

#[tokio::test]
async fn test_close_rejects_later_calls() -> anyhow::Result<()> {
    // ---
    let proxy = calculator().await?;
    proxy.close().await?;

    let add = proxy.method("add")?;
    let err = add.invoke(&common::request(&add, 1, 2)).await.unwrap_err();
    assert_eq!(err, RpcError::ConnectionClosed);
    assert_eq!(proxy.pending_count(), 0);
    Ok(())
}
