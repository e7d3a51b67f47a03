mod support;

use chembl_server::{RequestScheduler, http};
use hyper::{Body, Client, Method, Request, StatusCode};
use serde_json::{Value, json};
use tokio::sync::oneshot;

async fn body_json(response: hyper::Response<Body>) -> Value {
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn serves_rpc_and_health_until_shutdown() {
    let (service, _) = support::service();
    let listener = http::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();
    let serving = tokio::spawn(http::serve(
        service,
        RequestScheduler::default(),
        listener,
        async move {
            stopped.await.ok();
        },
    ));

    let client = Client::new();
    let base = format!("http://{addr}");

    let health = client
        .get(format!("{base}/health").parse().unwrap())
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(body_json(health).await, json!({"status": "ok", "tools": 46}));

    let listed = client
        .request(post(
            &format!("{base}/rpc"),
            &json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}),
        ))
        .await
        .unwrap();
    assert_eq!(listed.status(), StatusCode::OK);
    let listed = body_json(listed).await;
    assert_eq!(listed["result"]["tools"].as_array().unwrap().len(), 46);

    let called = client
        .request(post(
            &format!("{base}/"),
            &json!({"jsonrpc": "2.0", "id": "x", "method": "tools/call",
                    "params": {"name": "nope", "arguments": {}}}),
        ))
        .await
        .unwrap();
    let called = body_json(called).await;
    assert_eq!(called["id"], "x");
    assert_eq!(called["error"]["code"], -32000);
    assert_eq!(called["error"]["data"]["kind"], "UnknownOperation");

    let notified = client
        .request(post(
            &format!("{base}/rpc"),
            &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        ))
        .await
        .unwrap();
    assert_eq!(notified.status(), StatusCode::ACCEPTED);

    let garbled = client
        .request(
            Request::builder()
                .method(Method::POST)
                .uri(format!("{base}/rpc"))
                .body(Body::from(vec![b'{', 0xff, 0xfe, b'}']))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(garbled.status(), StatusCode::OK);
    let garbled = body_json(garbled).await;
    assert_eq!(garbled["id"], Value::Null);
    assert_eq!(garbled["error"]["code"], -32700);

    let missing = client
        .get(format!("{base}/tools").parse().unwrap())
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    stop.send(()).unwrap();
    serving.await.unwrap().unwrap();
}
