use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use chembl_client::chembl::{ChemblClient, ChemblConfig};
use chembl_client::traits::{ChemUtilities, ClientError, DataService, Resource, UtilityFunction};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Request, Response, Server, StatusCode};
use serde_json::json;

async fn upstream(request: Request<Body>) -> Result<Response<Body>, Infallible> {
    let path = request.uri().path().to_owned();
    let query = request.uri().query().unwrap_or_default().to_owned();
    let body = hyper::body::to_bytes(request.into_body())
        .await
        .unwrap_or_default();

    let response = match path.as_str() {
        "/api/data/drug.json" => json_response(json!({
            "page_meta": {"limit": 20, "offset": 0, "total_count": 1},
            "drugs": [{"molecule_chembl_id": "CHEMBL25", "query": query}]
        })),
        "/api/data/status.json" => {
            json_response(json!({"status": "UP", "chembl_db_version": "ChEMBL_34"}))
        }
        "/api/utils/canonicalizeSmiles" => Response::new(Body::from(format!(
            "{}\n",
            String::from_utf8_lossy(&body)
        ))),
        "/api/utils/is3D" => json_response(json!(false)),
        "/api/data/slow.json" | "/api/utils/standardize" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            json_response(json!([]))
        }
        _ => {
            let mut response = Response::new(Body::from("not here"));
            *response.status_mut() = StatusCode::NOT_FOUND;
            response
        }
    };
    Ok(response)
}

fn json_response(value: serde_json::Value) -> Response<Body> {
    let mut response = Response::new(Body::from(value.to_string()));
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}

fn spawn_upstream() -> SocketAddr {
    let make = make_service_fn(|_| async { Ok::<_, Infallible>(service_fn(upstream)) });
    let server = Server::bind(&([127, 0, 0, 1], 0).into()).serve(make);
    let addr = server.local_addr();
    tokio::spawn(server);
    addr
}

fn client_for(addr: SocketAddr) -> ChemblClient {
    let config = ChemblConfig::new()
        .with_base_url(format!("http://{addr}/api"))
        .unwrap()
        .with_timeout(Duration::from_millis(300));
    ChemblClient::new(config)
}

#[tokio::test]
async fn filter_returns_collection_records() {
    let client = client_for(spawn_upstream());

    let records = client
        .filter(Resource::Drug, &[("drug_type".to_owned(), json!("1"))])
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["molecule_chembl_id"], "CHEMBL25");
    assert_eq!(records[0]["query"], "drug_type=1&limit=20");
}

#[tokio::test]
async fn utilities_parse_text_and_json() {
    let client = client_for(spawn_upstream());

    let smiles = client
        .call(
            UtilityFunction::CanonicalizeSmiles,
            &[("smiles".to_owned(), json!("OCC"))],
        )
        .await
        .unwrap();
    assert_eq!(smiles, json!("OCC"));

    let flat = client
        .call(UtilityFunction::Is3D, &[("smiles".to_owned(), json!("C"))])
        .await
        .unwrap();
    assert_eq!(flat, json!(false));

    let status = client.call(UtilityFunction::Status, &[]).await.unwrap();
    assert_eq!(status["status"], "UP");
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let client = client_for(spawn_upstream());

    let err = client.all(Resource::Tissue).await.unwrap_err();

    match err {
        ClientError::Status { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "not here");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn slow_upstream_hits_client_timeout() {
    let client = client_for(spawn_upstream());

    let err = client
        .call(UtilityFunction::Standardize, &[("smiles".to_owned(), json!("C"))])
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::TimedOut { .. }));
}
