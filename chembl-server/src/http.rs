//! JSON-RPC over HTTP.

use std::convert::Infallible;
use std::future::Future;
use std::net::TcpListener;

use hyper::body::to_bytes;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::error::{ServerError, ServerResult};
use crate::protocol::{RpcError, RpcResponse, SharedService, codes, kind_label};
use crate::scheduler::RequestScheduler;

/// Binds a listener for the HTTP transport.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address cannot be bound.
pub fn bind(addr: &str) -> ServerResult<TcpListener> {
    let listener = TcpListener::bind(addr).map_err(|source| ServerError::Bind {
        addr: addr.to_owned(),
        source,
    })?;
    listener
        .set_nonblocking(true)
        .map_err(|source| ServerError::Bind {
            addr: addr.to_owned(),
            source,
        })?;
    Ok(listener)
}

/// Serves `POST /` and `POST /rpc` until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ServerError::Http`] if the server fails.
pub async fn serve<S>(
    service: SharedService,
    scheduler: RequestScheduler,
    listener: TcpListener,
    shutdown: S,
) -> ServerResult<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    let gate = scheduler.clone();
    let shutdown = async move {
        shutdown.await;
        gate.close();
    };
    let make = make_service_fn(move |_| {
        let service = SharedService::clone(&service);
        let scheduler = scheduler.clone();
        async move {
            Ok::<_, Infallible>(service_fn(move |request| {
                handle(SharedService::clone(&service), scheduler.clone(), request)
            }))
        }
    });

    let server = Server::from_tcp(listener)
        .map_err(|source| ServerError::Http { addr, source })?
        .serve(make);
    info!(%addr, "serving on http");
    server
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|source| ServerError::Http { addr, source })?;
    info!(%addr, "http server stopped");
    Ok(())
}

async fn handle(
    service: SharedService,
    scheduler: RequestScheduler,
    request: Request<Body>,
) -> Result<Response<Body>, Infallible> {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    debug!(%method, path = %path, "http request");

    let response = match (&method, path.as_str()) {
        (&Method::POST, "/" | "/rpc") => rpc(&service, &scheduler, request).await,
        (&Method::GET, "/health") => json_response(
            StatusCode::OK,
            json!({ "status": "ok", "tools": service.dispatcher().registry().len() }).to_string(),
        ),
        _ => json_response(
            StatusCode::NOT_FOUND,
            json!({ "error": format!("no route for {method} {path}") }).to_string(),
        ),
    };
    Ok(response)
}

async fn rpc(
    service: &SharedService,
    scheduler: &RequestScheduler,
    request: Request<Body>,
) -> Response<Body> {
    let body = match to_bytes(request.into_body()).await {
        Ok(body) => body,
        Err(err) => {
            warn!(error = %err, "failed to read request body");
            return json_response(
                StatusCode::BAD_REQUEST,
                json!({ "error": "unreadable body" }).to_string(),
            );
        }
    };
    let text = match std::str::from_utf8(&body) {
        Ok(text) => text,
        Err(err) => {
            warn!(error = %err, "request body is not utf-8");
            let response = RpcResponse::failure(
                Value::Null,
                RpcError::new(codes::PARSE_ERROR, format!("parse error: {err}")),
            );
            return json_response(StatusCode::OK, response.to_line());
        }
    };

    match scheduler.run(service.handle_text(text)).await {
        Ok(Some(response)) => {
            if let Some(error) = response.error() {
                debug!(code = error.code(), kind = kind_label(error), "rpc error response");
            }
            json_response(StatusCode::OK, response.to_line())
        }
        Ok(None) => empty(StatusCode::ACCEPTED),
        Err(err) => json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({ "error": err.to_string() }).to_string(),
        ),
    }
}

fn json_response(status: StatusCode, body: String) -> Response<Body> {
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

fn empty(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}
