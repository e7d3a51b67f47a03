//! JSON-RPC 2.0 framing over the tool dispatcher.

use std::sync::Arc;

use chembl_tools::{ErrorKind, InvocationError, ToolDispatcher};
use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

/// Protocol revision reported when the client does not ask for one.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name reported in `initialize`.
pub const SERVER_NAME: &str = "chembl-mcp";

/// Standard and server-defined JSON-RPC error codes.
pub mod codes {
    /// Body is not valid JSON.
    pub const PARSE_ERROR: i64 = -32700;
    /// Not a valid request object.
    pub const INVALID_REQUEST: i64 = -32600;
    /// Method does not exist.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Invalid method parameters.
    pub const INVALID_PARAMS: i64 = -32602;
    /// A tool invocation failed.
    pub const TOOL_FAILURE: i64 = -32000;
}

/// JSON-RPC error object.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RpcError {
    code: i64,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl RpcError {
    /// Creates an error without data.
    #[must_use]
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attaches structured data.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Error code.
    #[must_use]
    pub const fn code(&self) -> i64 {
        self.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Structured data, if any.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }
}

impl From<&InvocationError> for RpcError {
    fn from(err: &InvocationError) -> Self {
        let mut data = Map::new();
        data.insert("kind".into(), json!(err.kind()));
        data.insert("message".into(), Value::String(err.to_string()));
        data.insert("operation".into(), Value::String(err.operation().to_owned()));
        match err {
            InvocationError::InvalidArguments { problems, .. } => {
                data.insert("problems".into(), json!(problems));
            }
            InvocationError::Timeout { deadline, .. } => {
                let millis = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
                data.insert("deadlineMs".into(), json!(millis));
            }
            InvocationError::UnknownOperation { .. } | InvocationError::UpstreamFailure { .. } => {}
        }
        Self::new(codes::TOOL_FAILURE, err.to_string()).with_data(Value::Object(data))
    }
}

/// JSON-RPC response envelope.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

impl RpcResponse {
    /// Successful response.
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Error response.
    #[must_use]
    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Request id echoed back.
    #[must_use]
    pub fn id(&self) -> &Value {
        &self.id
    }

    /// Result payload on success.
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        self.result.as_ref()
    }

    /// Error payload on failure.
    #[must_use]
    pub fn error(&self) -> Option<&RpcError> {
        self.error.as_ref()
    }

    /// Serialises the response as a single JSON line without the newline.
    #[must_use]
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            format!(
                r#"{{"jsonrpc":"2.0","id":null,"error":{{"code":-32603,"message":"failed to encode response: {err}"}}}}"#
            )
        })
    }
}

struct Call {
    id: Option<Value>,
    method: String,
    params: Value,
}

/// Routes JSON-RPC messages to the dispatcher.
#[derive(Clone, Debug)]
pub struct RpcService {
    dispatcher: ToolDispatcher,
}

impl RpcService {
    /// Creates a service over `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: ToolDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &ToolDispatcher {
        &self.dispatcher
    }

    /// Handles one raw message. Returns `None` for notifications.
    pub async fn handle_text(&self, text: &str) -> Option<RpcResponse> {
        match serde_json::from_str::<Value>(text) {
            Ok(message) => self.handle_value(message).await,
            Err(err) => {
                warn!(error = %err, "failed to parse request");
                Some(RpcResponse::failure(
                    Value::Null,
                    RpcError::new(codes::PARSE_ERROR, format!("parse error: {err}")),
                ))
            }
        }
    }

    /// Handles one decoded message. Returns `None` for notifications.
    pub async fn handle_value(&self, message: Value) -> Option<RpcResponse> {
        let call = match parse_call(message) {
            Ok(call) => call,
            Err((id, error)) => {
                warn!(code = error.code(), reason = error.message(), "invalid request");
                return Some(RpcResponse::failure(id, error));
            }
        };

        debug!(method = %call.method, id = ?call.id, "handling request");
        let outcome = self.route(&call.method, call.params).await;

        let Some(id) = call.id else {
            if let Err(err) = outcome {
                warn!(method = %call.method, reason = err.message(), "notification failed");
            }
            return None;
        };
        Some(match outcome {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => RpcResponse::failure(id, error),
        })
    }

    async fn route(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(self.initialize(&params)),
            "initialized" | "notifications/initialized" | "ping" => Ok(json!({})),
            "tools/list" => Ok(self.list_tools()),
            "tools/call" => self.call_tool(params).await,
            other => Err(RpcError::new(
                codes::METHOD_NOT_FOUND,
                format!("method not found: {other}"),
            )),
        }
    }

    fn initialize(&self, params: &Value) -> Value {
        let version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(PROTOCOL_VERSION);
        info!(
            protocol_version = version,
            tools = self.dispatcher.registry().len(),
            "client initialised"
        );
        json!({
            "protocolVersion": version,
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {
                "tools": { "listChanged": false },
            },
        })
    }

    /// Discovery payload for `tools/list`.
    #[must_use]
    pub fn list_tools(&self) -> Value {
        let tools: Vec<Value> = self
            .dispatcher
            .describe()
            .with_deadlines()
            .map(|(descriptor, deadline)| {
                json!({
                    "name": descriptor.name(),
                    "description": descriptor.description(),
                    "inputSchema": descriptor.input_schema(),
                    "returns": descriptor.returns(),
                    "category": descriptor.category(),
                    "deadlineMs": u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                })
            })
            .collect();
        json!({ "tools": tools })
    }

    async fn call_tool(&self, params: Value) -> Result<Value, RpcError> {
        let Value::Object(mut params) = params else {
            return Err(RpcError::new(
                codes::INVALID_PARAMS,
                "tools/call params must be an object",
            ));
        };
        let name = match params.remove("name") {
            Some(Value::String(name)) => name,
            _ => {
                return Err(RpcError::new(
                    codes::INVALID_PARAMS,
                    "tools/call requires a string `name`",
                ));
            }
        };
        let arguments = params.remove("arguments").unwrap_or(Value::Null);

        match self.dispatcher.invoke(&name, arguments).await {
            Ok(value) => Ok(tool_result(value)),
            Err(err) => Err(RpcError::from(&err)),
        }
    }
}

fn tool_result(value: Value) -> Value {
    let text = match &value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    };
    json!({
        "content": [{ "type": "text", "text": text }],
        "structuredContent": value,
        "isError": false,
    })
}

fn parse_call(message: Value) -> Result<Call, (Value, RpcError)> {
    let Value::Object(mut fields) = message else {
        return Err((
            Value::Null,
            RpcError::new(codes::INVALID_REQUEST, "request must be a JSON object"),
        ));
    };
    let id = fields.remove("id");
    let reply_id = id.clone().unwrap_or(Value::Null);

    if fields.get("jsonrpc").and_then(Value::as_str) != Some("2.0") {
        return Err((
            reply_id,
            RpcError::new(codes::INVALID_REQUEST, "jsonrpc must be \"2.0\"")
                .with_data(json!({ "expected": "2.0", "got": fields.get("jsonrpc") })),
        ));
    }
    let method = match fields.remove("method") {
        Some(Value::String(method)) => method,
        _ => {
            return Err((
                reply_id,
                RpcError::new(codes::INVALID_REQUEST, "request requires a string `method`"),
            ));
        }
    };

    Ok(Call {
        id,
        method,
        params: fields.remove("params").unwrap_or(Value::Null),
    })
}

/// Shared handle used by the transports.
pub type SharedService = Arc<RpcService>;

/// Wire name of an error kind, for logging at the transport edge.
#[must_use]
pub fn kind_label(error: &RpcError) -> &str {
    error
        .data()
        .and_then(|data| data.get("kind"))
        .and_then(Value::as_str)
        .unwrap_or(match error.code() {
            codes::TOOL_FAILURE => ErrorKind::UpstreamFailure.as_str(),
            _ => "protocol",
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chembl_primitives::{OperationName, ParamSpec, ParamType, ResultShape};
    use chembl_tools::{Arguments, OperationDescriptor, OperationResult, RegistryBuilder};

    async fn echo(args: Arguments) -> OperationResult {
        Ok(args.get("x").cloned().unwrap_or(Value::Null))
    }

    async fn stall(_: Arguments) -> OperationResult {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Value::Null)
    }

    fn service() -> RpcService {
        let mut builder = RegistryBuilder::default();
        let echo_desc =
            OperationDescriptor::builder(OperationName::new("echo").unwrap(), ResultShape::Text)
                .description("Echo x.")
                .param(ParamSpec::required("x", ParamType::String).unwrap())
                .build()
                .unwrap();
        builder.register(echo_desc, echo).unwrap();
        let stall_desc =
            OperationDescriptor::builder(OperationName::new("stall").unwrap(), ResultShape::Text)
                .build()
                .unwrap();
        builder
            .register_with_deadline(stall_desc, Duration::from_millis(50), stall)
            .unwrap();
        RpcService::new(ToolDispatcher::new(Arc::new(builder.build())))
    }

    async fn send(service: &RpcService, request: Value) -> RpcResponse {
        service.handle_text(&request.to_string()).await.unwrap()
    }

    fn call(id: Value, name: &str, arguments: Value) -> Value {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": name, "arguments": arguments },
        })
    }

    #[tokio::test]
    async fn call_success_is_framed_as_tool_content() {
        let response = send(&service(), call(json!(7), "echo", json!({"x": "hi"}))).await;

        assert_eq!(response.id(), &json!(7));
        let result = response.result().unwrap();
        assert_eq!(result["content"][0]["text"], "hi");
        assert_eq!(result["structuredContent"], "hi");
        assert_eq!(result["isError"], false);
    }

    #[tokio::test]
    async fn invalid_arguments_carry_problems() {
        let response = send(&service(), call(json!("a"), "echo", json!({"x": 3, "y": 1}))).await;

        let error = response.error().unwrap();
        assert_eq!(error.code(), codes::TOOL_FAILURE);
        let data = error.data().unwrap();
        assert_eq!(data["kind"], "InvalidArguments");
        assert_eq!(data["operation"], "echo");
        assert_eq!(data["problems"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn timeout_reports_deadline() {
        let response = send(&service(), call(json!(1), "stall", Value::Null)).await;

        let data = response.error().unwrap().data().unwrap().clone();
        assert_eq!(data["kind"], "Timeout");
        assert_eq!(data["deadlineMs"], 50);
        assert_eq!(kind_label(response.error().unwrap()), "Timeout");
    }

    #[tokio::test]
    async fn protocol_errors_use_standard_codes() {
        let service = service();
        let cases = [
            ("{not json", codes::PARSE_ERROR),
            ("[1,2]", codes::INVALID_REQUEST),
            (r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#, codes::INVALID_REQUEST),
            (r#"{"jsonrpc":"2.0","id":1}"#, codes::INVALID_REQUEST),
            (
                r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#,
                codes::METHOD_NOT_FOUND,
            ),
            (
                r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":[]}"#,
                codes::INVALID_PARAMS,
            ),
            (
                r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":5}}"#,
                codes::INVALID_PARAMS,
            ),
        ];
        for (text, code) in cases {
            let response = service.handle_text(text).await.unwrap();
            assert_eq!(response.error().unwrap().code(), code, "{text}");
        }
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let service = service();
        assert!(
            service
                .handle_text(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .await
                .is_none()
        );
        assert!(
            service
                .handle_text(r#"{"jsonrpc":"2.0","method":"unknown/thing"}"#)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn list_reports_schema_and_deadline() {
        let list = service().list_tools();
        let tools = list["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0]["name"], "echo");
        assert_eq!(tools[0]["returns"], "text");
        assert_eq!(tools[0]["category"], "utility");
        assert_eq!(tools[0]["deadlineMs"], 5000);
        assert_eq!(tools[0]["inputSchema"]["required"], json!(["x"]));
        assert_eq!(tools[1]["deadlineMs"], 50);
    }

    #[tokio::test]
    async fn initialize_echoes_requested_version() {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 0,
            "method": "initialize",
            "params": { "protocolVersion": "2025-03-26" },
        });
        let response = send(&service(), request).await;
        let result = response.result().unwrap();
        assert_eq!(result["protocolVersion"], "2025-03-26");
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
    }
}
