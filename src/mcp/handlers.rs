//! HTTP Request Handlers
//!
//! Each request goes through the same steps: the body is streamed into one
//! buffer, parsed (with JSON recovery as fallback), dispatched and answered.
//! Nothing is kept between requests.
//!
//! Two facades share the registry's dispatcher:
//! - `POST /mcp`: JSON-RPC 2.0. Once a request is parsed it is answered with
//!   HTTP 200 and any failure travels inside the JSON-RPC error object.
//! - `POST /api/{category}/{tool}`: plain JSON. Failures use HTTP status codes.
//!
//! The mapping from `DispatchError` to each facade's error shape lives in
//! [`rpc_error`] and [`rest_status`].

use std::sync::Arc;

use actix_web::{
    HttpRequest, HttpResponse, ResponseError,
    http::{Method, StatusCode},
    middleware::DefaultHeaders,
    web,
};
use bytes::BytesMut;
use futures_util::StreamExt;
use serde_json::{Value, json};
use thiserror::Error;

use crate::mcp::config::Settings;
use crate::mcp::protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, MCPError, MCPRequest, MCPResponse, PARSE_ERROR,
    PROTOCOL_VERSION, ToolCallParams, ToolResponse,
};
use crate::mcp::recovery;
use crate::mcp::registry::{DispatchError, ToolRegistry, ToolRegistryEntry};
use crate::mcp::schema::sample_arguments;

const INVALID_API_PATH: &str = "Invalid API path. Use /api/{category}/{tool_name}";

/// State shared by every worker.
pub struct AppState {
    /// Server name reported in `initialize`
    pub server_name: String,
    /// Server version reported in `initialize`
    pub server_version: String,
    /// Port the listener is bound to, used in generated curl examples
    pub port: u16,
    /// Largest request body accepted
    pub max_body_bytes: usize,
    pub registry: Arc<ToolRegistry>,
}

impl AppState {
    pub fn new(settings: &Settings, port: u16, registry: Arc<ToolRegistry>) -> Self {
        Self {
            server_name: settings.server_name.clone(),
            server_version: settings.server_version.clone(),
            port,
            max_body_bytes: settings.max_body_bytes,
            registry,
        }
    }
}

/// Failures outside the protocol, answered with a generic 500.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to read request body: {0}")]
    Payload(#[from] actix_web::error::PayloadError),
    #[error("request body exceeds {0} bytes")]
    BodyTooLarge(usize),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        tracing::error!(error = %self, "request failed");
        HttpResponse::InternalServerError().json(json!({ "error": "Internal server error" }))
    }
}

/// Register all routes.
///
/// Every resource answers `OPTIONS` with 200 and any other unmatched method
/// with 404, the same as unknown paths.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(resource("/mcp").route(web::post().to(mcp_handler)))
        .service(resource("/health").route(web::get().to(health)))
        .service(resource("/api/tools").route(web::get().to(list_api_tools)))
        .service(resource("/api/{tail:.*}").route(web::post().to(rest_tool_call)))
        .default_service(web::to(fallback));
}

/// CORS and security headers added to every response.
///
/// The listener only binds to loopback, so any origin is allowed.
pub fn default_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
        .add(("Access-Control-Allow-Headers", "Content-Type, Authorization"))
        .add(("X-Content-Type-Options", "nosniff"))
}

fn resource(path: &str) -> actix_web::Resource {
    web::resource(path).default_service(web::to(fallback))
}

async fn fallback(req: HttpRequest) -> HttpResponse {
    if req.method() == Method::OPTIONS {
        HttpResponse::Ok().finish()
    } else {
        HttpResponse::NotFound().json(json!({ "error": "Not found" }))
    }
}

/// Accumulate the streamed request body.
async fn read_body(mut payload: web::Payload, limit: usize) -> Result<String, ServerError> {
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk?;
        if body.len() + chunk.len() > limit {
            return Err(ServerError::BodyTooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// Health check endpoint handler.
///
/// Reports liveness and the number of currently published tools.
async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "tools": state.registry.len()
    }))
}

/// MCP JSON-RPC endpoint.
///
/// Parse failures are answered with HTTP 400 and a `-32700` error; everything
/// that gets as far as dispatch is answered with HTTP 200.
async fn mcp_handler(
    state: web::Data<AppState>,
    payload: web::Payload,
) -> Result<HttpResponse, ServerError> {
    let body = read_body(payload, state.max_body_bytes).await?;

    let value = match recovery::parse_body(&body) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err.message, "rejecting unparseable MCP request");
            let response = MCPResponse::failure(None, MCPError::new(PARSE_ERROR, err.to_string()));
            return Ok(HttpResponse::BadRequest().json(response));
        }
    };

    let request: MCPRequest = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(err) => {
            let error = MCPError::new(INVALID_REQUEST, format!("Invalid Request: {err}"));
            return Ok(HttpResponse::BadRequest().json(MCPResponse::failure(None, error)));
        }
    };

    if request.is_notification() {
        tracing::debug!(method = %request.method, "notification acknowledged");
        return Ok(HttpResponse::Accepted().finish());
    }

    Ok(HttpResponse::Ok().json(handle_request(&state, request).await))
}

/// Answer one JSON-RPC request.
///
/// # Arguments
/// * `state` - Shared server state holding the registry and server info
/// * `request` - Parsed JSON-RPC request
pub async fn handle_request(state: &AppState, request: MCPRequest) -> MCPResponse {
    tracing::debug!(method = %request.method, "handling MCP request");

    let outcome = match request.method.as_str() {
        "initialize" => Ok(initialize_result(state)),
        "tools/list" => Ok(json!({ "tools": state.registry.list() })),
        "tools/call" => call_tool(&state.registry, request.params).await,
        "ping" => Ok(json!({})),
        other => Err(MCPError::new(INTERNAL_ERROR, format!("Unknown method: {other}"))),
    };

    match outcome {
        Ok(result) => MCPResponse::success(request.id, result),
        Err(error) => MCPResponse::failure(request.id, error),
    }
}

fn initialize_result(state: &AppState) -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {}
        },
        "serverInfo": {
            "name": state.server_name,
            "version": state.server_version
        }
    })
}

async fn call_tool(registry: &ToolRegistry, params: Option<Value>) -> Result<Value, MCPError> {
    let params = params.ok_or_else(|| MCPError::new(INVALID_PARAMS, "Invalid params"))?;
    let call: ToolCallParams = serde_json::from_value(params)
        .map_err(|err| MCPError::new(INVALID_PARAMS, format!("Invalid params: {err}")))?;
    let arguments = call.arguments.unwrap_or_else(|| json!({}));

    let response = registry
        .dispatch(&call.name, arguments)
        .await
        .map_err(|err| rpc_error(&err))?;
    Ok(tool_call_result(&response))
}

/// Wrap a tool response in a single MCP text content block.
pub fn tool_call_result(response: &ToolResponse) -> Value {
    json!({
        "content": [
            {
                "type": "text",
                "text": serde_json::to_string(response).unwrap_or_default()
            }
        ]
    })
}

/// JSON-RPC error for a failed dispatch.
pub fn rpc_error(err: &DispatchError) -> MCPError {
    MCPError::new(INTERNAL_ERROR, err.to_string())
}

/// HTTP status of the REST facade for a failed dispatch.
pub fn rest_status(err: &DispatchError) -> StatusCode {
    match err {
        DispatchError::NotFound(_) | DispatchError::Tool(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Direct tool invocation: `POST /api/{category}/{tool}` with the arguments as
/// the JSON body.
async fn rest_tool_call(
    req: HttpRequest,
    state: web::Data<AppState>,
    payload: web::Payload,
) -> Result<HttpResponse, ServerError> {
    let path = req.path().to_string();
    let segments: Vec<&str> = path
        .strip_prefix("/api/")
        .unwrap_or_default()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    let &[category, tool] = segments.as_slice() else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "success": false,
            "error": INVALID_API_PATH,
            "tool": path
        })));
    };

    let body = read_body(payload, state.max_body_bytes).await?;
    let args = if body.trim().is_empty() {
        json!({})
    } else {
        match recovery::parse_body(&body) {
            Ok(args) => args,
            Err(err) => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "success": false,
                    "error": err.to_string(),
                    "tool": path
                })));
            }
        }
    };

    match state.registry.dispatch_parts(category, tool, args).await {
        Ok(result) => Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "tool": format!("{category}_{tool}"),
            "result": result
        }))),
        Err(err) => Ok(HttpResponse::build(rest_status(&err)).json(json!({
            "success": false,
            "error": err.to_string(),
            "tool": path
        }))),
    }
}

/// Developer introspection: every published tool with sample arguments and a
/// ready-to-run curl command for the REST facade.
async fn list_api_tools(state: web::Data<AppState>) -> HttpResponse {
    let tools: Vec<Value> = state
        .registry
        .list()
        .iter()
        .map(|tool| api_tool_description(tool, state.port))
        .collect();
    HttpResponse::Ok().json(json!({ "tools": tools }))
}

fn api_tool_description(tool: &ToolRegistryEntry, port: u16) -> Value {
    let api_path = format!("/api/{}/{}", tool.category, tool.method);
    let sample = sample_arguments(&tool.input_schema);
    let curl = curl_example(port, &api_path, &sample);
    json!({
        "name": tool.name,
        "category": tool.category,
        "toolName": tool.method,
        "description": tool.description,
        "apiPath": api_path,
        "sampleParams": sample,
        "curlExample": curl
    })
}

fn curl_example(port: u16, api_path: &str, sample: &Value) -> String {
    let body = serde_json::to_string(sample).unwrap_or_else(|_| "{}".to_string());
    format!(
        "curl -X POST http://127.0.0.1:{port}{api_path} \\\n  -H \"Content-Type: application/json\" \\\n  -d '{body}'"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::registry::EnabledTool;
    use crate::mcp::testing::StubExecutor;
    use actix_web::{App, test};

    fn state_with(registry: ToolRegistry) -> web::Data<AppState> {
        web::Data::new(AppState::new(&Settings::default(), 8585, Arc::new(registry)))
    }

    fn node_registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry
            .register("node", Arc::new(StubExecutor::new(&["create_node", "get_node_info", "fail"])))
            .unwrap();
        registry
    }

    macro_rules! app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data($state.clone())
                    .wrap(default_headers())
                    .configure(configure),
            )
            .await
        };
    }

    async fn post_mcp(state: &web::Data<AppState>, body: &str) -> (StatusCode, Value) {
        let app = app!(state);
        let req = test::TestRequest::post().uri("/mcp").set_payload(body.to_string()).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        (status, test::read_body_json(resp).await)
    }

    #[actix_rt::test]
    async fn initialize_advertises_tools_only() {
        let state = state_with(ToolRegistry::new());
        let (status, body) =
            post_mcp(&state, r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(body["result"]["capabilities"], json!({"tools": {}}));
        assert_eq!(body["result"]["serverInfo"]["name"], "cocos-mcp-server");
    }

    #[actix_rt::test]
    async fn tools_list_matches_registry() {
        let state = state_with(node_registry());
        let (status, body) =
            post_mcp(&state, r#"{"jsonrpc":"2.0","id":1,"method":"tools/list","params":{}}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["jsonrpc"], "2.0");
        assert_eq!(body["id"], 1);
        let tools = body["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), state.registry.list().len());
        assert_eq!(tools[0]["name"], "node_create_node");
        assert!(tools[0].get("inputSchema").is_some());
    }

    #[actix_rt::test]
    async fn tools_list_follows_filter_updates() {
        let state = state_with(node_registry());
        state.registry.update_filter(vec![EnabledTool::new("node", "get_node_info")]);

        let (_, body) = post_mcp(&state, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#).await;
        assert_eq!(body["result"]["tools"], json!([{
            "name": "node_get_node_info",
            "description": "stub get_node_info",
            "inputSchema": {"type": "object", "properties": {"name": {"type": "string"}}}
        }]));
    }

    #[actix_rt::test]
    async fn tools_call_wraps_response_in_text_content() {
        let state = state_with(node_registry());
        let (status, body) = post_mcp(
            &state,
            r#"{"jsonrpc":"2.0","id":"a","method":"tools/call","params":{"name":"node_create_node","arguments":{"name":"Foo"}}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "a");
        let content = &body["result"]["content"][0];
        assert_eq!(content["type"], "text");
        let inner: ToolResponse = serde_json::from_str(content["text"].as_str().unwrap()).unwrap();
        assert_eq!(inner, StubExecutor::reply("create_node", &json!({"name": "Foo"})));
    }

    #[actix_rt::test]
    async fn tools_call_without_arguments_sends_empty_object() {
        let state = state_with(node_registry());
        let (_, body) = post_mcp(
            &state,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"node_get_node_info"}}"#,
        )
        .await;

        let inner: Value = serde_json::from_str(body["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(inner["data"]["args"], json!({}));
    }

    #[actix_rt::test]
    async fn tools_call_unknown_tool_is_rpc_error() {
        let state = state_with(node_registry());
        let (status, body) = post_mcp(
            &state,
            r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"nonexistent_tool","arguments":{}}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["error"],
            json!({"code": -32603, "message": "Tool nonexistent_tool not found"})
        );
    }

    #[actix_rt::test]
    async fn tools_call_collaborator_error_is_passed_through() {
        let state = state_with(node_registry());
        let (status, body) = post_mcp(
            &state,
            r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"node_fail"}}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["error"]["message"], StubExecutor::FAILURE);
    }

    #[actix_rt::test]
    async fn tools_call_without_params_is_invalid() {
        let state = state_with(node_registry());
        let (_, body) = post_mcp(&state, r#"{"jsonrpc":"2.0","id":6,"method":"tools/call"}"#).await;
        assert_eq!(body["error"]["code"], -32602);
    }

    #[actix_rt::test]
    async fn unknown_method_is_rpc_error() {
        let state = state_with(ToolRegistry::new());
        let (status, body) = post_mcp(&state, r#"{"jsonrpc":"2.0","id":9,"method":"bogus"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"jsonrpc": "2.0", "id": 9, "error": {"code": -32603, "message": "Unknown method: bogus"}})
        );
    }

    #[actix_rt::test]
    async fn unparseable_body_is_400_parse_error() {
        let state = state_with(ToolRegistry::new());
        let (status, body) = post_mcp(&state, "this is not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["id"], Value::Null);
        assert_eq!(body["error"]["code"], -32700);
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.starts_with("JSON parsing failed: "));
        assert!(message.ends_with("Original body: this is not json"));
    }

    #[actix_rt::test]
    async fn recoverable_body_is_dispatched() {
        let state = state_with(node_registry());
        let (status, body) =
            post_mcp(&state, "{'jsonrpc': '2.0', 'id': 10, 'method': 'tools/list',}").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 10);
        assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 3);
    }

    #[actix_rt::test]
    async fn non_object_body_is_invalid_request() {
        let state = state_with(ToolRegistry::new());
        let (status, body) = post_mcp(&state, "[1, 2, 3]").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32600);
    }

    #[actix_rt::test]
    async fn notifications_are_accepted_without_body() {
        let state = state_with(ToolRegistry::new());
        let app = app!(state);
        let req = test::TestRequest::post()
            .uri("/mcp")
            .set_payload(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert!(test::read_body(resp).await.is_empty());
    }

    #[actix_rt::test]
    async fn oversized_body_is_internal_error() {
        let registry = Arc::new(ToolRegistry::new());
        let mut settings = Settings::default();
        settings.max_body_bytes = 16;
        let state = web::Data::new(AppState::new(&settings, 8585, registry));

        let (status, body) = post_mcp(&state, r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Internal server error"}));
    }

    #[actix_rt::test]
    async fn health_reports_tool_count() {
        let state = state_with(ToolRegistry::new());
        let app = app!(state);
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"status": "ok", "tools": 0}));

        let state = state_with(node_registry());
        let app = app!(state);
        let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["tools"], 3);
    }

    async fn post_api(state: &web::Data<AppState>, uri: &str, body: &str) -> (StatusCode, Value) {
        let app = app!(state);
        let req = test::TestRequest::post().uri(uri).set_payload(body.to_string()).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        (status, test::read_body_json(resp).await)
    }

    #[actix_rt::test]
    async fn rest_call_returns_tool_result() {
        let state = state_with(node_registry());
        let (status, body) = post_api(&state, "/api/node/create_node", r#"{"name":"Foo"}"#).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "success": true,
                "tool": "node_create_node",
                "result": StubExecutor::reply("create_node", &json!({"name": "Foo"}))
            })
        );
    }

    #[actix_rt::test]
    async fn rest_call_with_empty_body_uses_empty_arguments() {
        let state = state_with(node_registry());
        let (status, body) = post_api(&state, "/api/node/get_node_info", "").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["data"]["args"], json!({}));
    }

    #[actix_rt::test]
    async fn rest_call_unknown_tool_is_500() {
        let state = state_with(node_registry());
        let (status, body) = post_api(&state, "/api/node/nonexistent", "{}").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({
                "success": false,
                "error": "Tool node_nonexistent not found",
                "tool": "/api/node/nonexistent"
            })
        );
    }

    #[actix_rt::test]
    async fn rest_call_with_bad_path_is_400() {
        let state = state_with(node_registry());
        let (status, body) = post_api(&state, "/api/node", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], INVALID_API_PATH);

        let (status, _) = post_api(&state, "/api/node/create_node/extra", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_rt::test]
    async fn rest_call_with_bad_json_is_400() {
        let state = state_with(node_registry());
        let (status, body) = post_api(&state, "/api/node/create_node", "{name").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["tool"], "/api/node/create_node");
        assert!(body["error"].as_str().unwrap().starts_with("JSON parsing failed"));
    }

    #[actix_rt::test]
    async fn api_tools_lists_curl_examples() {
        let mut registry = ToolRegistry::new();
        let schema = json!({
            "type": "object",
            "properties": {"active": {"type": "boolean"}, "name": {"type": "string", "default": "Node"}}
        });
        registry
            .register("node", Arc::new(StubExecutor::with_schema("create_node", schema)))
            .unwrap();
        let state = state_with(registry);
        let app = app!(state);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/tools").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        let tool = &body["tools"][0];

        assert_eq!(tool["name"], "node_create_node");
        assert_eq!(tool["category"], "node");
        assert_eq!(tool["toolName"], "create_node");
        assert_eq!(tool["apiPath"], "/api/node/create_node");
        assert_eq!(tool["sampleParams"], json!({"active": true, "name": "Node"}));
        assert_eq!(
            tool["curlExample"],
            "curl -X POST http://127.0.0.1:8585/api/node/create_node \\\n  -H \"Content-Type: application/json\" \\\n  -d '{\"active\":true,\"name\":\"Node\"}'"
        );
    }

    #[actix_rt::test]
    async fn options_is_allowed_everywhere_with_cors_headers() {
        let state = state_with(ToolRegistry::new());
        let app = app!(state);

        for uri in ["/mcp", "/anything/else"] {
            let req = test::TestRequest::default().method(Method::OPTIONS).uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_cors_headers(resp.headers());
            assert!(test::read_body(resp).await.is_empty());
        }
    }

    fn assert_cors_headers(headers: &actix_web::http::header::HeaderMap) {
        assert_eq!(headers.get("Access-Control-Allow-Origin").unwrap(), "*");
        assert_eq!(headers.get("Access-Control-Allow-Methods").unwrap(), "GET, POST, OPTIONS");
        assert_eq!(
            headers.get("Access-Control-Allow-Headers").unwrap(),
            "Content-Type, Authorization"
        );
    }

    #[actix_rt::test]
    async fn every_response_carries_cors_headers() {
        let state = state_with(node_registry());
        let app = app!(state);

        let cases = [
            (
                test::TestRequest::post()
                    .uri("/mcp")
                    .set_payload(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
                    .to_request(),
                StatusCode::OK,
            ),
            (test::TestRequest::get().uri("/health").to_request(), StatusCode::OK),
            (test::TestRequest::get().uri("/nowhere").to_request(), StatusCode::NOT_FOUND),
            (
                test::TestRequest::post().uri("/mcp").set_payload("not json").to_request(),
                StatusCode::BAD_REQUEST,
            ),
            (
                test::TestRequest::post()
                    .uri("/api/node/nonexistent")
                    .set_payload("{}")
                    .to_request(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (req, expected) in cases {
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), expected);
            assert_cors_headers(resp.headers());
        }
    }

    #[actix_rt::test]
    async fn unmatched_routes_are_404() {
        let state = state_with(ToolRegistry::new());
        let app = app!(state);

        for req in [
            test::TestRequest::get().uri("/nowhere").to_request(),
            test::TestRequest::get().uri("/mcp").to_request(),
            test::TestRequest::post().uri("/health").to_request(),
        ] {
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body, json!({"error": "Not found"}));
        }
    }

    #[test]
    fn facade_status_adapters() {
        let not_found = DispatchError::NotFound("node_x".to_string());
        let failed = DispatchError::Tool("editor busy".to_string());

        assert_eq!(rpc_error(&not_found), MCPError::new(-32603, "Tool node_x not found"));
        assert_eq!(rpc_error(&failed), MCPError::new(-32603, "editor busy"));
        assert_eq!(rest_status(&not_found), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(rest_status(&failed), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
