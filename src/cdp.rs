use crate::error::{Result, VerifyError};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};
use url::Url;

type CdpSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// CDP message structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdpMessage {
    pub id: Option<u64>,
    pub method: Option<String>,
    pub params: Option<Value>,
    pub result: Option<Value>,
    pub error: Option<CdpError>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdpError {
    pub code: i32,
    pub message: String,
    pub data: Option<Value>,
}

/// Chrome tab information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "webSocketDebuggerUrl")]
    pub websocket_debugger_url: Option<String>,
}

/// CDP client holding one DevTools session per tab.
///
/// Remote object ids are scoped to the session that created them, so all
/// commands share a single WebSocket connection and responses are matched
/// to requests by id.
pub struct CdpClient {
    socket: Option<Mutex<CdpSocket>>,
    message_id: AtomicU64,
    chrome_host: String,
    chrome_port: u16,
    tab_id: Option<String>,
}

impl CdpClient {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            socket: None,
            message_id: AtomicU64::new(1),
            chrome_host: host.to_string(),
            chrome_port: port,
            tab_id: None,
        }
    }

    /// List available tabs
    pub async fn list_tabs(&self) -> Result<Vec<TabInfo>> {
        let url = format!("http://{}:{}/json", self.chrome_host, self.chrome_port);
        debug!("Fetching tabs from: {}", url);

        let response = reqwest::get(&url)
            .await
            .map_err(|e| VerifyError::cdp_connection(format!("Failed to fetch tabs: {}", e)))?;

        let tabs: Vec<TabInfo> = response
            .json()
            .await
            .map_err(|e| VerifyError::cdp_protocol(format!("Failed to parse tab list: {}", e)))?;

        Ok(tabs)
    }

    /// Connect to a specific tab
    pub async fn connect_to_tab(&mut self, tab_id: &str) -> Result<()> {
        let tabs = self.list_tabs().await?;
        let tab = tabs
            .iter()
            .find(|t| t.id == tab_id)
            .ok_or_else(|| VerifyError::tab_not_found(format!("Tab {} not found", tab_id)))?;

        let ws_url = tab
            .websocket_debugger_url
            .as_ref()
            .ok_or_else(|| VerifyError::cdp_protocol("Tab has no WebSocket debugger URL"))?;

        debug!("Connecting to tab WebSocket: {}", ws_url);

        let url = Url::parse(ws_url)?;
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| VerifyError::cdp_connection(format!("WebSocket connection failed: {}", e)))?;

        self.socket = Some(Mutex::new(ws_stream));
        self.tab_id = Some(tab_id.to_string());

        self.send_command("Runtime.enable", None).await?;
        Ok(())
    }

    /// Send a CDP command and wait for its response, skipping interleaved events.
    pub async fn send_command(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| VerifyError::cdp_connection("Not connected to a tab"))?;

        let id = self.message_id.fetch_add(1, Ordering::SeqCst);
        let message = CdpMessage {
            id: Some(id),
            method: Some(method.to_string()),
            params,
            result: None,
            error: None,
        };

        let mut ws = socket.lock().await;
        let json_msg = serde_json::to_string(&message)?;
        trace!("Sending CDP message: {}", json_msg);
        ws.send(Message::Text(json_msg)).await?;

        let response = timeout(COMMAND_TIMEOUT, async {
            while let Some(frame) = ws.next().await {
                match frame? {
                    Message::Text(text) => {
                        trace!("Received CDP message: {}", text);
                        let cdp_msg: CdpMessage = serde_json::from_str(&text)?;
                        if cdp_msg.id == Some(id) {
                            return Ok(cdp_msg);
                        }
                    }
                    Message::Close(_) => {
                        warn!("WebSocket connection closed");
                        break;
                    }
                    _ => {}
                }
            }
            Err(VerifyError::cdp_connection("WebSocket closed before response"))
        })
        .await
        .map_err(|_| VerifyError::Timeout {
            timeout: COMMAND_TIMEOUT.as_millis() as u64,
        })??;

        response_value(response)
    }

    /// Evaluate JavaScript and return the remote object descriptor
    /// Evaluate `expression`. Remote objects it returns, and the properties
    /// later read from them, belong to `object_group` when one is given.
    pub async fn evaluate(
        &self,
        expression: &str,
        return_by_value: bool,
        object_group: Option<&str>,
    ) -> Result<Value> {
        let result = self
            .send_command("Runtime.evaluate", Some(evaluate_params(expression, return_by_value, object_group)))
            .await?;

        remote_object(result)
    }

    /// Call a function with `this` bound to `object_id`
    pub async fn call_function_on(
        &self,
        object_id: &str,
        function_declaration: &str,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        let result = self
            .send_command(
                "Runtime.callFunctionOn",
                Some(json!({
                    "objectId": object_id,
                    "functionDeclaration": function_declaration,
                    "arguments": arguments,
                    "returnByValue": true,
                    "awaitPromise": true
                })),
            )
            .await?;

        remote_object(result)
    }

    /// Own property descriptors of a remote object
    pub async fn get_properties(&self, object_id: &str) -> Result<Vec<Value>> {
        let result = self
            .send_command(
                "Runtime.getProperties",
                Some(json!({ "objectId": object_id, "ownProperties": true })),
            )
            .await?;

        result
            .get("result")
            .and_then(|r| r.as_array())
            .cloned()
            .ok_or_else(|| VerifyError::cdp_protocol("No property list returned"))
    }

    /// Release every remote object in `object_group`
    pub async fn release_object_group(&self, object_group: &str) -> Result<()> {
        self.send_command("Runtime.releaseObjectGroup", Some(json!({ "objectGroup": object_group })))
            .await?;
        Ok(())
    }

    /// Type a single unit of text into the focused element
    pub async fn dispatch_char(&self, text: &str) -> Result<()> {
        self.send_command(
            "Input.dispatchKeyEvent",
            Some(json!({
                "type": "char",
                "text": text
            })),
        )
        .await?;
        Ok(())
    }

    /// Get the current tab ID
    pub fn current_tab_id(&self) -> Option<&str> {
        self.tab_id.as_deref()
    }
}

fn evaluate_params(expression: &str, return_by_value: bool, object_group: Option<&str>) -> Value {
    let mut params = json!({
        "expression": expression,
        "returnByValue": return_by_value,
        "awaitPromise": true
    });
    if let Some(group) = object_group {
        params["objectGroup"] = json!(group);
    }
    params
}

fn response_value(response: CdpMessage) -> Result<Value> {
    if let Some(error) = response.error {
        let message = format!("CDP error {}: {}", error.code, error.message);
        if error.message.contains("Could not find object with given id")
            || error.message.contains("Cannot find context with specified id")
        {
            return Err(VerifyError::stale_element(message));
        }
        return Err(VerifyError::cdp_protocol(message));
    }

    Ok(response.result.unwrap_or(Value::Null))
}

fn remote_object(result: Value) -> Result<Value> {
    if let Some(exception_details) = result.get("exceptionDetails") {
        return Err(VerifyError::javascript_error(format!(
            "JS Exception: {}",
            exception_details
        )));
    }

    Ok(result.get("result").cloned().unwrap_or(Value::Null))
}
