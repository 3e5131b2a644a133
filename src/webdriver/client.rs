//! Appium client over HTTP
//!
//! Speaks W3C WebDriver JSON to an Appium server. Android specifics
//! (keycodes, keyboard, app lifecycle, permissions) go through Appium's
//! `mobile:` execute-script extensions.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::common::{Error, Result};

use super::capabilities::Capabilities;
use super::driver::Driver;
use super::types::*;

/// Upper bound for a single HTTP round trip; session creation may install
/// the UiAutomator2 server on the device, so this is generous
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Client bound to one Appium session
pub struct AppiumClient {
    http: reqwest::Client,
    /// Server URL without trailing slash, e.g. `http://127.0.0.1:4723`
    base_url: String,
    session_id: String,
}

impl AppiumClient {
    /// Create a new session on the server
    pub async fn connect(server_url: &str, capabilities: &Capabilities) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        let base_url = server_url.trim_end_matches('/').to_string();
        let url = format!("{}/session", base_url);

        let body = json!({
            "capabilities": {
                "alwaysMatch": capabilities.to_w3c(),
                "firstMatch": [{}],
            }
        });
        tracing::debug!(%url, "Creating session");

        let session_failed = |message: String| Error::SessionNotCreated {
            url: url.clone(),
            message,
        };

        let response = http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| session_failed(e.to_string()))?;
        let session: NewSession = decode(response)
            .await
            .map_err(|e| session_failed(e.to_string()))?;

        tracing::info!(session_id = %session.session_id, "Session created");

        Ok(Self {
            http,
            base_url,
            session_id: session.session_id,
        })
    }

    /// Send a session-scoped command and unwrap its `value`
    async fn command<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T> {
        let url = format!("{}/session/{}{}", self.base_url, self.session_id, path);
        tracing::trace!(%method, %url, body = ?body, "WebDriver >>>");

        let mut request = self.http.request(method.clone(), &url);
        request = match body {
            Some(body) => request.json(&body),
            // W3C servers reject POSTs without a JSON body
            None if method == Method::POST => request.json(&json!({})),
            None => request,
        };

        decode(request.send().await?).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.command(Method::GET, path, None).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T> {
        self.command(Method::POST, path, Some(body)).await
    }

    async fn mobile(&self, command: &str, args: Value) -> Result<Value> {
        self.execute_script(&format!("mobile: {}", command), args)
            .await
    }
}

/// Decode a WebDriver response, mapping error payloads to `Error::WebDriver`
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        return Err(match serde_json::from_slice::<WireResponse<WireError>>(&bytes) {
            Ok(wire) => Error::webdriver(&wire.value.error, &wire.value.message),
            Err(_) => Error::Protocol(format!(
                "HTTP {}: {}",
                status,
                String::from_utf8_lossy(&bytes)
            )),
        });
    }

    let wire: WireResponse<T> = serde_json::from_slice(&bytes)
        .map_err(|e| Error::Protocol(format!("Failed to parse response: {}", e)))?;
    Ok(wire.value)
}

/// Decode a base64 screenshot payload (Appium may wrap lines)
pub fn decode_screenshot(payload: &str) -> Result<Vec<u8>> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| Error::Protocol(format!("Invalid screenshot payload: {}", e)))
}

#[async_trait]
impl Driver for AppiumClient {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    async fn find_element(&self, locator: &Locator) -> Result<ElementId> {
        let value: Value = self.post("/element", locator.to_request()).await?;
        ElementId::from_value(&value)
            .ok_or_else(|| Error::Protocol(format!("No element reference in {}", value)))
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<ElementId>> {
        let values: Vec<Value> = self.post("/elements", locator.to_request()).await?;
        Ok(values.iter().filter_map(ElementId::from_value).collect())
    }

    async fn click(&self, element: &ElementId) -> Result<()> {
        self.post(&format!("/element/{}/click", element), json!({}))
            .await
    }

    async fn send_keys_to(&self, element: &ElementId, text: &str) -> Result<()> {
        let chars: Vec<String> = text.chars().map(String::from).collect();
        self.post(
            &format!("/element/{}/value", element),
            json!({ "text": text, "value": chars }),
        )
        .await
    }

    async fn text(&self, element: &ElementId) -> Result<String> {
        self.get(&format!("/element/{}/text", element)).await
    }

    async fn is_displayed(&self, element: &ElementId) -> Result<bool> {
        self.get(&format!("/element/{}/displayed", element)).await
    }

    async fn is_enabled(&self, element: &ElementId) -> Result<bool> {
        self.get(&format!("/element/{}/enabled", element)).await
    }

    async fn rect(&self, element: &ElementId) -> Result<Rect> {
        self.get(&format!("/element/{}/rect", element)).await
    }

    async fn window_rect(&self) -> Result<Rect> {
        self.get("/window/rect").await
    }

    async fn perform_actions(&self, actions: &[ActionSequence]) -> Result<()> {
        self.post::<Value>("/actions", json!({ "actions": actions }))
            .await?;
        self.command::<()>(Method::DELETE, "/actions", None).await
    }

    async fn press_keycode(&self, keycode: u32) -> Result<()> {
        self.mobile("pressKey", json!({ "keycode": keycode })).await?;
        Ok(())
    }

    async fn hide_keyboard(&self) -> Result<()> {
        self.mobile("hideKeyboard", json!({})).await?;
        Ok(())
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        let payload: String = self.get("/screenshot").await?;
        decode_screenshot(&payload)
    }

    async fn terminate_app(&self, app_id: &str) -> Result<()> {
        self.mobile("terminateApp", json!({ "appId": app_id })).await?;
        Ok(())
    }

    async fn activate_app(&self, app_id: &str) -> Result<()> {
        self.mobile("activateApp", json!({ "appId": app_id })).await?;
        Ok(())
    }

    async fn contexts(&self) -> Result<Vec<String>> {
        self.get("/contexts").await
    }

    async fn current_context(&self) -> Result<String> {
        let current: Option<String> = self.get("/context").await?;
        Ok(current.unwrap_or_else(|| NATIVE_CONTEXT.to_string()))
    }

    async fn set_context(&self, name: &str) -> Result<()> {
        self.post("/context", json!({ "name": name })).await
    }

    async fn execute_script(&self, script: &str, args: Value) -> Result<Value> {
        let args = match args {
            Value::Null => Vec::new(),
            Value::Array(items) => items,
            other => vec![other],
        };
        self.post("/execute/sync", json!({ "script": script, "args": args }))
            .await
    }

    async fn quit(&self) -> Result<()> {
        tracing::debug!(session_id = %self.session_id, "Deleting session");
        self.command::<Value>(Method::DELETE, "", None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_screenshot_ignores_line_breaks() {
        let bytes = decode_screenshot("iVBO\nRw0K\r\nGgo=").unwrap();
        assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_decode_screenshot_rejects_garbage() {
        assert!(matches!(
            decode_screenshot("not base64!"),
            Err(Error::Protocol(_))
        ));
    }

    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use crate::common::AppConfig;
    use crate::webdriver::capabilities;

    /// Request as received by the canned server
    #[derive(Debug, Clone)]
    struct Seen {
        method: String,
        path: String,
        body: Value,
    }

    /// Status and JSON body for a method and path
    type Reply = fn(&str, &str) -> (u16, Value);

    async fn read_request(stream: &mut TcpStream) -> Option<Seen> {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                return None;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let mut lines = head.lines();
        let mut request_line = lines.next()?.split_whitespace();
        let method = request_line.next()?.to_string();
        let path = request_line.next()?.to_string();
        let length = lines
            .filter_map(|line| line.split_once(':'))
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.trim().parse::<usize>().ok())
            .unwrap_or(0);

        while buf.len() < head_end + length {
            let n = stream.read(&mut chunk).await.ok()?;
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let body = serde_json::from_slice(&buf[head_end..]).unwrap_or(Value::Null);
        Some(Seen { method, path, body })
    }

    /// Local HTTP server answering every request through `reply`
    async fn serve(reply: Reply) -> (String, Arc<Mutex<Vec<Seen>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = seen.clone();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let log = log.clone();
                tokio::spawn(async move {
                    let Some(request) = read_request(&mut stream).await else {
                        return;
                    };
                    let (status, body) = reply(&request.method, &request.path);
                    log.lock().unwrap().push(request);

                    let body = body.to_string();
                    let response = format!(
                        "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                        status,
                        if status == 200 { "OK" } else { "Error" },
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        (url, seen)
    }

    fn appium(method: &str, path: &str) -> (u16, Value) {
        match (method, path) {
            ("POST", "/session") => (
                200,
                json!({ "value": { "sessionId": "s1", "capabilities": {} } }),
            ),
            ("POST", "/session/s1/element") => (
                404,
                json!({ "value": { "error": "no such element", "message": "nope", "stacktrace": "" } }),
            ),
            ("POST", "/session/s1/elements") => (
                200,
                json!({ "value": [{ ELEMENT_KEY: "e1" }, { "ELEMENT": "e2" }] }),
            ),
            ("GET", "/session/s1/window/rect") => (502, json!("Bad Gateway")),
            ("POST", "/session/s1/execute/sync") => (200, json!({ "value": true })),
            ("GET", "/session/s1/context")
            | ("POST", "/session/s1/actions")
            | ("DELETE", "/session/s1/actions")
            | ("DELETE", "/session/s1") => (200, json!({ "value": null })),
            _ => (
                404,
                json!({ "value": { "error": "unknown command", "message": path } }),
            ),
        }
    }

    fn refuse(_method: &str, _path: &str) -> (u16, Value) {
        (
            500,
            json!({ "value": { "error": "session not created", "message": "no device attached" } }),
        )
    }

    fn fixture_capabilities() -> Capabilities {
        let config = AppConfig::parse(
            include_str!("../../tests/fixtures/config.toml"),
            Path::new("config.toml"),
        )
        .unwrap();
        capabilities::build(&config, Path::new("/work"))
    }

    fn requests(seen: &Mutex<Vec<Seen>>) -> Vec<Seen> {
        seen.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_connect_sends_w3c_capabilities() {
        let (url, seen) = serve(appium).await;
        let client = AppiumClient::connect(&format!("{url}/"), &fixture_capabilities())
            .await
            .unwrap();
        assert_eq!(client.session_id(), "s1");

        let requests = requests(&seen);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/session");
        let caps = &requests[0].body["capabilities"];
        assert_eq!(caps["alwaysMatch"]["platformName"], "Android");
        assert_eq!(caps["alwaysMatch"]["appium:appPackage"], "cat.naval.florae");
        assert_eq!(caps["firstMatch"], json!([{}]));
    }

    #[tokio::test]
    async fn test_refused_session_is_reported() {
        let (url, _seen) = serve(refuse).await;
        let err = AppiumClient::connect(&url, &fixture_capabilities())
            .await
            .err()
            .unwrap();
        match err {
            Error::SessionNotCreated { url: target, message } => {
                assert_eq!(target, format!("{url}/session"));
                assert!(message.contains("no device attached"), "{message}");
            }
            other => panic!("Expected SessionNotCreated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_error_payload_maps_to_webdriver_error() {
        let (url, seen) = serve(appium).await;
        let client = AppiumClient::connect(&url, &fixture_capabilities())
            .await
            .unwrap();

        let locator = Locator::ui_automator(r#"new UiSelector().text("Today")"#);
        let err = client.find_element(&locator).await.unwrap_err();
        assert!(err.is_no_such_element());
        assert!(matches!(
            err,
            Error::WebDriver { ref code, ref message } if code == "no such element" && message == "nope"
        ));

        let found = client.find_elements(&locator).await.unwrap();
        assert_eq!(found, [ElementId("e1".into()), ElementId("e2".into())]);

        let requests = requests(&seen);
        assert_eq!(requests[1].path, "/session/s1/element");
        assert_eq!(requests[1].body, locator.to_request());
    }

    #[tokio::test]
    async fn test_non_wire_error_body() {
        let (url, _seen) = serve(appium).await;
        let client = AppiumClient::connect(&url, &fixture_capabilities())
            .await
            .unwrap();

        match client.window_rect().await {
            Err(Error::Protocol(message)) => assert!(message.contains("502"), "{message}"),
            other => panic!("Expected a protocol error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_null_context_is_native() {
        let (url, _seen) = serve(appium).await;
        let client = AppiumClient::connect(&url, &fixture_capabilities())
            .await
            .unwrap();
        assert_eq!(client.current_context().await.unwrap(), NATIVE_CONTEXT);
    }

    #[tokio::test]
    async fn test_actions_are_released() {
        let (url, seen) = serve(appium).await;
        let client = AppiumClient::connect(&url, &fixture_capabilities())
            .await
            .unwrap();

        client
            .perform_actions(&[ActionSequence::tap(Point { x: 10, y: 20 }, 100)])
            .await
            .unwrap();

        let requests = requests(&seen);
        let tail: Vec<_> = requests[1..]
            .iter()
            .map(|r| (r.method.as_str(), r.path.as_str()))
            .collect();
        assert_eq!(
            tail,
            [("POST", "/session/s1/actions"), ("DELETE", "/session/s1/actions")]
        );
        assert_eq!(requests[1].body["actions"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn test_execute_wraps_arguments() {
        let (url, seen) = serve(appium).await;
        let client = AppiumClient::connect(&url, &fixture_capabilities())
            .await
            .unwrap();

        client.press_keycode(66).await.unwrap();
        client.execute_script("mobile: noop", Value::Null).await.unwrap();
        let result = client
            .execute_script("mobile: batch", json!([1, 2]))
            .await
            .unwrap();
        assert_eq!(result, json!(true));
        client.quit().await.unwrap();

        let requests = requests(&seen);
        assert_eq!(
            requests[1].body,
            json!({ "script": "mobile: pressKey", "args": [{ "keycode": 66 }] })
        );
        assert_eq!(requests[2].body["args"], json!([]));
        assert_eq!(requests[3].body["args"], json!([1, 2]));
        assert_eq!(requests[4].method, "DELETE");
        assert_eq!(requests[4].path, "/session/s1");
    }
}
