//! Minimal W3C WebDriver client
//!
//! Speaks the JSON wire protocol directly over reqwest. One
//! [`BrowserSession`] maps to one remote browser window; it is opened once per
//! run and must be closed with [`BrowserSession::close`].

use super::locator::{ElementHandle, Locator};
use crate::config::BrowserConfig;
use crate::BrowserError;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;

const NO_SUCH_ELEMENT: &str = "no such element";

/// Handle to a live remote browser session
pub struct BrowserSession {
    client: Client,
    base: String,
    session_id: String,
}

impl BrowserSession {
    /// Starts a browser through the WebDriver server in `config`
    pub async fn open(config: &BrowserConfig) -> Result<Self, BrowserError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        let base = config.webdriver_url.trim_end_matches('/').to_string();

        let response = client
            .post(format!("{}/session", base))
            .json(&capabilities(config.headless))
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let reply: Value = serde_json::from_str(&body).map_err(|e| BrowserError::Protocol {
            command: "new session".to_string(),
            detail: format!("{} (HTTP {})", e, status.as_u16()),
        })?;
        check_reply("new session", status.is_success(), &reply)?;

        let session_id = reply
            .pointer("/value/sessionId")
            .or_else(|| reply.pointer("/sessionId"))
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::Protocol {
                command: "new session".to_string(),
                detail: "sessionId missing".to_string(),
            })?
            .to_string();

        tracing::info!("Opened browser session {}", session_id);
        Ok(Self {
            client,
            base,
            session_id,
        })
    }

    pub fn id(&self) -> &str {
        &self.session_id
    }

    /// Ends the remote session
    pub async fn close(self) -> Result<(), BrowserError> {
        self.command(Method::DELETE, "", None, "delete session").await?;
        tracing::info!("Closed browser session {}", self.session_id);
        Ok(())
    }

    pub async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.command(Method::POST, "/url", Some(json!({ "url": url })), "navigate")
            .await
            .map(|_| ())
    }

    /// Sets how long element lookups block before reporting no match
    pub async fn set_implicit_wait(&self, wait: Duration) -> Result<(), BrowserError> {
        let body = json!({ "implicit": wait.as_millis() as u64 });
        self.command(Method::POST, "/timeouts", Some(body), "set timeouts")
            .await
            .map(|_| ())
    }

    pub async fn find(&self, locator: &Locator) -> Result<ElementHandle, BrowserError> {
        let value = self
            .command(Method::POST, "/element", Some(locator.to_json()), "find element")
            .await
            .map_err(|e| missing_element(e, locator))?;
        element_from(&value, "find element")
    }

    /// All matches of `locator`; an empty vector when nothing matches
    pub async fn find_all(&self, locator: &Locator) -> Result<Vec<ElementHandle>, BrowserError> {
        let value = self
            .command(Method::POST, "/elements", Some(locator.to_json()), "find elements")
            .await?;
        let items = value.as_array().ok_or_else(|| BrowserError::Protocol {
            command: "find elements".to_string(),
            detail: "expected an array".to_string(),
        })?;
        items
            .iter()
            .map(|item| element_from(item, "find elements"))
            .collect()
    }

    /// First match of `locator` searched from `parent`
    pub async fn find_within(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> Result<ElementHandle, BrowserError> {
        let path = format!("/element/{}/element", parent.id());
        let value = self
            .command(Method::POST, &path, Some(locator.to_json()), "find element from element")
            .await
            .map_err(|e| missing_element(e, locator))?;
        element_from(&value, "find element from element")
    }

    /// Rendered (visible) text of an element
    pub async fn text(&self, element: &ElementHandle) -> Result<String, BrowserError> {
        let path = format!("/element/{}/text", element.id());
        let value = self.command(Method::GET, &path, None, "get element text").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub async fn property(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let path = format!("/element/{}/property/{}", element.id(), name);
        let value = self
            .command(Method::GET, &path, None, "get element property")
            .await?;
        Ok(value_to_string(value))
    }

    pub async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BrowserError> {
        let path = format!("/element/{}/attribute/{}", element.id(), name);
        let value = self
            .command(Method::GET, &path, None, "get element attribute")
            .await?;
        Ok(value_to_string(value))
    }

    /// Runs a synchronous script in the page and returns its result
    pub async fn execute(&self, script: &str) -> Result<Value, BrowserError> {
        let body = json!({ "script": script, "args": [] });
        self.command(Method::POST, "/execute/sync", Some(body), "execute script")
            .await
    }

    /// Polls until at least one element matches `locator`
    pub async fn wait_for(
        &self,
        locator: &Locator,
        timeout: Duration,
        poll: Duration,
    ) -> Result<(), BrowserError> {
        let started = Instant::now();
        loop {
            if !self.find_all(locator).await?.is_empty() {
                return Ok(());
            }

            let waited = started.elapsed();
            if waited >= timeout {
                return Err(BrowserError::Timeout {
                    locator: locator.to_string(),
                    waited,
                });
            }
            tokio::time::sleep(poll.min(timeout - waited)).await;
        }
    }

    /// Sends one session-scoped command and unwraps the reply's `value`
    async fn command(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        name: &str,
    ) -> Result<Value, BrowserError> {
        let endpoint = format!("{}/session/{}{}", self.base, self.session_id, path);
        tracing::trace!("WebDriver {} {}", method, endpoint);

        let mut request = self.client.request(method, &endpoint);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        let mut reply: Value = if text.trim().is_empty() {
            json!({ "value": null })
        } else {
            serde_json::from_str(&text).map_err(|e| BrowserError::Protocol {
                command: name.to_string(),
                detail: format!("{} (HTTP {})", e, status.as_u16()),
            })?
        };
        check_reply(name, status.is_success(), &reply)?;

        Ok(reply.get_mut("value").map(Value::take).unwrap_or(Value::Null))
    }
}

/// Chrome capabilities with Japanese locale
fn capabilities(headless: bool) -> Value {
    let mut args = vec![
        "--window-size=1400,1200".to_string(),
        "--disable-gpu".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--no-first-run".to_string(),
        "--lang=ja-JP".to_string(),
    ];
    if headless {
        args.push("--headless=new".to_string());
    }
    if !cfg!(target_os = "macos") {
        args.push("--no-sandbox".to_string());
    }

    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "acceptInsecureCerts": true,
                "goog:chromeOptions": {
                    "args": args,
                    "prefs": { "intl.accept_languages": "ja,ja_JP" }
                }
            }
        }
    })
}

/// Turns a WebDriver error object (or a bare HTTP failure) into a typed error
fn check_reply(command: &str, http_ok: bool, reply: &Value) -> Result<(), BrowserError> {
    if let Some(error) = reply.pointer("/value/error").and_then(Value::as_str) {
        let message = reply
            .pointer("/value/message")
            .and_then(Value::as_str)
            .unwrap_or_default();
        return Err(BrowserError::Command {
            command: command.to_string(),
            error: error.to_string(),
            message: message.to_string(),
        });
    }
    if !http_ok {
        return Err(BrowserError::Command {
            command: command.to_string(),
            error: "unknown error".to_string(),
            message: reply.to_string(),
        });
    }
    Ok(())
}

fn missing_element(error: BrowserError, locator: &Locator) -> BrowserError {
    match error {
        BrowserError::Command { ref error, .. } if error == NO_SUCH_ELEMENT => {
            BrowserError::NoSuchElement {
                locator: locator.to_string(),
            }
        }
        other => other,
    }
}

fn element_from(value: &Value, command: &str) -> Result<ElementHandle, BrowserError> {
    ElementHandle::from_json(value).ok_or_else(|| BrowserError::Protocol {
        command: command.to_string(),
        detail: format!("no element reference in {}", value),
    })
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
