use serde_json::{json, Value};
use std::fmt;

/// W3C WebDriver key under which element references are returned
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52f-4903c6b7c4a4";

/// Element lookup strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    /// Request body for the find-element family of commands
    pub fn to_json(&self) -> Value {
        match self {
            Self::Css(selector) => json!({ "using": "css selector", "value": selector }),
            Self::XPath(expression) => json!({ "using": "xpath", "value": expression }),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(selector) => write!(f, "css `{}`", selector),
            Self::XPath(expression) => write!(f, "xpath `{}`", expression),
        }
    }
}

/// Opaque reference to an element in the remote browser
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub String);

impl ElementHandle {
    /// Reads an element reference out of a WebDriver reply value
    pub fn from_json(value: &Value) -> Option<Self> {
        value
            .get(ELEMENT_KEY)
            .or_else(|| value.get("ELEMENT"))
            .and_then(Value::as_str)
            .map(|id| Self(id.to_string()))
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}
