//! Remote browser control for pages whose content is rendered by script

mod locator;
mod session;

pub use locator::{ElementHandle, Locator, ELEMENT_KEY};
pub use session::BrowserSession;
