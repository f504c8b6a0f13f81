use serde::{Deserialize, Serialize};

/// Browser family, used to pick camera-permission instructions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum BrowserKind {
    Firefox,
    Chrome,
    Safari,
    #[default]
    Default,
}

impl BrowserKind {
    /// Chrome user agents also mention Safari, so the order matters.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();
        if ua.contains("firefox") {
            BrowserKind::Firefox
        } else if ua.contains("chrome") || ua.contains("chromium") {
            BrowserKind::Chrome
        } else if ua.contains("safari") {
            BrowserKind::Safari
        } else {
            BrowserKind::Default
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserKind::Firefox => "firefox",
            BrowserKind::Chrome => "chrome",
            BrowserKind::Safari => "safari",
            BrowserKind::Default => "default",
        }
    }
}
