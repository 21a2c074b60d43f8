//! Locator strategies for consent-banner accept buttons.
//!
//! Each strategy is a predicate (does a matching, visible element exist?)
//! plus an action (click it), compiled into one self-contained script. The
//! script reports `{ found, clicked, error }` so the handler never needs to
//! know about the DOM.

use serde::Deserialize;

/// How a strategy finds its target element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Button-like element whose trimmed text equals this (case-insensitive).
    ButtonText(&'static str),
    /// Element with this id.
    ElementId(&'static str),
    /// Button-like element whose id, class, aria-label, or text contains
    /// this fragment (case-insensitive).
    Contains(&'static str),
}

/// One entry in the ordered strategy list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorStrategy {
    pub name: &'static str,
    pub locator: Locator,
}

/// What the page reported back for one strategy.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScriptReport {
    #[serde(default)]
    pub found: bool,
    #[serde(default)]
    pub clicked: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Elements considered clickable banner controls.
const CLICKABLE: &str =
    "button, a, [role=\"button\"], input[type=\"button\"], input[type=\"submit\"]";

/// The fixed, ordered list tried on every pass.
pub fn default_strategies() -> Vec<LocatorStrategy> {
    vec![
        LocatorStrategy { name: "text:accept", locator: Locator::ButtonText("Accept") },
        LocatorStrategy { name: "text:accept-all", locator: Locator::ButtonText("Accept all") },
        LocatorStrategy { name: "text:i-agree", locator: Locator::ButtonText("I agree") },
        LocatorStrategy { name: "text:allow", locator: Locator::ButtonText("Allow") },
        LocatorStrategy {
            name: "id:onetrust",
            locator: Locator::ElementId("onetrust-accept-btn-handler"),
        },
        LocatorStrategy {
            name: "id:cookiebot",
            locator: Locator::ElementId("CybotCookiebotDialogBodyLevelButtonLevelOptinAllowAll"),
        },
        LocatorStrategy {
            name: "id:didomi",
            locator: Locator::ElementId("didomi-notice-agree-button"),
        },
        LocatorStrategy {
            name: "id:truste",
            locator: Locator::ElementId("truste-consent-button"),
        },
        LocatorStrategy {
            name: "id:cookie-law-info",
            locator: Locator::ElementId("cookie_action_close_header"),
        },
        LocatorStrategy { name: "contains:accept", locator: Locator::Contains("accept") },
        LocatorStrategy { name: "contains:cookie", locator: Locator::Contains("cookie") },
        LocatorStrategy { name: "contains:consent", locator: Locator::Contains("consent") },
    ]
}

impl LocatorStrategy {
    /// Script that locates the target and clicks it.
    pub fn script(&self) -> String {
        let find = match &self.locator {
            Locator::ButtonText(text) => format!(
                "const want = {};
                 return Array.from(document.querySelectorAll({})).find(el =>
                     visible(el) && (el.innerText || el.value || '').trim().toLowerCase() === want);",
                js_string(&text.to_lowercase()),
                js_string(CLICKABLE),
            ),
            Locator::ElementId(id) => format!(
                "const el = document.getElementById({});
                 return el && visible(el) ? el : null;",
                js_string(id),
            ),
            Locator::Contains(fragment) => format!(
                "const want = {};
                 return Array.from(document.querySelectorAll({})).find(el => {{
                     if (!visible(el)) return false;
                     const hay = [el.id, el.className, el.getAttribute('aria-label'), el.innerText]
                         .filter(v => typeof v === 'string').join(' ').toLowerCase();
                     return hay.includes(want);
                 }});",
                js_string(fragment),
                js_string(CLICKABLE),
            ),
        };

        format!(
            r#"(() => {{
    const visible = el => el.offsetWidth > 0 && el.offsetHeight > 0
        && getComputedStyle(el).visibility !== 'hidden';
    const locate = () => {{ {find} }};
    try {{
        const target = locate();
        if (!target) return {{ found: false, clicked: false }};
        target.click();
        return {{ found: true, clicked: true }};
    }} catch (e) {{
        return {{ found: true, clicked: false, error: String(e) }};
    }}
}})()"#
        )
    }
}

/// Script that scrolls the window down by `offset` pixels.
pub fn scroll_script(offset: u32) -> String {
    format!("window.scrollBy(0, {offset}); window.scrollY")
}

fn js_string(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}
