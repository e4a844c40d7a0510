//! Element locators and the wait conditions built from them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// How a locator's text is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorKind {
    /// Path expression, e.g. `//a[@title='next']`.
    #[default]
    #[serde(alias = "XPath", alias = "XPATH")]
    Xpath,
    /// CSS selector, e.g. `a.next`.
    #[serde(alias = "CSS")]
    Css,
}

impl LocatorKind {
    pub const ALL: [LocatorKind; 2] = [LocatorKind::Xpath, LocatorKind::Css];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xpath => "xpath",
            Self::Css => "css",
        }
    }
}

impl fmt::Display for LocatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LocatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "xpath" => Ok(Self::Xpath),
            "css" => Ok(Self::Css),
            _ => Err(format!(
                "Invalid locator kind '{}'. Valid options: xpath, css",
                s
            )),
        }
    }
}

#[derive(Deserialize)]
struct RawLocator {
    #[serde(default)]
    kind: LocatorKind,
    text: String,
}

/// A typed selector. The text is never blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawLocator")]
pub struct WaitLocator {
    kind: LocatorKind,
    text: String,
}

impl TryFrom<RawLocator> for WaitLocator {
    type Error = ConfigError;

    fn try_from(raw: RawLocator) -> Result<Self, Self::Error> {
        Self::new(raw.kind, raw.text)
    }
}

impl WaitLocator {
    pub fn new(kind: LocatorKind, text: impl Into<String>) -> Result<Self, ConfigError> {
        let text = validate_text(text.into())?;
        Ok(Self { kind, text })
    }

    pub fn xpath(text: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(LocatorKind::Xpath, text)
    }

    pub fn css(text: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(LocatorKind::Css, text)
    }

    pub fn kind(&self) -> LocatorKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_kind(&mut self, kind: LocatorKind) {
        self.kind = kind;
    }

    /// Replace the locator text, rejecting blank input.
    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), ConfigError> {
        self.text = validate_text(text.into())?;
        Ok(())
    }
}

fn validate_text(text: String) -> Result<String, ConfigError> {
    if text.trim().is_empty() {
        return Err(ConfigError::EmptyLocator);
    }
    Ok(text)
}

impl fmt::Display for WaitLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.kind, self.text)
    }
}

/// Whether a condition is required for the page to count as ready.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitLogic {
    #[default]
    MustHave,
    Optional,
}

impl fmt::Display for WaitLogic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MustHave => f.write_str("must_have"),
            Self::Optional => f.write_str("optional"),
        }
    }
}

/// What "found" means for a condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitType {
    /// The element exists in the document.
    #[default]
    Presence,
    /// The element exists, is visible and is enabled.
    Clickable,
}

impl fmt::Display for WaitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presence => f.write_str("presence"),
            Self::Clickable => f.write_str("clickable"),
        }
    }
}

/// A locator paired with its logic tier and wait type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaitCondition {
    pub locator: WaitLocator,
    #[serde(default)]
    pub logic: WaitLogic,
    #[serde(default)]
    pub wait_type: WaitType,
    /// Explicit key; defaults to the condition's own rendering.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl WaitCondition {
    pub fn new(locator: WaitLocator, logic: WaitLogic, wait_type: WaitType) -> Self {
        Self {
            locator,
            logic,
            wait_type,
            name: None,
        }
    }

    /// Required element presence.
    pub fn must_have(locator: WaitLocator) -> Self {
        Self::new(locator, WaitLogic::MustHave, WaitType::Presence)
    }

    /// Optional element presence.
    pub fn optional(locator: WaitLocator) -> Self {
        Self::new(locator, WaitLogic::Optional, WaitType::Presence)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Identity within one evaluation set.
    pub fn key(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {}]", self.locator, self.logic, self.wait_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locator_rejects_blank_text() {
        assert_eq!(WaitLocator::xpath(""), Err(ConfigError::EmptyLocator));
        assert_eq!(WaitLocator::css("   "), Err(ConfigError::EmptyLocator));
    }

    #[test]
    fn test_locator_set_text_revalidates() {
        let mut locator = WaitLocator::xpath("//a").unwrap();
        assert!(locator.set_text("").is_err());
        assert_eq!(locator.text(), "//a");

        locator.set_text("//div[@id='content']").unwrap();
        assert_eq!(locator.text(), "//div[@id='content']");
    }

    #[test]
    fn test_locator_kind_from_str() {
        assert_eq!("XPath".parse::<LocatorKind>(), Ok(LocatorKind::Xpath));
        assert_eq!("css".parse::<LocatorKind>(), Ok(LocatorKind::Css));
        assert!("id".parse::<LocatorKind>().is_err());
    }

    #[test]
    fn test_condition_key_uses_name_when_set() {
        let locator = WaitLocator::xpath("//a[@title='next']").unwrap();
        let condition = WaitCondition::must_have(locator.clone());
        assert_eq!(
            condition.key(),
            "xpath=//a[@title='next'] [must_have, presence]"
        );

        let named = WaitCondition::must_have(locator).named("next");
        assert_eq!(named.key(), "next");
    }

    #[test]
    fn test_locator_deserialize_validates() {
        let ok: WaitLocator = serde_json::from_str(r#"{"kind":"css","text":"a.next"}"#).unwrap();
        assert_eq!(ok.kind(), LocatorKind::Css);

        let err = serde_json::from_str::<WaitLocator>(r#"{"kind":"xpath","text":""}"#);
        assert!(err.is_err());
    }
}
