//! # Theme Tokens
//!
//! Document-level theme tokens cascade into each block. A block's `colors`
//! record overrides individual tokens; anything it does not name falls back to
//! the document value.
//!
//! ```text
//! document theme  { primary: #2563eb, radius: 8px, ... }
//!        +
//! block colors    { primary: #111111 }
//!        =
//! effective       { primary: #111111, radius: 8px, ... }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Token name → token value
pub type TokenMap = BTreeMap<String, Value>;

/// Known theme token names. Unknown names are carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeToken {
    Primary,
    Secondary,
    PageBackground,
    SectionBackground,
    TitleText,
    BodyText,
    ButtonText,
    Radius,
    Outline,
}

impl ThemeToken {
    pub const ALL: [ThemeToken; 9] = [
        ThemeToken::Primary,
        ThemeToken::Secondary,
        ThemeToken::PageBackground,
        ThemeToken::SectionBackground,
        ThemeToken::TitleText,
        ThemeToken::BodyText,
        ThemeToken::ButtonText,
        ThemeToken::Radius,
        ThemeToken::Outline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeToken::Primary => "primary",
            ThemeToken::Secondary => "secondary",
            ThemeToken::PageBackground => "pageBackground",
            ThemeToken::SectionBackground => "sectionBackground",
            ThemeToken::TitleText => "titleText",
            ThemeToken::BodyText => "bodyText",
            ThemeToken::ButtonText => "buttonText",
            ThemeToken::Radius => "radius",
            ThemeToken::Outline => "outline",
        }
    }
}

impl fmt::Display for ThemeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeToken {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemeToken::ALL
            .into_iter()
            .find(|token| token.as_str() == s)
            .ok_or_else(|| format!("unknown theme token '{s}'"))
    }
}

/// Document-level theme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Theme {
    tokens: TokenMap,
}

impl Default for Theme {
    fn default() -> Self {
        let defaults = [
            (ThemeToken::Primary, "#2563eb"),
            (ThemeToken::Secondary, "#f59e0b"),
            (ThemeToken::PageBackground, "#ffffff"),
            (ThemeToken::SectionBackground, "#f8fafc"),
            (ThemeToken::TitleText, "#0f172a"),
            (ThemeToken::BodyText, "#334155"),
            (ThemeToken::ButtonText, "#ffffff"),
            (ThemeToken::Radius, "8px"),
            (ThemeToken::Outline, "#e2e8f0"),
        ];

        Self {
            tokens: defaults
                .into_iter()
                .map(|(token, value)| (token.as_str().to_string(), Value::from(value)))
                .collect(),
        }
    }
}

impl Theme {
    pub fn from_tokens(tokens: TokenMap) -> Self {
        Self { tokens }
    }

    pub fn tokens(&self) -> &TokenMap {
        &self.tokens
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.tokens.get(name)
    }

    pub fn token(&self, token: ThemeToken) -> Option<&Value> {
        self.get(token.as_str())
    }

    /// Copy of this theme with one token replaced
    pub fn with_token(&self, name: impl Into<String>, value: Value) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.insert(name.into(), value);
        Self { tokens }
    }

    /// Value shown in a color field: the field's own value, else the fallback token.
    ///
    /// Display only. This does not take part in [`resolve_theme`].
    pub fn display_value<'a>(
        &'a self,
        own: Option<&'a Value>,
        fallback_token: Option<&str>,
    ) -> Option<&'a Value> {
        own.filter(|v| !v.is_null())
            .or_else(|| fallback_token.and_then(|name| self.get(name)))
    }
}

/// Theme after block overrides have been applied
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EffectiveTheme {
    tokens: TokenMap,
}

impl EffectiveTheme {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.tokens.get(name)
    }

    pub fn token(&self, token: ThemeToken) -> Option<&Value> {
        self.get(token.as_str())
    }

    /// Token as a string, for CSS output. `null` counts as unset.
    pub fn css(&self, token: ThemeToken) -> Option<String> {
        match self.token(token)? {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    pub fn tokens(&self) -> &TokenMap {
        &self.tokens
    }
}

/// Merge block-level overrides over the document theme. Override keys always
/// win, except a `null` override, which is a cleared field and lets the
/// document value through.
pub fn resolve_theme(theme: &Theme, overrides: Option<&TokenMap>) -> EffectiveTheme {
    let mut tokens = theme.tokens.clone();

    if let Some(overrides) = overrides {
        tokens.extend(
            overrides
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    EffectiveTheme { tokens }
}
