//! User settings: API credentials, model and appearance

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeColor {
    #[default]
    Blue,
    Green,
    Purple,
    Orange,
    Red,
    Pink,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "zh_CN")]
    ChineseSimplified,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "de")]
    German,
}

/// Single settings record persisted under the `settings` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub theme: Theme,
    pub theme_color: ThemeColor,
    pub language: Language,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            theme: Theme::default(),
            theme_color: ThemeColor::default(),
            language: Language::default(),
        }
    }
}

/// Settings fields addressable by name from the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    ApiKey,
    BaseUrl,
    Model,
    Theme,
    ThemeColor,
    Language,
}

impl SettingKey {
    pub const ALL: [SettingKey; 6] = [
        SettingKey::ApiKey,
        SettingKey::BaseUrl,
        SettingKey::Model,
        SettingKey::Theme,
        SettingKey::ThemeColor,
        SettingKey::Language,
    ];
}

impl Settings {
    /// Set one field from its textual form.
    ///
    /// Returns `false` and leaves the field untouched when an enum-like value
    /// is not in its allow-list. `baseUrl` loses one trailing slash.
    pub fn apply(&mut self, key: SettingKey, value: &str) -> bool {
        match key {
            SettingKey::ApiKey => self.api_key = value.to_string(),
            SettingKey::BaseUrl => self.base_url = normalize_base_url(value),
            SettingKey::Model => self.model = value.to_string(),
            SettingKey::Theme => match value.parse() {
                Ok(theme) => self.theme = theme,
                Err(_) => return false,
            },
            SettingKey::ThemeColor => match value.parse() {
                Ok(color) => self.theme_color = color,
                Err(_) => return false,
            },
            SettingKey::Language => match value.parse() {
                Ok(language) => self.language = language,
                Err(_) => return false,
            },
        }
        true
    }

    /// Build a record from loosely-typed JSON, merged over the defaults.
    ///
    /// Unknown keys, non-string values and values outside the allow-lists
    /// are ignored field by field.
    pub fn from_value(value: &Value) -> Self {
        let mut settings = Settings::default();
        if let Some(object) = value.as_object() {
            for key in SettingKey::ALL {
                if let Some(raw) = object.get(key.as_str()).and_then(Value::as_str) {
                    settings.apply(key, raw);
                }
            }
        }
        settings
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

pub fn normalize_base_url(url: &str) -> String {
    url.strip_suffix('/').unwrap_or(url).to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSettingError(pub String);

impl fmt::Display for ParseSettingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized value: {}", self.0)
    }
}

impl std::error::Error for ParseSettingError {}

macro_rules! string_enum {
    ($ty:ty { $($variant:path => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($variant => $text),+
                }
            }
        }

        impl FromStr for $ty {
            type Err = ParseSettingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($variant),)+
                    other => Err(ParseSettingError(other.to_string())),
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum!(Theme {
    Theme::Light => "light",
    Theme::Dark => "dark",
    Theme::System => "system",
});

string_enum!(ThemeColor {
    ThemeColor::Blue => "blue",
    ThemeColor::Green => "green",
    ThemeColor::Purple => "purple",
    ThemeColor::Orange => "orange",
    ThemeColor::Red => "red",
    ThemeColor::Pink => "pink",
});

string_enum!(Language {
    Language::English => "en",
    Language::ChineseSimplified => "zh_CN",
    Language::Japanese => "ja",
    Language::Korean => "ko",
    Language::Spanish => "es",
    Language::French => "fr",
    Language::German => "de",
});

string_enum!(SettingKey {
    SettingKey::ApiKey => "apiKey",
    SettingKey::BaseUrl => "baseUrl",
    SettingKey::Model => "model",
    SettingKey::Theme => "theme",
    SettingKey::ThemeColor => "themeColor",
    SettingKey::Language => "language",
});
