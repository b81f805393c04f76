use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AppSettingsError {
    #[error("unknown language code: {0}")]
    UnknownLanguage(String),
    #[error("unknown theme: {0}")]
    UnknownTheme(String),
}

/// Interface language. The exercises themselves are always Spanish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    De,
    Es,
}

impl Language {
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Language::De => "de",
            Language::Es => "es",
        }
    }

    /// The other supported language.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Language::De => Language::Es,
            Language::Es => Language::De,
        }
    }
}

impl FromStr for Language {
    type Err = AppSettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "de" => Ok(Language::De),
            "es" => Ok(Language::Es),
            other => Err(AppSettingsError::UnknownLanguage(other.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl FromStr for Theme {
    type Err = AppSettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(AppSettingsError::UnknownTheme(other.to_string())),
        }
    }
}

/// Per-device preferences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppSettings {
    language: Language,
    theme: Theme,
}

impl AppSettings {
    #[must_use]
    pub fn new(language: Language, theme: Theme) -> Self {
        Self { language, theme }
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    #[must_use]
    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_german_light() {
        let settings = AppSettings::default();
        assert_eq!(settings.language(), Language::De);
        assert_eq!(settings.theme(), Theme::Light);
    }

    #[test]
    fn language_parses_and_toggles() {
        let lang: Language = "ES".parse().unwrap();
        assert_eq!(lang, Language::Es);
        assert_eq!(lang.toggled(), Language::De);
        assert!(matches!(
            "fr".parse::<Language>(),
            Err(AppSettingsError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn theme_parse_rejects_unknown() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
    }
}
