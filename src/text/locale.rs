use std::collections::BTreeMap;

use crate::foundation::error::{ReelError, ReelResult};

/// Script family of a locale. Controls reshaping, font asset and caption size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptFamily {
    /// Latin, Cyrillic, Greek and other left-to-right alphabetic scripts.
    Latin,
    /// Right-to-left scripts (Arabic family, Hebrew).
    RightToLeft,
    /// Chinese, Japanese, Korean.
    Cjk,
}

impl ScriptFamily {
    /// Caption font size as a fraction of canvas width.
    pub fn font_size_fraction(self) -> f32 {
        match self {
            ScriptFamily::Latin => 0.13,
            ScriptFamily::RightToLeft => 0.10,
            ScriptFamily::Cjk => 0.12,
        }
    }

    /// Whether text must be reshaped and visually reordered before layout.
    pub fn needs_reshaping(self) -> bool {
        matches!(self, ScriptFamily::RightToLeft)
    }
}

/// A caption locale, identified by its two-letter translation code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Locale {
    code: String,
}

impl Locale {
    /// Build a locale from a language code such as `es`, `ar` or `ja-JP`.
    pub fn new(code: impl Into<String>) -> ReelResult<Self> {
        let code = code.into().trim().to_ascii_lowercase();
        let primary = code.split(['-', '_']).next().unwrap_or_default();
        if primary.len() < 2 || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ReelError::validation(format!(
                "invalid locale code '{code}'"
            )));
        }
        Ok(Self { code })
    }

    /// English; the locale of untranslated source captions.
    pub fn english() -> Self {
        Self {
            code: "en".to_string(),
        }
    }

    /// Full code as given.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Primary language subtag (`ja` for `ja-JP`).
    pub fn language(&self) -> &str {
        self.code.split(['-', '_']).next().unwrap_or(&self.code)
    }

    /// Script family used for rendering policy.
    pub fn family(&self) -> ScriptFamily {
        match self.language() {
            "ar" | "fa" | "ur" | "ps" | "he" | "yi" => ScriptFamily::RightToLeft,
            "ja" | "zh" | "ko" => ScriptFamily::Cjk,
            _ => ScriptFamily::Latin,
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.code)
    }
}

/// One row of the locale table: translation code plus narration voice.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LanguageEntry {
    /// Two-letter translation code.
    pub code: String,
    /// Voice identifier handed to the narration collaborator.
    pub voice: String,
}

/// Fixed mapping from language name to translation code and narration voice.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct LocaleTable {
    entries: BTreeMap<String, LanguageEntry>,
}

impl Default for LocaleTable {
    fn default() -> Self {
        let rows = [
            ("Spanish", "es", "es-ES-AlvaroNeural"),
            ("French", "fr", "fr-FR-HenriNeural"),
            ("Arabic", "ar", "ar-SA-HamedNeural"),
            ("Portuguese", "pt", "pt-BR-AntonioNeural"),
            ("German", "de", "de-DE-ConradNeural"),
            ("Turkish", "tr", "tr-TR-AhmetNeural"),
            ("Japanese", "ja", "ja-JP-KeitaNeural"),
        ];
        let entries = rows
            .into_iter()
            .map(|(name, code, voice)| {
                (
                    name.to_string(),
                    LanguageEntry {
                        code: code.to_string(),
                        voice: voice.to_string(),
                    },
                )
            })
            .collect();
        Self { entries }
    }
}

impl LocaleTable {
    /// Build a table from explicit rows.
    pub fn from_entries(entries: BTreeMap<String, LanguageEntry>) -> Self {
        Self { entries }
    }

    /// Iterate `(language name, entry)` in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LanguageEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up a language by name (case-insensitive) or by code.
    pub fn find(&self, name_or_code: &str) -> Option<(&str, &LanguageEntry)> {
        self.iter().find(|(name, entry)| {
            name.eq_ignore_ascii_case(name_or_code) || entry.code.eq_ignore_ascii_case(name_or_code)
        })
    }

    /// Number of languages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no languages are configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validate every code.
    pub fn validate(&self) -> ReelResult<()> {
        for (name, entry) in &self.entries {
            Locale::new(&entry.code).map_err(|e| {
                ReelError::validation(format!("locale table entry '{name}': {e}"))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/text/locale.rs"]
mod tests;
