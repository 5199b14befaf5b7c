use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum LanguageError {
    #[error("Unsupported file extension '{0}'")]
    UnsupportedExtension(String),

    #[error("Cannot detect language: '{0}' has no file extension")]
    NoExtension(String),
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    C,
    Cpp,
    Rust,
    Go,
    Java,
    Haskell,
    Python,
    #[strum(serialize = "js")]
    #[serde(rename = "js")]
    JavaScript,
    Ruby,
    #[strum(serialize = "sh")]
    #[serde(rename = "sh")]
    Shell,
}

impl Language {
    pub fn from_extension(ext: &str) -> Result<Self, LanguageError> {
        use Language::*;
        let lang = match ext.to_ascii_lowercase().as_str() {
            "c" => C,
            "cpp" | "cc" | "cxx" => Cpp,
            "rs" => Rust,
            "go" => Go,
            "java" => Java,
            "hs" => Haskell,
            "py" => Python,
            "js" => JavaScript,
            "rb" => Ruby,
            "sh" => Shell,
            _ => return Err(LanguageError::UnsupportedExtension(ext.to_owned())),
        };
        Ok(lang)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LanguageError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .ok_or_else(|| LanguageError::NoExtension(path.to_string_lossy().into_owned()))?;
        Self::from_extension(&ext.to_string_lossy())
    }

    /// Interpreted languages are run from source and never leave a binary behind.
    pub fn is_interpreted(self) -> bool {
        use Language::*;
        matches!(self, Python | JavaScript | Ruby | Shell)
    }
}
