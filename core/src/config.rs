use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::result::Result as StdResult;
use std::time::Duration;

use anyhow::{bail, Context as _};
use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::language::Language;
use crate::testing::CompareMode;
use crate::template::CommandTemplate;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    #[serde(default)]
    pub general: GeneralConfig,
    /// Keyed by language name (`cpp`, `python`, ...). Missing entries fall back to built-in commands.
    #[serde(default)]
    pub language: HashMap<String, LanguageConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub ignore_stderr: bool,
    /// Empty disables archiving.
    pub archive_folder_location: String,
    pub timeout_ms: u64,
    pub shell: PathBuf,
    pub comparator: CompareMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LanguageConfig {
    pub compile: Option<String>,
    pub run: String,
}

/// Settings the run-and-judge pipeline needs, decoupled from the config file layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeConfig {
    pub ignore_stderr: bool,
    pub archive_root: Option<PathBuf>,
    pub timeout: Duration,
    pub comparator: CompareMode,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            ignore_stderr: false,
            archive_folder_location: String::new(),
            timeout_ms: 3000,
            shell: PathBuf::from("/bin/sh"),
            comparator: CompareMode::default(),
        }
    }
}

impl Default for JudgeConfig {
    fn default() -> Self {
        GeneralConfig::default().judge_config()
    }
}

impl GeneralConfig {
    pub fn judge_config(&self) -> JudgeConfig {
        let archive = self.archive_folder_location.trim();
        JudgeConfig {
            ignore_stderr: self.ignore_stderr,
            archive_root: (!archive.is_empty()).then(|| PathBuf::from(archive)),
            timeout: Duration::from_millis(self.timeout_ms),
            comparator: self.comparator,
        }
    }
}

impl LanguageConfig {
    pub const VARIABLES: [&str; 5] = ["srcPath", "srcDir", "srcName", "srcStem", "binPath"];

    pub fn builtin(lang: Language) -> Self {
        use Language::*;
        let (compile, run) = match lang {
            C => (Some("gcc -O2 -o #{binPath} #{srcPath} -lm"), "#{binPath}"),
            Cpp => (Some("g++ -std=c++17 -O2 -o #{binPath} #{srcPath}"), "#{binPath}"),
            Rust => (Some("rustc -O -o #{binPath} #{srcPath}"), "#{binPath}"),
            Go => (Some("go build -o #{binPath} #{srcPath}"), "#{binPath}"),
            Haskell => (Some("ghc -O2 -o #{binPath} #{srcPath}"), "#{binPath}"),
            Java => (
                Some("javac -d #{srcDir} #{srcPath}"),
                "java -cp #{srcDir} #{srcStem}",
            ),
            Python => (None, "python3 #{srcPath}"),
            JavaScript => (None, "node #{srcPath}"),
            Ruby => (None, "ruby #{srcPath}"),
            Shell => (None, "sh #{srcPath}"),
        };
        Self {
            compile: compile.map(str::to_owned),
            run: run.to_owned(),
        }
    }
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

impl Config {
    pub const FILENAME: &str = "cph.toml";

    pub fn example_toml() -> String {
        Asset::get(Self::FILENAME)
            .map(|file| String::from_utf8_lossy(file.data.as_ref()).into_owned())
            .unwrap_or_default()
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.validate()
            .with_context(|| format!("Invalid config: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Find config file ancestor dirs, including current dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let cur_dir = cur_dir.as_ref();
        cur_dir
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .find(|path| path.is_file())
            .with_context(|| format!("Cannot find '{}' in any ancestor dir", Self::FILENAME))
    }

    /// Loads the nearest config file, or defaults when there is none.
    pub fn from_file_finding_in_ancestors_or_default(
        cur_dir: impl AsRef<Path>,
    ) -> anyhow::Result<Self> {
        match Self::find_file_in_ancestors(cur_dir) {
            Ok(path) => Self::from_toml_file(path),
            Err(e) => {
                log::debug!("{:#}; using default config", e);
                Ok(Self::default())
            }
        }
    }

    pub fn language_config(&self, lang: Language) -> LanguageConfig {
        self.language
            .get(&lang.to_string())
            .cloned()
            .unwrap_or_else(|| LanguageConfig::builtin(lang))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, entry) in &self.language {
            name.parse::<Language>()
                .with_context(|| format!("Unknown language '{}' in [language] table", name))?;
            let templates = entry.compile.iter().chain(std::iter::once(&entry.run));
            for t in templates {
                let t = CommandTemplate::parse(t)
                    .with_context(|| format!("Bad command for language '{}'", name))?;
                let unknown = t
                    .variables()
                    .find(|v| !LanguageConfig::VARIABLES.contains(v))
                    .map(str::to_owned);
                if let Some(var) = unknown {
                    bail!(
                        "Unknown variable '{}' in command '{}' for language '{}'",
                        var,
                        t,
                        name
                    );
                }
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_config_file: None,
            general: GeneralConfig::default(),
            language: HashMap::new(),
        }
    }
}
