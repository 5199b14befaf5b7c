use std::{
    collections::HashMap,
    ffi::OsStr,
    io::ErrorKind,
    path::{Path, PathBuf},
    process::Stdio,
};

use anyhow::Context as _;
use async_trait::async_trait;
use tokio::process::Command;

use crate::{
    config::Config,
    language::Language,
    template::CommandTemplate,
    testing::RunCommand,
};

/// Language detection, compilation and binary bookkeeping for a source file.
#[async_trait]
pub trait Toolchain: Send + Sync {
    fn language(&self, src_path: &Path) -> anyhow::Result<Language>;

    /// Where the compiled artifact of `src_path` lives. Interpreted sources are their own "binary".
    fn bin_save_location(&self, src_path: &Path) -> PathBuf;

    /// Returns false if compilation failed; the details are reported by the toolchain itself.
    async fn compile(&self, src_path: &Path) -> bool;

    fn run_command(&self, src_path: &Path) -> anyhow::Result<RunCommand>;

    async fn delete_binary(&self, language: Language, bin_path: &Path);
}

/// Runs the compile/run commands configured per language through a shell.
#[derive(Debug, Clone)]
pub struct ShellToolchain {
    config: Config,
}

impl ShellToolchain {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Template variables, each quoted as a single shell word.
    fn interp_vars(src_path: &Path, bin_path: &Path) -> HashMap<&'static str, String> {
        let vars: [(&'static str, &OsStr); 5] = [
            ("srcPath", src_path.as_os_str()),
            ("srcDir", src_path.parent().unwrap_or(Path::new(".")).as_os_str()),
            ("srcName", src_path.file_name().unwrap_or_default()),
            ("srcStem", src_path.file_stem().unwrap_or_default()),
            ("binPath", bin_path.as_os_str()),
        ];
        vars.into_iter()
            .map(|(k, v)| (k, shell_words::quote(&v.to_string_lossy()).into_owned()))
            .collect()
    }

    fn render(&self, template: &str, src_path: &Path) -> anyhow::Result<String> {
        let bin_path = self.bin_save_location(src_path);
        let vars = Self::interp_vars(src_path, &bin_path);
        let cmd = CommandTemplate::parse(template)?.render(&vars)?;
        Ok(cmd)
    }

    async fn try_compile(&self, src_path: &Path) -> anyhow::Result<bool> {
        let lang = self.language(src_path)?;
        let Some(template) = self.config.language_config(lang).compile else {
            log::debug!("No compile step for {}", lang);
            return Ok(true);
        };
        let cmd = self.render(&template, src_path)?;
        let shell = &self.config.general.shell;

        log::info!("Compiling {}", src_path.to_string_lossy());
        log::info!("{}", cmd);

        let output = Command::new(shell)
            .args([OsStr::new("-c"), OsStr::new(&cmd)])
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to spawn '{} -c {}'", shell.to_string_lossy(), cmd))?;

        if output.status.success() {
            return Ok(true);
        }
        match output.status.code() {
            Some(code) => log::error!("Compile error: exitcode={}", code),
            None => log::error!("Failed to compile: process terminated by signal"),
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            log::error!("{}", stderr.trim_end());
        }
        Ok(false)
    }
}

#[async_trait]
impl Toolchain for ShellToolchain {
    fn language(&self, src_path: &Path) -> anyhow::Result<Language> {
        Ok(Language::from_path(src_path)?)
    }

    fn bin_save_location(&self, src_path: &Path) -> PathBuf {
        match Language::from_path(src_path) {
            Ok(lang) if lang.is_interpreted() => src_path.to_owned(),
            Ok(Language::Java) => fsutil::replace_extension(src_path, "class"),
            _ if cfg!(windows) => fsutil::replace_extension(src_path, "exe"),
            _ => fsutil::replace_extension(src_path, "bin"),
        }
    }

    async fn compile(&self, src_path: &Path) -> bool {
        self.try_compile(src_path).await.unwrap_or_else(|e| {
            log::error!("{:#}", e);
            false
        })
    }

    fn run_command(&self, src_path: &Path) -> anyhow::Result<RunCommand> {
        let lang = self.language(src_path)?;
        let template = self.config.language_config(lang).run;
        let cmd = self
            .render(&template, src_path)
            .with_context(|| format!("Bad run command for {}", lang))?;
        Ok(RunCommand::shell(&self.config.general.shell, cmd))
    }

    async fn delete_binary(&self, language: Language, bin_path: &Path) {
        if language.is_interpreted() {
            return;
        }
        match tokio::fs::remove_file(bin_path).await {
            Ok(()) => log::debug!("Removed {}", bin_path.to_string_lossy()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => log::warn!("Cannot remove '{}': {}", bin_path.to_string_lossy(), e),
        }
    }
}
