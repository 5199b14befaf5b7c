use std::{
    path::{Path, PathBuf},
    process::exit,
};

use anyhow::Context as _;
use cph_core::{model::Problem, storage::ProblemStore};

pub fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|e| {
        eprintln!("Failed to get current dir: {}", e);
        exit(1);
    })
}

pub fn replace_homedir_to_tilde(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    let Some(home_dir) = ::dirs::home_dir() else {
        return path
    };
    path.strip_prefix(home_dir)
        .map(|path| Path::new("~").join(path))
        .unwrap_or(path)
}

/// Problems are keyed by absolute source path.
pub fn absolute_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_owned()
    } else {
        current_dir().join(path)
    }
}

pub fn load_problem(store: &impl ProblemStore, src_path: &Path) -> anyhow::Result<Problem> {
    store.load_problem(src_path).with_context(|| {
        format!(
            "No problem is stored for {} (add one with `cph test add`)",
            replace_homedir_to_tilde(src_path).to_string_lossy()
        )
    })
}
