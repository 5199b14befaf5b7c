//! Copies solved sources into `<root>/<site>/<contest>/<file>`.

use std::path::{Path, PathBuf};

use lazy_regex::regex;

use crate::{model::Problem, report::Notifier};

pub const LOCAL_SITE: &str = "local";
pub const PLACEHOLDER_FILE_NAME: &str = "untitled";

/// Splits `"<site> - <contest>"` at the first `-`. Without a `-`, the site is [`LOCAL_SITE`].
pub fn split_group(group: &str) -> (&str, &str) {
    match group.split_once('-') {
        Some((site, name)) => (site.trim(), name.trim()),
        None => (LOCAL_SITE, group.trim()),
    }
}

/// Turns an arbitrary label into a single path segment.
///
/// Runs of letters/hyphens and runs of digits are kept and joined with `_`.
/// A label with no such run has every run of non-word chars replaced by `_` instead.
/// The result is never empty.
pub fn sanitize_segment(s: &str) -> String {
    let words: Vec<&str> = regex!(r"[\p{L}-]+|\p{N}+")
        .find_iter(s)
        .map(|m| m.as_str())
        .collect();
    if !words.is_empty() {
        return words.join("_");
    }
    let replaced = regex!(r"\W+").replace_all(s, "_");
    if replaced.is_empty() {
        "_".to_owned()
    } else {
        replaced.into_owned()
    }
}

pub fn archive_file_name(src_path: &Path) -> &str {
    match fsutil::file_name_str(src_path) {
        Some(name) if !name.is_empty() => name,
        _ => PLACEHOLDER_FILE_NAME,
    }
}

/// Destination of the archived copy of `problem`'s source.
pub fn archive_path(archive_root: &Path, src_path: &Path, problem: &Problem) -> PathBuf {
    let (site, name) = split_group(&problem.group);
    archive_root
        .join(sanitize_segment(site))
        .join(sanitize_segment(name))
        .join(archive_file_name(src_path))
}

pub struct Archiver<N> {
    notifier: N,
}

impl<N: Notifier> Archiver<N> {
    pub fn new(notifier: N) -> Self {
        Self { notifier }
    }

    /// Copies `src_path` verbatim, overwriting an earlier copy.
    /// Never fails: errors go to the notifier and `None` is returned.
    pub fn archive(&self, src_path: &Path, archive_root: &Path, problem: &Problem) -> Option<PathBuf> {
        let dest = archive_path(archive_root, src_path, problem);
        match Self::copy(src_path, &dest) {
            Ok(()) => {
                log::info!("Archived to {}", dest.to_string_lossy());
                Some(dest)
            }
            Err(e) => {
                let msg = format!(
                    "Failed to archive '{}': {}",
                    archive_file_name(src_path),
                    e
                );
                log::error!("{}", msg);
                self.notifier.show_error(&msg);
                None
            }
        }
    }

    fn copy(src_path: &Path, dest: &Path) -> fsutil::Result<()> {
        if let Some(dir) = dest.parent() {
            fsutil::mkdir_all(dir)?;
        }
        let contents = fsutil::read(src_path)?;
        fsutil::write(dest, contents)
    }
}
