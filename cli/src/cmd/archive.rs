use std::path::PathBuf;

use anyhow::{bail, Context as _};
use cph_core::{archive::Archiver, config::Config, print_success, storage::JsonProblemStore};

use crate::{ui::StderrNotifier, util};

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Source file whose stored problem decides the destination
    pub src: PathBuf,
}

pub fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = global_args.load_config()?;
    let archive_root = cfg
        .general
        .judge_config()
        .archive_root
        .with_context(|| {
            format!(
                "archive_folder_location is not set in '{}'",
                Config::FILENAME
            )
        })?;

    let src = util::absolute_path(&args.src);
    let problem = util::load_problem(&JsonProblemStore, &src)?;

    let Some(dest) = Archiver::new(StderrNotifier).archive(&src, &archive_root, &problem) else {
        bail!("Failed to archive {}", src.to_string_lossy());
    };
    print_success!(
        "Archived to {}",
        util::replace_homedir_to_tilde(dest).to_string_lossy()
    );
    Ok(())
}
