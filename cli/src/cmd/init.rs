use std::path::PathBuf;

use anyhow::ensure;
use cph_core::{config::Config, print_success};

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(default_value = "./")]
    dir: PathBuf,
}

pub fn exec(args: &Args, _: &GlobalArgs) -> SubcmdResult {
    let filepath = args.dir.join(Config::FILENAME);
    ensure!(
        !filepath.exists(),
        "'{}' already exists",
        filepath.to_string_lossy()
    );
    fsutil::write_with_mkdir(&filepath, Config::example_toml())?;
    print_success!(
        "Successfully wrote example config. (path: {})",
        filepath.to_string_lossy()
    );
    Ok(())
}
