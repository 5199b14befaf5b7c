pub mod archive;
pub mod init;
pub mod run;
pub mod test;

use std::path::PathBuf;

use cph_core::config::Config;

use crate::util;

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,

    /// Use this config file instead of searching `cph.toml` in ancestor dirs
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    Archive(archive::Args),
    Init(init::Args),

    #[command(alias("r"))]
    Run(run::Args),

    #[command(alias("t"), subcommand)]
    Test(test::Subcommand),
}

pub type SubcmdResult = anyhow::Result<()>;

impl GlobalArgs {
    pub async fn exec_subcmd(&self) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Archive(args) => archive::exec(args, self),
            Init(args) => init::exec(args, self),
            Run(args) => run::exec(args, self).await,
            Test(subcmd) => test::exec(subcmd, self),
        }
    }

    pub fn load_config(&self) -> anyhow::Result<Config> {
        match &self.config {
            Some(path) => Config::from_toml_file(path.clone()),
            None => Config::from_file_finding_in_ancestors_or_default(util::current_dir()),
        }
    }
}
