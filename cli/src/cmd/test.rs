use std::path::PathBuf;

use colored::Colorize as _;
use cph_core::{
    model::Problem,
    print_success,
    storage::{JsonProblemStore, ProblemStore},
};

use crate::util;

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    /// Append a testcase to the problem of a source file
    Add(AddArgs),
    /// Show stored testcases
    #[command(alias("ls"))]
    List(ListArgs),
}

#[derive(Debug, clap::Args)]
pub struct AddArgs {
    pub src: PathBuf,

    /// File containing the input
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// File containing the expected output
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Contest label such as "Codeforces - Round 900"
    #[arg(short = 'g', long)]
    pub group: Option<String>,

    #[arg(long)]
    pub url: Option<String>,

    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Debug, clap::Args)]
pub struct ListArgs {
    pub src: PathBuf,
}

pub fn exec(subcmd: &Subcommand, _global_args: &GlobalArgs) -> SubcmdResult {
    match subcmd {
        Subcommand::Add(args) => add(args),
        Subcommand::List(args) => list(args),
    }
}

fn add(args: &AddArgs) -> SubcmdResult {
    let src = util::absolute_path(&args.src);
    let store = JsonProblemStore;

    let mut problem = if JsonProblemStore::problem_filepath(&src).exists() {
        util::load_problem(&store, &src)?
    } else {
        Problem::new(&src)
    };
    if let Some(group) = &args.group {
        problem.group = group.clone();
    }
    if let Some(url) = &args.url {
        problem.url = url.clone();
    }
    if let Some(name) = &args.name {
        problem.name = name.clone();
    }

    let input = fsutil::read_to_string(&args.input)?;
    let output = fsutil::read_to_string(&args.output)?;
    let id = problem.push_testcase(input, output);
    store.save_problem(&src, &problem)?;

    print_success!(
        "Added testcase {} to {}",
        id,
        util::replace_homedir_to_tilde(&src).to_string_lossy()
    );
    Ok(())
}

fn list(args: &ListArgs) -> SubcmdResult {
    let src = util::absolute_path(&args.src);
    let problem = util::load_problem(&JsonProblemStore, &src)?;

    println!("{} ({})", problem.name.bold(), problem.group);
    if problem.tests.is_empty() {
        println!("{}", "<NO TESTCASES>".magenta().dimmed());
    }
    for t in &problem.tests {
        println!("{}", format!("Testcase {}", t.id).bright_yellow().bold());
        println!("{}", "[input]".cyan().bold());
        print!("{}", t.input);
        println!("{}", "[expected]".cyan().bold());
        print!("{}", t.output);
    }
    Ok(())
}
