use std::{io, path::PathBuf, sync::Arc};

use anyhow::bail;
use cph_core::{
    action::AbortReason,
    model::TestcaseId,
    report::{ChannelSink, ExtensionMessage, JsonLineSink, ReportSink},
    storage::JsonProblemStore,
    style,
    toolchain::ShellToolchain,
    Orchestrator, RunOutcome,
};

use crate::{
    ui::{self, StderrNotifier},
    util,
};

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Source file of the solution
    pub src: PathBuf,

    #[arg(long, default_value_t = 0)]
    pub id: TestcaseId,

    /// Run the existing binary as is
    #[arg(long)]
    pub skip_compile: bool,

    /// Print the result message as a JSON line instead of a report
    #[arg(long)]
    pub json: bool,
}

pub async fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = global_args.load_config()?;
    let src = util::absolute_path(&args.src);
    let store = JsonProblemStore;
    let problem = util::load_problem(&store, &src)?;
    let judge_cfg = cfg.general.judge_config();

    let (sink, mut rx): (Arc<dyn ReportSink>, _) = if args.json {
        (Arc::new(JsonLineSink::new(io::stdout())), None)
    } else {
        let (sink, rx) = ChannelSink::new();
        (Arc::new(sink), Some(rx))
    };
    let orchestrator = Orchestrator::new(
        Arc::new(ShellToolchain::new(cfg)),
        Arc::new(store),
        sink,
        Arc::new(StderrNotifier),
        judge_cfg,
    );

    let spinner = (!args.json).then(|| ui::spinner(format!("Testcase {} ...", args.id)));
    let res = orchestrator
        .run_and_save(&problem, args.id, args.skip_compile)
        .await;
    if let Some(spinner) = spinner {
        spinner.lock().await.finish_and_clear();
    }
    let mut outcome = res?;

    if let Some(rx) = &mut rx {
        while let Ok(ExtensionMessage::RunSingleResult { result, problem }) = rx.try_recv() {
            println!("{}", style::verdict_summary(&result));
            if let Some(t) = problem.find_testcase(result.id).filter(|_| !result.pass) {
                style::print_verdict_detail(&result, t);
            }
        }
    }

    if let Some(dest) = outcome.wait_archival().await {
        log::info!("Archived to {}", dest.to_string_lossy());
    }

    match outcome {
        RunOutcome::Judged { verdict, .. } if verdict.pass => Ok(()),
        RunOutcome::Judged { verdict, .. } => {
            bail!("Testcase {} failed ({})", verdict.id, verdict.judge_code())
        }
        RunOutcome::Aborted(AbortReason::NoSuchTestcase(id)) => {
            let ids: Vec<_> = problem.tests.iter().map(|t| t.id.to_string()).collect();
            bail!(
                "No testcase with id {} (available: {})",
                id,
                ids.join(", ")
            )
        }
        RunOutcome::Aborted(AbortReason::CompileFailed) => {
            bail!("Failed to compile {}", src.to_string_lossy())
        }
        RunOutcome::LaunchFailed { error, .. } => Err(error),
    }
}
