pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}
use std::path::PathBuf;
use std::sync::Arc;

use error::*;
use tokio::task::JoinHandle;

use crate::archive::Archiver;
use crate::config::JudgeConfig;
use crate::model::{Problem, TestcaseId, Verdict};
use crate::report::{ExtensionMessage, Notifier, ReportSink};
use crate::storage::ProblemStore;
use crate::testing::{Judge, TestRunner};
use crate::toolchain::Toolchain;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    NoSuchTestcase(TestcaseId),
    CompileFailed,
}

pub type ArchivalHandle = JoinHandle<Option<PathBuf>>;

#[derive(Debug)]
pub enum RunOutcome {
    /// A verdict was delivered to the sink. `archival` is set when archiving was started.
    Judged {
        verdict: Verdict,
        archival: Option<ArchivalHandle>,
    },
    Aborted(AbortReason),
    /// The program could not be launched. No verdict was delivered, but archiving may have started.
    LaunchFailed {
        error: Error,
        archival: Option<ArchivalHandle>,
    },
}

impl RunOutcome {
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            RunOutcome::Judged { verdict, .. } => Some(verdict),
            RunOutcome::Aborted(_) | RunOutcome::LaunchFailed { .. } => None,
        }
    }

    /// Waits for the archival task, if any. Returns the archived path on success.
    pub async fn wait_archival(&mut self) -> Option<PathBuf> {
        let archival = match self {
            RunOutcome::Judged { archival, .. } | RunOutcome::LaunchFailed { archival, .. } => {
                archival
            }
            RunOutcome::Aborted(_) => return None,
        };
        match archival.take()?.await {
            Ok(path) => path,
            Err(e) => {
                log::error!("Archival task panicked: {}", e);
                None
            }
        }
    }
}

/// Compiles, runs and judges one testcase, then reports and archives.
pub struct Orchestrator {
    toolchain: Arc<dyn Toolchain>,
    store: Arc<dyn ProblemStore>,
    sink: Arc<dyn ReportSink>,
    notifier: Arc<dyn Notifier>,
    judge: Judge,
    config: JudgeConfig,
}

impl Orchestrator {
    pub fn new(
        toolchain: Arc<dyn Toolchain>,
        store: Arc<dyn ProblemStore>,
        sink: Arc<dyn ReportSink>,
        notifier: Arc<dyn Notifier>,
        config: JudgeConfig,
    ) -> Self {
        Self {
            toolchain,
            store,
            sink,
            notifier,
            judge: Judge::from(config.comparator),
            config,
        }
    }

    pub fn config(&self) -> &JudgeConfig {
        &self.config
    }

    /// Aborts without a verdict only when `test_id` is unknown or compilation fails.
    /// Misbehaving programs yield a failing verdict. `Err` means the source language is unknown.
    pub async fn run_and_save(
        &self,
        problem: &Problem,
        test_id: TestcaseId,
        skip_compile: bool,
    ) -> Result<RunOutcome> {
        let src_path = problem.src_path.as_path();
        log::info!(
            "Run and save started: {} (testcase {})",
            src_path.to_string_lossy(),
            test_id
        );

        let language = self.toolchain.language(src_path)?;
        let bin_path = self.toolchain.bin_save_location(src_path);

        let Some(testcase) = problem.find_testcase(test_id) else {
            log::error!(
                "Invalid testcase id {} for {}",
                test_id,
                src_path.to_string_lossy()
            );
            return Ok(RunOutcome::Aborted(AbortReason::NoSuchTestcase(test_id)));
        };

        // Saved before compiling so that edited testcases survive a failing build.
        if let Err(e) = self.store.save_problem(src_path, problem) {
            log::error!("Failed to save problem: {}", e);
        }

        if !skip_compile && !self.toolchain.compile(src_path).await {
            log::error!("Failed to compile {}", src_path.to_string_lossy());
            return Ok(RunOutcome::Aborted(AbortReason::CompileFailed));
        }

        let runner = TestRunner::new().execution_time_limit(self.config.timeout);
        let run = match self.toolchain.run_command(src_path) {
            Ok(cmd) => {
                log::debug!("Running: {}", cmd);
                runner.run(&cmd, &testcase.input).await
            }
            Err(e) => Err(e),
        };

        if !skip_compile {
            self.toolchain.delete_binary(language, &bin_path).await;
        }

        let run = match run {
            Ok(run) => run,
            Err(e) => {
                log::error!("Failed to run testcase {}: {:#}", test_id, e);
                return Ok(RunOutcome::LaunchFailed {
                    error: e.context(format!("Failed to run testcase {}", test_id)),
                    archival: self.spawn_archival(problem),
                });
            }
        };

        let pass = !run.is_hard_failure(self.config.ignore_stderr)
            && self.judge.is_correct(testcase, &run.stdout);
        let verdict = Verdict {
            record: run,
            pass,
            id: test_id,
        };

        log::info!(
            "Testcase {} judged: pass={} code={:?} signal={:?} [{}ms]",
            test_id,
            verdict.pass,
            verdict.record.code,
            verdict.record.signal,
            verdict.record.time.as_millis()
        );
        self.sink.deliver(ExtensionMessage::RunSingleResult {
            result: verdict.clone(),
            problem: problem.clone(),
        });

        let archival = self.spawn_archival(problem);
        Ok(RunOutcome::Judged { verdict, archival })
    }

    fn spawn_archival(&self, problem: &Problem) -> Option<ArchivalHandle> {
        let root = self.config.archive_root.clone()?;
        let archiver = Archiver::new(Arc::clone(&self.notifier));
        let problem = problem.clone();
        Some(tokio::task::spawn_blocking(move || {
            archiver.archive(&problem.src_path, &root, &problem)
        }))
    }
}

#[cfg(all(test, unix))]
mod test {
    use std::path::Path;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::language::Language;
    use crate::report::{ChannelSink, CollectingNotifier};
    use crate::testing::{CompareMode, RunCommand};

    type Events = Arc<Mutex<Vec<&'static str>>>;

    struct FakeToolchain {
        compile_ok: bool,
        run: RunCommand,
        events: Events,
    }

    #[async_trait]
    impl Toolchain for FakeToolchain {
        fn language(&self, src_path: &Path) -> anyhow::Result<Language> {
            Ok(Language::from_path(src_path)?)
        }

        fn bin_save_location(&self, src_path: &Path) -> PathBuf {
            src_path.with_extension("bin")
        }

        async fn compile(&self, _src_path: &Path) -> bool {
            self.events.lock().unwrap().push("compile");
            self.compile_ok
        }

        fn run_command(&self, _src_path: &Path) -> anyhow::Result<RunCommand> {
            Ok(self.run.clone())
        }

        async fn delete_binary(&self, _language: Language, _bin_path: &Path) {
            self.events.lock().unwrap().push("delete");
        }
    }

    struct FakeStore {
        events: Events,
    }

    impl ProblemStore for FakeStore {
        fn save_problem(&self, _src_path: &Path, _problem: &Problem) -> fsutil::Result<()> {
            self.events.lock().unwrap().push("save");
            Ok(())
        }

        fn load_problem(&self, src_path: &Path) -> fsutil::Result<Problem> {
            Ok(Problem::new(src_path))
        }
    }

    struct Fixture {
        orchestrator: Orchestrator,
        events: Events,
        rx: tokio::sync::mpsc::UnboundedReceiver<ExtensionMessage>,
        notifier: CollectingNotifier,
        problem: Problem,
    }

    fn fixture(script: &str, compile_ok: bool, config: JudgeConfig) -> Fixture {
        let events = Events::default();
        let (sink, rx) = ChannelSink::new();
        let notifier = CollectingNotifier::default();
        let toolchain = FakeToolchain {
            compile_ok,
            run: RunCommand::shell("/bin/sh", script),
            events: events.clone(),
        };
        let store = FakeStore {
            events: events.clone(),
        };
        let orchestrator = Orchestrator::new(
            Arc::new(toolchain),
            Arc::new(store),
            Arc::new(sink),
            Arc::new(notifier.clone()),
            config,
        );
        let mut problem = Problem::new("/nonexistent/dir/a.cpp");
        problem.group = "Codeforces - Round 900".into();
        problem.push_testcase("3\n", "9\n");
        Fixture {
            orchestrator,
            events,
            rx,
            notifier,
            problem,
        }
    }

    fn quick() -> JudgeConfig {
        JudgeConfig {
            timeout: std::time::Duration::from_millis(500),
            ..JudgeConfig::default()
        }
    }

    async fn verdict_of(script: &str, config: JudgeConfig) -> Verdict {
        let f = fixture(script, true, config);
        let outcome = f.orchestrator.run_and_save(&f.problem, 0, false).await.unwrap();
        outcome.verdict().cloned().unwrap()
    }

    #[tokio::test]
    async fn correct_output_passes_and_is_reported() {
        let mut f = fixture(r#"read n; echo $((n * n))"#, true, quick());
        let outcome = f.orchestrator.run_and_save(&f.problem, 0, false).await.unwrap();

        let verdict = outcome.verdict().unwrap();
        assert!(verdict.pass);
        assert_eq!(verdict.id, 0);
        assert_eq!(verdict.record.stdout, "9\n");
        assert_eq!(verdict.record.code, Some(0));
        assert_eq!(verdict.record.signal, None);
        assert_eq!(*f.events.lock().unwrap(), vec!["save", "compile", "delete"]);

        let msg = f.rx.try_recv().unwrap();
        assert_eq!(
            msg,
            ExtensionMessage::RunSingleResult {
                result: verdict.clone(),
                problem: f.problem.clone(),
            }
        );
        assert!(f.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn wrong_answer() {
        let v = verdict_of("echo 10", quick()).await;
        assert!(!v.pass);
        assert_eq!(v.record.code, Some(0));
    }

    #[tokio::test]
    async fn nonzero_exit_fails_even_with_correct_output() {
        let v = verdict_of("echo 9; exit 1", quick()).await;
        assert_eq!(v.record.stdout, "9\n");
        assert_eq!(v.record.code, Some(1));
        assert!(!v.pass);
    }

    #[tokio::test]
    async fn signal_fails_even_with_correct_output() {
        let v = verdict_of("echo 9; kill -ABRT $$", quick()).await;
        assert_eq!(v.record.signal.as_deref(), Some("SIGABRT"));
        assert!(!v.pass);
    }

    #[tokio::test]
    async fn stderr_fails_by_default() {
        let v = verdict_of("echo 9; echo debug >&2", quick()).await;
        assert_eq!(v.record.stdout, "9\n");
        assert_eq!(v.record.stderr, "debug\n");
        assert!(!v.pass);
    }

    #[tokio::test]
    async fn stderr_is_tolerated_when_ignored() {
        let config = JudgeConfig {
            ignore_stderr: true,
            ..quick()
        };
        let v = verdict_of("echo 9; echo debug >&2", config.clone()).await;
        assert!(v.pass);

        let v = verdict_of("echo 8; echo debug >&2", config).await;
        assert!(!v.pass);
    }

    #[tokio::test]
    async fn timeout_fails() {
        let v = verdict_of("while :; do :; done", quick()).await;
        assert_eq!(v.record.code, None);
        assert!(v.record.signal.is_some());
        assert!(v.record.timed_out);
        assert!(!v.pass);
    }

    #[tokio::test]
    async fn unknown_testcase_aborts_silently() {
        let mut f = fixture("echo 9", true, quick());
        let outcome = f.orchestrator.run_and_save(&f.problem, 7, false).await.unwrap();
        assert!(matches!(
            outcome,
            RunOutcome::Aborted(AbortReason::NoSuchTestcase(7))
        ));
        assert!(f.events.lock().unwrap().is_empty());
        assert!(f.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn compile_failure_aborts_after_saving() {
        let mut f = fixture("echo 9", false, quick());
        let outcome = f.orchestrator.run_and_save(&f.problem, 0, false).await.unwrap();
        assert!(matches!(
            outcome,
            RunOutcome::Aborted(AbortReason::CompileFailed)
        ));
        assert_eq!(*f.events.lock().unwrap(), vec!["save", "compile"]);
        assert!(f.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn skip_compile_leaves_binary_alone() {
        let f = fixture("echo 9", false, quick());
        let outcome = f.orchestrator.run_and_save(&f.problem, 0, true).await.unwrap();
        assert!(outcome.verdict().unwrap().pass);
        assert_eq!(*f.events.lock().unwrap(), vec!["save"]);
    }

    #[tokio::test]
    async fn launch_failure_cleans_up_and_still_archives() {
        let tmp = tempfile::tempdir().unwrap();
        let config = JudgeConfig {
            archive_root: Some(tmp.path().join("archive")),
            ..quick()
        };
        let mut f = fixture("echo 9", true, config);
        f.problem.src_path = tmp.path().join("a.cpp");
        fsutil::write(&f.problem.src_path, "int main() {}\n").unwrap();
        let toolchain = FakeToolchain {
            compile_ok: true,
            run: RunCommand::new("/nonexistent/program"),
            events: f.events.clone(),
        };
        f.orchestrator.toolchain = Arc::new(toolchain);

        let mut outcome = f.orchestrator.run_and_save(&f.problem, 0, false).await.unwrap();
        let RunOutcome::LaunchFailed { error, .. } = &outcome else {
            panic!("unexpected outcome: {:?}", outcome);
        };
        assert!(format!("{:#}", error).contains("Failed to run testcase 0"));
        assert_eq!(outcome.verdict(), None);
        assert_eq!(*f.events.lock().unwrap(), vec!["save", "compile", "delete"]);
        assert!(f.rx.try_recv().is_err());

        let archived = outcome.wait_archival().await.unwrap();
        assert_eq!(archived, tmp.path().join("archive/Codeforces/Round_900/a.cpp"));
        assert_eq!(fsutil::read_to_string(&archived).unwrap(), "int main() {}\n");
    }

    #[tokio::test]
    async fn exact_comparator_from_config() {
        let v = verdict_of("printf 9", quick()).await;
        assert!(v.pass);

        let config = JudgeConfig {
            comparator: CompareMode::Exact,
            ..quick()
        };
        let v = verdict_of("printf 9", config).await;
        assert!(!v.pass);
    }

    #[tokio::test]
    async fn no_archival_without_archive_root() {
        let f = fixture("echo 9", true, quick());
        let mut outcome = f.orchestrator.run_and_save(&f.problem, 0, false).await.unwrap();
        assert!(matches!(
            outcome,
            RunOutcome::Judged { archival: None, .. }
        ));
        assert_eq!(outcome.wait_archival().await, None);
    }

    #[tokio::test]
    async fn archival_failure_does_not_affect_verdict() {
        let tmp = tempfile::tempdir().unwrap();
        let config = JudgeConfig {
            archive_root: Some(tmp.path().to_owned()),
            ..quick()
        };
        // The source file does not exist, so archiving fails.
        let f = fixture("echo 9", true, config);
        let mut outcome = f.orchestrator.run_and_save(&f.problem, 0, false).await.unwrap();
        assert!(outcome.verdict().unwrap().pass);
        assert_eq!(outcome.wait_archival().await, None);

        let msgs = f.notifier.messages();
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("a.cpp"), "{}", msgs[0]);
    }
}
