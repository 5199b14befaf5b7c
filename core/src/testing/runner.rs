use std::{
    ffi::{OsStr, OsString},
    fmt,
    io::ErrorKind,
    path::PathBuf,
    process::{ExitStatus, Stdio},
    time::Duration,
};

use anyhow::Context as _;
use tokio::{io::AsyncWriteExt as _, process::Command};

use crate::model::ExecutionRecord;

/// Program and arguments to launch for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl RunCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// `<shell> -c <script>`
    pub fn shell(shell: impl Into<PathBuf>, script: impl AsRef<OsStr>) -> Self {
        Self::new(shell).arg("-c").arg(script)
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }
}

impl fmt::Display for RunCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for a in &self.args {
            write!(f, " {}", a.to_string_lossy())?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TestRunner {
    execution_time_limit: Duration,
}

impl Default for TestRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRunner {
    pub const DEFAULT_EXEC_TIME_LIMIT: Duration = Duration::from_millis(3000);
    pub const TIMEOUT_SIGNAL: &str = "SIGKILL";

    pub fn new() -> Self {
        Self {
            execution_time_limit: Self::DEFAULT_EXEC_TIME_LIMIT,
        }
    }

    pub fn execution_time_limit(mut self, limit: Duration) -> Self {
        self.execution_time_limit = limit;
        self
    }

    /// Runs `cmd` once, feeding `input` to its stdin.
    ///
    /// Fails only when the process cannot be spawned or its pipes cannot be serviced.
    /// A crash, a non-zero exit or a timeout is reported inside the returned record.
    pub async fn run(&self, cmd: &RunCommand, input: &str) -> anyhow::Result<ExecutionRecord> {
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // The program is usually a grandchild (`sh -c <cmd>`), so the whole group has to go.
        #[cfg(unix)]
        command.process_group(0);

        let mut proc = command
            .spawn()
            .with_context(|| format!("Failed to spawn '{}'", cmd))?;
        let group = ProcessGroup(proc.id());
        let mut stdin = proc.stdin.take().context("Failed to open stdin")?;
        let mut stdout = proc.stdout.take().context("Failed to open stdout")?;
        let mut stderr = proc.stderr.take().context("Failed to open stderr")?;

        let start_at = tokio::time::Instant::now();

        let res = {
            let fut_stdin = async move {
                match stdin.write_all(input.as_bytes()).await {
                    // The program exited without consuming all of its input.
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
                    res => res,
                }
                // stdin is dropped (closed) here so that the program observes EOF.
            };
            let fut_stdout = tokio::io::copy(&mut stdout, &mut stdout_buf);
            let fut_stderr = tokio::io::copy(&mut stderr, &mut stderr_buf);
            let fut_exit_status = proc.wait();

            tokio::time::timeout(self.execution_time_limit, async {
                tokio::try_join!(fut_stdin, fut_stdout, fut_stderr, fut_exit_status)
                    .context("Failed to communicate with subprocess")
            })
            .await
        };

        let time = start_at.elapsed();

        let (code, signal, timed_out) = match res {
            Err(_) => {
                log::debug!("Killing '{}' after {}ms", cmd, time.as_millis());
                group.kill();
                proc.kill()
                    .await
                    .unwrap_or_else(|e| log::warn!("Failed to kill timed-out process: {:#}", e));
                (None, Some(Self::TIMEOUT_SIGNAL.to_owned()), true)
            }

            Ok(Err(e)) => return Err(e),

            Ok(Ok((_, _, _, exit_status))) => {
                (exit_status.code(), signal_name(&exit_status), false)
            }
        };

        Ok(ExecutionRecord {
            stdout: String::from_utf8_lossy(&stdout_buf).into_owned(),
            stderr: String::from_utf8_lossy(&stderr_buf).into_owned(),
            code,
            signal,
            time,
            timed_out,
        })
    }
}

/// Process group led by a spawned child. Dropping it kills whatever is left in the group.
struct ProcessGroup(Option<u32>);

impl ProcessGroup {
    #[cfg(unix)]
    fn kill(&self) {
        use nix::{
            errno::Errno,
            sys::signal::{killpg, Signal},
            unistd::Pid,
        };

        let Some(pgid) = self.0 else {
            return;
        };
        match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => log::debug!("Cannot kill process group {}: {}", pgid, e),
        }
    }

    #[cfg(not(unix))]
    fn kill(&self) {}
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[cfg(unix)]
fn signal_name(status: &ExitStatus) -> Option<String> {
    use std::os::unix::process::ExitStatusExt as _;

    let sig = status.signal()?;
    let name = match sig {
        1 => "SIGHUP",
        2 => "SIGINT",
        3 => "SIGQUIT",
        4 => "SIGILL",
        5 => "SIGTRAP",
        6 => "SIGABRT",
        7 => "SIGBUS",
        8 => "SIGFPE",
        9 => "SIGKILL",
        11 => "SIGSEGV",
        13 => "SIGPIPE",
        14 => "SIGALRM",
        15 => "SIGTERM",
        24 => "SIGXCPU",
        25 => "SIGXFSZ",
        n => return Some(format!("SIG{}", n)),
    };
    Some(name.to_owned())
}

#[cfg(not(unix))]
fn signal_name(_status: &ExitStatus) -> Option<String> {
    None
}
