use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

pub type TestcaseId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub name: String,
    /// Contest label, usually `"<site> - <contest name>"`.
    pub group: String,
    pub url: String,
    pub src_path: PathBuf,
    pub tests: Vec<Testcase>,

    #[serde(default)]
    pub interactive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testcase {
    pub id: TestcaseId,
    pub input: String,
    /// Expected output
    pub output: String,
}

impl Problem {
    pub fn new(src_path: impl Into<PathBuf>) -> Self {
        let src_path = src_path.into();
        let name = src_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            group: String::new(),
            url: String::new(),
            src_path,
            tests: Vec::new(),
            interactive: false,
            memory_limit: None,
            time_limit: None,
        }
    }

    pub fn find_testcase(&self, id: TestcaseId) -> Option<&Testcase> {
        self.tests.iter().find(|t| t.id == id)
    }

    /// Appends a testcase with a fresh id (one past the current maximum) and returns that id.
    pub fn push_testcase(&mut self, input: impl Into<String>, output: impl Into<String>) -> TestcaseId {
        let id = self.tests.iter().map(|t| t.id).max().map_or(0, |m| m + 1);
        self.tests.push(Testcase {
            id,
            input: input.into(),
            output: output.into(),
        });
        id
    }
}

/// Raw result of running a program once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process did not exit normally.
    pub code: Option<i32>,
    /// Name of the terminating signal, e.g. `"SIGKILL"`.
    pub signal: Option<String>,
    #[serde(with = "millis")]
    pub time: Duration,
    #[serde(default)]
    pub timed_out: bool,
}

impl ExecutionRecord {
    /// True if the run must be judged as failed no matter what stdout says.
    pub fn is_hard_failure(&self, ignore_stderr: bool) -> bool {
        matches!(self.code, Some(c) if c != 0)
            || self.signal.is_some()
            || (!ignore_stderr && !self.stderr.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(flatten)]
    pub record: ExecutionRecord,
    pub pass: bool,
    pub id: TestcaseId,
}

/// Display classification of a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum JudgeCode {
    AC,
    WA,
    TLE,
    RE,
}

impl Verdict {
    pub fn judge_code(&self) -> JudgeCode {
        let r = &self.record;
        if self.pass {
            JudgeCode::AC
        } else if r.timed_out {
            JudgeCode::TLE
        } else if r.signal.is_some() || matches!(r.code, Some(c) if c != 0) {
            JudgeCode::RE
        } else {
            JudgeCode::WA
        }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
