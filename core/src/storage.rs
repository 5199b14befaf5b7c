use std::path::{Path, PathBuf};

use crate::model::Problem;

pub trait ProblemStore: Send + Sync {
    fn save_problem(&self, src_path: &Path, problem: &Problem) -> fsutil::Result<()>;
    fn load_problem(&self, src_path: &Path) -> fsutil::Result<Problem>;
}

/// Stores each problem as JSON in a hidden dir next to its source:
/// `<src dir>/.cph/.<src file name>.prob`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonProblemStore;

impl JsonProblemStore {
    pub const DIR_NAME: &str = ".cph";

    pub fn problem_filepath(src_path: &Path) -> PathBuf {
        let dir = src_path.parent().unwrap_or(Path::new("."));
        let name = src_path
            .file_name()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        dir.join(Self::DIR_NAME).join(format!(".{}.prob", name))
    }
}

impl ProblemStore for JsonProblemStore {
    fn save_problem(&self, src_path: &Path, problem: &Problem) -> fsutil::Result<()> {
        fsutil::write_json_with_mkdir(Self::problem_filepath(src_path), problem)
    }

    fn load_problem(&self, src_path: &Path) -> fsutil::Result<Problem> {
        fsutil::read_json_with_deserialize(Self::problem_filepath(src_path))
    }
}
