use serde::{de::DeserializeOwned, Serialize};
use std::{
    fmt, fs,
    io::{self, BufReader},
    path::{Path, PathBuf},
};

pub mod error {
    use std::{io, path::PathBuf};

    use super::Action;

    pub type Result<T> = std::result::Result<T, self::Error>;

    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("Cannot {0} '{}': {2}", .1.to_string_lossy())]
        Io(Action, PathBuf, #[source] io::Error),

        #[error("Cannot serialize to JSON (dest='{}'): {1}", .0.to_string_lossy())]
        SerializeToJson(PathBuf, #[source] serde_json::Error),

        #[error("Cannot deserialize from JSON (src='{}'): {1}", .0.to_string_lossy())]
        DeserializeFromJson(PathBuf, #[source] serde_json::Error),
    }
}
pub use error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateDir,
    ReadFile,
    WriteFile,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Action::*;
        let a = match self {
            CreateDir => "create dir",
            ReadFile => "read file",
            WriteFile => "write file",
        };
        write!(f, "{}", a)
    }
}

fn io_err(action: Action, path: impl AsRef<Path>) -> impl FnOnce(io::Error) -> Error {
    let path = path.as_ref().to_owned();
    move |e| Error::Io(action, path, e)
}

/// Creates `dir` and all of its missing parents. An existing dir is not an error.
pub fn mkdir_all(dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(io_err(Action::CreateDir, dir))
}

pub fn write<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    fs::write(&filepath, contents).map_err(io_err(Action::WriteFile, filepath))
}

pub fn write_with_mkdir<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    if let Some(dir) = filepath.as_ref().parent() {
        self::mkdir_all(dir)?;
    }
    self::write(filepath, contents)
}

pub fn read(filepath: impl AsRef<Path>) -> Result<Vec<u8>> {
    fs::read(&filepath).map_err(io_err(Action::ReadFile, filepath))
}

pub fn read_to_string(filepath: impl AsRef<Path>) -> Result<String> {
    fs::read_to_string(&filepath).map_err(io_err(Action::ReadFile, filepath))
}

pub fn write_json_with_mkdir<P, T>(filepath: P, data: &T) -> Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let s = serde_json::to_string_pretty(data)
        .map_err(|e| Error::SerializeToJson(filepath.as_ref().to_owned(), e))?;
    write_with_mkdir(filepath, s)
}

pub fn read_json_with_deserialize<P, T>(filepath: P) -> Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let filepath = filepath.as_ref();
    let f = fs::File::open(filepath).map_err(io_err(Action::ReadFile, filepath))?;
    serde_json::from_reader(BufReader::new(f))
        .map_err(|e| Error::DeserializeFromJson(filepath.to_owned(), e))
}

/// Returns the final component of `path` as UTF-8, or `None` for paths like `/` or `..`.
pub fn file_name_str(path: &Path) -> Option<&str> {
    path.file_name().and_then(|s| s.to_str())
}

pub fn replace_extension(path: impl AsRef<Path>, ext: &str) -> PathBuf {
    let mut p = path.as_ref().to_owned();
    p.set_extension(ext);
    p
}
