use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use snafu::OptionExt;

use crate::{BinaryNotFoundSnafu, Error};

/// Environment variable overriding the binary search directories,
/// colon-separated like `PATH`.
pub const BIN_DIRS_ENV: &str = "LVOPS_BIN_DIRS";

const DEFAULT_BIN_DIRS: [&str; 4] = ["/usr/sbin", "/sbin", "/usr/bin", "/bin"];

/// Where to look for the LVM binaries.
///
/// The directories are searched explicitly rather than through `PATH`, which
/// may not be set when running under a remote executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    bin_dirs: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_BIN_DIRS.iter().map(PathBuf::from))
    }
}

impl Config {
    pub fn new<I, P>(bin_dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            bin_dirs: bin_dirs.into_iter().map(Into::into).collect(),
        }
    }

    /// The default configuration, unless [`BIN_DIRS_ENV`] is set.
    pub fn from_env() -> Self {
        Self::from_bin_dirs_var(std::env::var_os(BIN_DIRS_ENV).as_deref())
    }

    fn from_bin_dirs_var(var: Option<&OsStr>) -> Self {
        match var {
            Some(dirs) if !dirs.is_empty() => Self::new(std::env::split_paths(dirs)),
            _ => Self::default(),
        }
    }

    pub fn bin_dirs(&self) -> &[PathBuf] {
        &self.bin_dirs
    }

    /// Finds the binary with the given name in the first directory that has it.
    pub fn find_binary(&self, name: &str) -> Result<PathBuf, Error> {
        self.bin_dirs
            .iter()
            .map(|dir| dir.join(name))
            .find(|path| is_file(path))
            .context(BinaryNotFoundSnafu {
                name,
                locations: self.bin_dirs.clone(),
            })
    }
}

fn is_file(path: &Path) -> bool {
    path.metadata().map(|m| m.is_file()).unwrap_or(false)
}
