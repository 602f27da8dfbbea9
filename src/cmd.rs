use std::ffi::OsStr;
use std::fmt;
use std::process::Command;

use snafu::ResultExt;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::config::Config;
use crate::{Error, LvmBinErrSnafu, LvmBinSpawnErrSnafu};

/// The LVM binaries this crate drives.
#[derive(AsRefStr, EnumString, Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LvmSubCmd {
    /// Display information about volume groups.
    #[strum(serialize = "vgs")]
    VGList,
    /// Display information about physical volumes.
    #[strum(serialize = "pvs")]
    PVList,
    /// Create a logical volume.
    #[strum(serialize = "lvcreate")]
    LVCreate,
    /// Change logical volume layout, here used to assemble thin pools.
    #[strum(serialize = "lvconvert")]
    LVConvert,
    /// Change the attributes of logical volume(s).
    #[strum(serialize = "lvchange")]
    LVChange,
    /// Remove logical volume(s) from the system.
    #[strum(serialize = "lvremove")]
    LVRemove,
}

/// A fully formatted invocation of one LVM binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    cmd: LvmSubCmd,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(cmd: LvmSubCmd) -> Self {
        Self {
            cmd,
            args: Vec::new(),
        }
    }
    /// Prepare a `CommandSpec` for `LvmSubCmd::VGList`.
    pub fn vg_list() -> Self {
        Self::new(LvmSubCmd::VGList)
    }
    /// Prepare a `CommandSpec` for `LvmSubCmd::PVList`.
    pub fn pv_list() -> Self {
        Self::new(LvmSubCmd::PVList)
    }
    /// Prepare a `CommandSpec` for `LvmSubCmd::LVCreate`.
    pub fn lv_create() -> Self {
        Self::new(LvmSubCmd::LVCreate)
    }
    /// Prepare a `CommandSpec` for `LvmSubCmd::LVConvert`.
    pub fn lv_convert() -> Self {
        Self::new(LvmSubCmd::LVConvert)
    }
    /// Prepare a `CommandSpec` for `LvmSubCmd::LVChange`.
    pub fn lv_change() -> Self {
        Self::new(LvmSubCmd::LVChange)
    }
    /// Prepare a `CommandSpec` for `LvmSubCmd::LVRemove`.
    pub fn lv_remove() -> Self {
        Self::new(LvmSubCmd::LVRemove)
    }
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
    /// Append `flag value`, or nothing at all when there is no value.
    pub fn opt_arg<T: fmt::Display>(self, flag: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.arg(flag).arg(value.to_string()),
            None => self,
        }
    }
    pub fn subcmd(&self) -> LvmSubCmd {
        self.cmd
    }
    /// Name of the binary to execute.
    pub fn binary(&self) -> &str {
        self.cmd.as_ref()
    }
    pub fn arguments(&self) -> &[String] {
        &self.args
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Runs LVM commands on behalf of the dispatcher.
pub trait Executor {
    /// Runs `spec` to completion and returns its stdout.
    ///
    /// # Errors
    ///
    /// `Error::LvmBinErr` => Completed with a failing exit code, carrying stderr.
    /// Any other error means the command could not be run at all.
    fn run(&self, spec: &CommandSpec) -> Result<String, Error>;
}

impl<E: Executor + ?Sized> Executor for &E {
    fn run(&self, spec: &CommandSpec) -> Result<String, Error> {
        (**self).run(spec)
    }
}

/// Executes commands on the local host, blocking until each one exits.
#[derive(Debug, Clone, Default)]
pub struct SystemExecutor {
    config: Config,
}

impl SystemExecutor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Executor for SystemExecutor {
    fn run(&self, spec: &CommandSpec) -> Result<String, Error> {
        let binary = self.config.find_binary(spec.binary())?;
        let mut cmder = Command::new(binary.as_os_str());
        cmder.args(spec.arguments().iter().map(OsStr::new));
        tracing::trace!("{:?}", cmder);

        let output = cmder.output().context(LvmBinSpawnErrSnafu {
            command: spec.binary(),
        })?;
        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            return LvmBinErrSnafu {
                command: spec.binary(),
                error: error.trim_start(),
            }
            .fail();
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn subcmd_names() {
        assert_eq!(LvmSubCmd::VGList.as_ref(), "vgs");
        assert_eq!(LvmSubCmd::LVConvert.to_string(), "lvconvert");
        assert_eq!(LvmSubCmd::from_str("pvs").unwrap(), LvmSubCmd::PVList);
    }

    #[test]
    fn display_joins_args() {
        let spec = CommandSpec::lv_remove().args(["-ff", "--yes"]).arg("vg/lv");
        assert_eq!(spec.to_string(), "lvremove -ff --yes vg/lv");
        assert_eq!(spec.subcmd(), LvmSubCmd::LVRemove);
    }

    #[test]
    fn opt_arg_skips_missing_values() {
        let spec = CommandSpec::lv_change()
            .opt_arg("-Z", None::<&str>)
            .opt_arg("--tag", Some("x"))
            .arg("vg/pool");
        assert_eq!(spec.arguments(), &["--tag", "x", "vg/pool"]);
    }

    #[test]
    fn missing_binary_is_reported_before_spawn() {
        let executor = SystemExecutor::new(Config::new(["/nonexistent"]));
        let result = executor.run(&CommandSpec::vg_list());
        assert!(matches!(result, Err(Error::BinaryNotFound { .. })));
    }
}
