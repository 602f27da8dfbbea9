//! Logical volume provisioning for thin pools.
//!
//! A single request drives one of four LVM actions against the local host:
//!  - create  -> `lvcreate` a thick metadata volume, a thin pool data volume
//!    or a virtual volume carved out of a thin pool. When a sizing label
//!    is given, sizes are derived from the physical volume backing the group.
//!  - convert -> `lvconvert` a data volume and a metadata volume into a thin
//!    pool, with a chunk size picked from the RAID layout.
//!  - change  -> `lvchange` the zeroing mode of a thin pool.
//!  - remove  -> `lvremove` a logical volume.
//!
//! The loosely typed [`ModuleParams`] bag is validated into a typed
//! [`VolumeRequest`] up front and then handed to [`LvOps`], which formats
//! exactly one external command and runs it through an [`Executor`].

use std::path::PathBuf;

use snafu::Snafu;

pub mod capacity;
pub mod chunk;
pub mod cmd;
pub mod config;
pub mod ops;
mod report;
pub mod request;
pub mod sizing;

pub use capacity::CapacityReport;
pub use chunk::ComputeProfile;
pub use cmd::{CommandSpec, Executor, LvmSubCmd, SystemExecutor};
pub use config::Config;
pub use ops::{LvOps, Outcome};
pub use request::{ModuleParams, VolumeRequest};
pub use sizing::SizeComputation;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("Please provide {name} option in the playbook!"))]
    MissingParameter { name: String },
    #[snafu(display("Invalid value {value:?} for {name} option: {reason}"))]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },
    #[snafu(display("Unsupported compute profile {profile:?}"))]
    UnsupportedProfile { profile: String },
    #[snafu(display("Capacity of volume group {vg} is unavailable: {error}"))]
    CapacityUnavailable { vg: String, error: String },
    #[snafu(display("{vg} Volume Group Does Not Exist!"))]
    VolumeGroupNotFound { vg: String },
    #[snafu(display("PV {pv} does not exist"))]
    PhysicalVolumeNotFound { pv: String },
    #[snafu(display("PV {pv} of {size_mb}m leaves no usable capacity"))]
    InsufficientCapacity { pv: String, size_mb: f64 },
    #[snafu(display("PV {pv} reports an implausible size of {size_mb}m"))]
    ImplausibleCapacity { pv: String, size_mb: f64 },
    #[snafu(display("Failed to parse {command} output: {error}"))]
    ReportParse { command: String, error: String },
    /// The external binary exited with a failure, `error` is its stderr.
    #[snafu(display("{error}"))]
    LvmBinErr { command: String, error: String },
    #[snafu(display("Failed to spawn/wait for {command} command: {source}"))]
    LvmBinSpawnErr {
        command: String,
        source: std::io::Error,
    },
    #[snafu(display("Failed to find required executable {name} in {locations:?}"))]
    BinaryNotFound {
        name: String,
        locations: Vec<PathBuf>,
    },
    #[snafu(display("Failed to read module arguments from {}: {source}", path.display()))]
    ReadArgs {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Failed to parse module arguments: {source}"))]
    ParseArgs { source: serde_json::Error },
    #[snafu(display("usage: lv <args-file>"))]
    Usage,
}

/// Validates `params` and performs the requested action, returning the
/// output of the one lifecycle command that was run.
pub fn execute<E: Executor>(params: &ModuleParams, executor: E) -> Result<String, Error> {
    let request = VolumeRequest::try_from(params)?;
    LvOps::new(executor).run(&request)
}
