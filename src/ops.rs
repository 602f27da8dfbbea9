//! Dispatch of a validated request to exactly one LVM lifecycle command.

use serde::Serialize;

use crate::capacity;
use crate::cmd::{CommandSpec, Executor};
use crate::request::{
    ChangeRequest, ConvertRequest, CreateRequest, RemoveRequest, VolumeKind, VolumeRequest,
};
use crate::sizing::SizeComputation;
use crate::Error;

/// Performs volume requests through an executor.
#[derive(Debug)]
pub struct LvOps<E> {
    executor: E,
}

impl<E: Executor> LvOps<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Runs the one command the request maps to and returns its output.
    pub fn run(&self, request: &VolumeRequest) -> Result<String, Error> {
        tracing::info!(action = %request.action(), vg = request.vg(), "running volume request");
        match request {
            VolumeRequest::Create(request) => self.create(request),
            VolumeRequest::Convert(request) => self.convert(request),
            VolumeRequest::Change(request) => self.change(request),
            VolumeRequest::Remove(request) => self.remove(request),
        }
    }

    /// Creates the volume, sized from its volume group when a sizing label is
    /// set.
    ///
    /// Nothing is created when the volume group cannot be sized.
    pub fn create(&self, request: &CreateRequest) -> Result<String, Error> {
        let sizes = match &request.compute {
            Some(compute) => {
                tracing::debug!(%compute, vg = %request.vg, "sizing from volume group");
                Some(self.size_volume_group(&request.vg)?)
            }
            None => None,
        };
        self.exec(create_command(request, sizes))
    }

    pub fn convert(&self, request: &ConvertRequest) -> Result<String, Error> {
        self.exec(convert_command(request)?)
    }

    pub fn change(&self, request: &ChangeRequest) -> Result<String, Error> {
        self.exec(change_command(request))
    }

    pub fn remove(&self, request: &RemoveRequest) -> Result<String, Error> {
        self.exec(remove_command(request))
    }

    fn size_volume_group(&self, vg: &str) -> Result<SizeComputation, Error> {
        capacity::inspect(&self.executor, vg)
            .and_then(|report| SizeComputation::compute(&report))
            .map_err(|error| match error {
                Error::CapacityUnavailable { vg, error } => {
                    tracing::debug!(%vg, %error, "capacity query failed");
                    Error::VolumeGroupNotFound { vg }
                }
                error => error,
            })
    }

    fn exec(&self, spec: CommandSpec) -> Result<String, Error> {
        tracing::trace!(command = %spec);
        self.executor.run(&spec)
    }
}

/// `lvcreate` for the request. Without sizes the size argument is left out.
pub fn create_command(request: &CreateRequest, sizes: Option<SizeComputation>) -> CommandSpec {
    let size = |kb: fn(&SizeComputation) -> u64| sizes.as_ref().map(|s| format!("{}K", kb(s)));
    let spec = CommandSpec::lv_create();
    match &request.kind {
        VolumeKind::Thin => spec
            .opt_arg("-L", size(SizeComputation::metadata_kb))
            .args(["-n", request.lv.as_str(), request.vg.as_str()]),
        VolumeKind::Thick => spec
            .opt_arg("-L", size(SizeComputation::pool_kb))
            .args(["-n", request.lv.as_str(), request.vg.as_str()]),
        VolumeKind::Virtual { pool } => spec
            .opt_arg("-V", size(SizeComputation::pool_kb))
            .arg("-T")
            .arg(format!("/dev/{}/{}", request.vg, pool))
            .args(["-n", request.lv.as_str()]),
    }
}

/// `lvconvert` assembling a thin pool, never prompting.
pub fn convert_command(request: &ConvertRequest) -> Result<CommandSpec, Error> {
    let chunk_size = request
        .profile
        .chunk_size(request.stripe_unit, request.disk_count)?;
    tracing::debug!(profile = %request.profile, chunk_size, "thin pool chunk size");

    Ok(CommandSpec::lv_convert()
        .args(["--yes", "-ff"])
        .arg("-c")
        .arg(chunk_size.to_string())
        .arg("--thinpool")
        .arg(request.thinpool.to_string())
        .opt_arg("--poolmetadata", request.metadata.as_deref())
        .opt_arg("--poolmetadataspare", request.metadata_spare))
}

/// `lvchange` of the pool's zeroing mode.
pub fn change_command(request: &ChangeRequest) -> CommandSpec {
    CommandSpec::lv_change()
        .opt_arg("-Z", request.zero)
        .arg(format!("{}/{}", request.vg, request.pool))
}

/// Forced `lvremove`, never prompting.
pub fn remove_command(request: &RemoveRequest) -> CommandSpec {
    CommandSpec::lv_remove()
        .args(["-ff", "--yes"])
        .arg(format!("{}/{}", request.vg, request.lv))
}

/// What the caller gets back: the command output on success, the error
/// message on failure. Only a successful command changes anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub changed: bool,
    pub failed: bool,
    pub msg: String,
}

impl From<Result<String, Error>> for Outcome {
    fn from(result: Result<String, Error>) -> Self {
        match result {
            Ok(msg) => Self {
                changed: true,
                failed: false,
                msg,
            },
            Err(error) => Self {
                changed: false,
                failed: true,
                msg: error.to_string(),
            },
        }
    }
}
