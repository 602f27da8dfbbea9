//! Physical capacity lookup for a volume group.

use crate::cmd::{CommandSpec, Executor};
use crate::{report, Error};

/// The physical volume backing a volume group and its raw size.
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityReport {
    pub pv_name: String,
    pub size_mb: f64,
}

/// Resolves `vg` to its physical volume, then that volume to its size.
///
/// # Errors
///
/// `Error::CapacityUnavailable` => `vgs` failed, the group most likely does not exist.
/// `Error::PhysicalVolumeNotFound` => `pvs` failed for the resolved volume.
/// `Error::ReportParse` => either report could not be understood.
pub fn inspect<E: Executor + ?Sized>(executor: &E, vg: &str) -> Result<CapacityReport, Error> {
    let query = CommandSpec::vg_list()
        .args(["--noheadings", "-o", "pv_name"])
        .arg(vg);
    let output = executor.run(&query).map_err(|error| match error {
        Error::LvmBinErr { error, .. } => Error::CapacityUnavailable {
            vg: vg.to_string(),
            error,
        },
        error => error,
    })?;

    let mut pv_names = report::parse_pv_names(&output)?;
    if pv_names.len() > 1 {
        tracing::warn!(vg, pvs = ?pv_names, "volume group spans several physical volumes, sizing from the first");
    }
    let pv_name = pv_names.swap_remove(0);

    let query = CommandSpec::pv_list()
        .args(["--noheadings", "--units", "m", "-o", "pv_size"])
        .arg(&pv_name);
    let output = executor.run(&query).map_err(|error| match error {
        Error::LvmBinErr { .. } => Error::PhysicalVolumeNotFound {
            pv: pv_name.clone(),
        },
        error => error,
    })?;
    let size_mb = report::parse_pv_size(&output)?;

    tracing::debug!(vg, pv = %pv_name, size_mb, "physical volume capacity");
    Ok(CapacityReport { pv_name, size_mb })
}
