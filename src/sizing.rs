//! Metadata and pool sizing policy for thin provisioned volume groups.
//!
//! Of the physical volume, 4 MB are held back as overhead. Volumes larger
//! than 1,000,000 MB get a fixed 16 GB metadata volume, smaller ones get
//! 1/200th of the usable size rounded down to whole megabytes. Whatever
//! remains is the pool.

use crate::capacity::CapacityReport;
use crate::Error;

pub const RESERVED_MB: u64 = 4;
pub const LARGE_PV_THRESHOLD_MB: u64 = 1_000_000;
pub const LARGE_PV_METADATA_GB: u64 = 16;
pub const METADATA_RATIO: u64 = 200;
pub const KB_PER_MB: u64 = 1024;
pub const KB_PER_GB: u64 = 1_048_576;
/// Largest usable size whose kilobyte count still fits a `u64`.
pub const MAX_USABLE_MB: u64 = u64::MAX / KB_PER_MB;

/// Sizes derived from one capacity report, in kilobytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeComputation {
    metadata_kb: u64,
    pool_kb: u64,
}

impl SizeComputation {
    /// Applies the policy to a usable size, i.e. after the reservation.
    /// `usable_mb` must not exceed [`MAX_USABLE_MB`].
    pub fn from_usable_mb(usable_mb: u64) -> Self {
        let metadata_kb = if usable_mb > LARGE_PV_THRESHOLD_MB {
            LARGE_PV_METADATA_GB * KB_PER_GB
        } else {
            // floor to whole megabytes before converting
            (usable_mb / METADATA_RATIO) * KB_PER_MB
        };
        Self {
            metadata_kb,
            pool_kb: usable_mb * KB_PER_MB - metadata_kb,
        }
    }

    /// Sizes the metadata volume and the pool for the reported volume.
    ///
    /// Fails with `Error::InsufficientCapacity` when nothing is left once the
    /// reservation is taken out, rather than yielding a non-positive pool,
    /// and with `Error::ImplausibleCapacity` past [`MAX_USABLE_MB`].
    pub fn compute(report: &CapacityReport) -> Result<Self, Error> {
        let usable_mb = usable_mb(report.size_mb);
        if usable_mb <= 0 {
            return Err(Error::InsufficientCapacity {
                pv: report.pv_name.clone(),
                size_mb: report.size_mb,
            });
        }
        if usable_mb as u64 > MAX_USABLE_MB {
            return Err(Error::ImplausibleCapacity {
                pv: report.pv_name.clone(),
                size_mb: report.size_mb,
            });
        }
        let sizes = Self::from_usable_mb(usable_mb as u64);
        tracing::debug!(
            pv = %report.pv_name,
            usable_mb,
            metadata_kb = sizes.metadata_kb,
            pool_kb = sizes.pool_kb,
            "computed thin pool sizes"
        );
        Ok(sizes)
    }

    pub fn metadata_kb(&self) -> u64 {
        self.metadata_kb
    }

    pub fn pool_kb(&self) -> u64 {
        self.pool_kb
    }
}

/// Raw size minus the reservation, floored to whole megabytes.
pub fn usable_mb(raw_mb: f64) -> i64 {
    (raw_mb - RESERVED_MB as f64).floor() as i64
}
