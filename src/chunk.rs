use std::str::FromStr;

use strum_macros::{AsRefStr, Display, EnumString};

use crate::Error;

/// Chunk size used on layouts where striping does not matter.
pub const FIXED_CHUNK_SIZE: u64 = 256;

/// Storage layout the thin pool is tuned for.
#[derive(AsRefStr, EnumString, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ComputeProfile {
    Raid10,
    Raid6,
    Jbod,
}

impl ComputeProfile {
    /// Parses a profile name, `Error::UnsupportedProfile` for anything unknown.
    pub fn parse(profile: &str) -> Result<Self, Error> {
        Self::from_str(profile).map_err(|_| Error::UnsupportedProfile {
            profile: profile.to_string(),
        })
    }

    /// Thin pool chunk size, in the units of `stripe_unit`.
    ///
    /// A raid10 chunk spans one full stripe, so `disk_count` must be given.
    pub fn chunk_size(&self, stripe_unit: u64, disk_count: Option<u64>) -> Result<u64, Error> {
        match self {
            Self::Raid10 => {
                let disk_count = disk_count.ok_or_else(|| Error::MissingParameter {
                    name: "diskcount".to_string(),
                })?;
                stripe_unit
                    .checked_mul(disk_count)
                    .ok_or_else(|| Error::InvalidParameter {
                        name: "diskcount".to_string(),
                        value: disk_count.to_string(),
                        reason: format!("stripe of {disk_count} x {stripe_unit} overflows"),
                    })
            }
            Self::Raid6 | Self::Jbod => Ok(FIXED_CHUNK_SIZE),
        }
    }
}
