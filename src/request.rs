//! Module parameters and the typed requests validated out of them.
//!
//! Parameters arrive as a flat bag of optional strings, named as in the
//! playbook. Each action picks the fields it needs; a required field that is
//! absent or empty is fatal and reported by name.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use snafu::{OptionExt, ResultExt};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::chunk::ComputeProfile;
use crate::{Error, MissingParameterSnafu, ParseArgsSnafu, ReadArgsSnafu};

/// Names of the module parameters.
#[derive(AsRefStr, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum Param {
    Action,
    Lvname,
    Lvtype,
    Vgname,
    Thinpool,
    Poolmetadata,
    Poolmetadataspare,
    Poolname,
    Zero,
    Compute,
    Diskcount,
    Stripesize,
}

/// Raw module parameters, as handed over by the caller.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ModuleParams {
    #[serde(deserialize_with = "de::scalar")]
    pub action: Option<String>,
    #[serde(deserialize_with = "de::scalar")]
    pub lvname: Option<String>,
    #[serde(deserialize_with = "de::scalar")]
    pub lvtype: Option<String>,
    #[serde(deserialize_with = "de::scalar")]
    pub vgname: Option<String>,
    #[serde(deserialize_with = "de::scalar")]
    pub thinpool: Option<String>,
    #[serde(deserialize_with = "de::scalar")]
    pub poolmetadata: Option<String>,
    #[serde(deserialize_with = "de::scalar")]
    pub poolmetadataspare: Option<String>,
    #[serde(deserialize_with = "de::scalar")]
    pub poolname: Option<String>,
    #[serde(deserialize_with = "de::scalar")]
    pub zero: Option<String>,
    #[serde(deserialize_with = "de::scalar")]
    pub compute: Option<String>,
    #[serde(deserialize_with = "de::scalar")]
    pub diskcount: Option<String>,
    #[serde(deserialize_with = "de::scalar")]
    pub stripesize: Option<String>,
}

impl ModuleParams {
    /// Reads parameters from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let raw = std::fs::read_to_string(path).context(ReadArgsSnafu { path })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, Error> {
        serde_json::from_str(raw).context(ParseArgsSnafu)
    }

    fn get(&self, param: Param) -> &Option<String> {
        match param {
            Param::Action => &self.action,
            Param::Lvname => &self.lvname,
            Param::Lvtype => &self.lvtype,
            Param::Vgname => &self.vgname,
            Param::Thinpool => &self.thinpool,
            Param::Poolmetadata => &self.poolmetadata,
            Param::Poolmetadataspare => &self.poolmetadataspare,
            Param::Poolname => &self.poolname,
            Param::Zero => &self.zero,
            Param::Compute => &self.compute,
            Param::Diskcount => &self.diskcount,
            Param::Stripesize => &self.stripesize,
        }
    }

    /// The value of an optional parameter, empty counting as unset.
    pub fn optional(&self, param: Param) -> Option<&str> {
        self.get(param).as_deref().filter(|value| !value.is_empty())
    }

    /// The value of a required parameter.
    ///
    /// # Errors
    ///
    /// `Error::MissingParameter` => unset or empty.
    pub fn validated(&self, param: Param) -> Result<&str, Error> {
        self.optional(param)
            .context(MissingParameterSnafu {
                name: param.to_string(),
            })
    }

    fn parsed<T>(&self, param: Param) -> Result<T, Error>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        parse_value(param, self.validated(param)?)
    }

    fn parsed_opt<T>(&self, param: Param) -> Result<Option<T>, Error>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        self.optional(param)
            .map(|value| parse_value(param, value))
            .transpose()
    }
}

fn parse_value<T>(param: Param, value: &str) -> Result<T, Error>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|error: T::Err| Error::InvalidParameter {
        name: param.to_string(),
        value: value.to_string(),
        reason: error.to_string(),
    })
}

#[derive(AsRefStr, EnumString, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Create,
    Convert,
    Change,
    Remove,
}

#[derive(AsRefStr, EnumString, Display, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum VolumeType {
    /// Sized to the metadata share of the volume group.
    Thin,
    /// Sized to the pool share of the volume group.
    Thick,
    /// A thin volume provisioned out of an existing pool.
    Virtual,
}

/// Whether `lvconvert` keeps a spare metadata volume for pool recovery.
#[derive(EnumString, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum MetadataSpare {
    #[strum(serialize = "yes", serialize = "y")]
    Yes,
    #[strum(serialize = "no", serialize = "n")]
    No,
}

impl fmt::Display for MetadataSpare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Yes => "y",
            Self::No => "n",
        })
    }
}

/// Zeroing mode of newly provisioned thin pool blocks.
#[derive(EnumString, Debug, Clone, Copy, PartialEq, Eq)]
#[strum(ascii_case_insensitive)]
pub enum ZeroMode {
    #[strum(serialize = "y", serialize = "yes")]
    Enabled,
    #[strum(serialize = "n", serialize = "no")]
    Disabled,
}

impl fmt::Display for ZeroMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enabled => "y",
            Self::Disabled => "n",
        })
    }
}

/// A thin pool named as `vg/lv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThinPoolRef {
    pub vg: String,
    pub lv: String,
}

impl FromStr for ThinPoolRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((vg, lv)) if !vg.is_empty() && !lv.is_empty() && !lv.contains('/') => Ok(Self {
                vg: vg.to_string(),
                lv: lv.to_string(),
            }),
            _ => Err("expected <vgname>/<lvname>".to_string()),
        }
    }
}

impl fmt::Display for ThinPoolRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.vg, self.lv)
    }
}

/// What kind of volume a create request makes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeKind {
    Thin,
    Thick,
    Virtual { pool: String },
}

impl VolumeKind {
    pub fn volume_type(&self) -> VolumeType {
        match self {
            Self::Thin => VolumeType::Thin,
            Self::Thick => VolumeType::Thick,
            Self::Virtual { .. } => VolumeType::Virtual,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub vg: String,
    pub lv: String,
    pub kind: VolumeKind,
    /// Sizing label, e.g. `rhs`. Any value has sizes derived from the
    /// volume group; without one the size is left to the caller.
    pub compute: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertRequest {
    pub vg: String,
    pub thinpool: ThinPoolRef,
    pub profile: ComputeProfile,
    pub stripe_unit: u64,
    /// Always set for raid10.
    pub disk_count: Option<u64>,
    pub metadata: Option<String>,
    pub metadata_spare: Option<MetadataSpare>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRequest {
    pub vg: String,
    pub pool: String,
    pub zero: Option<ZeroMode>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveRequest {
    pub vg: String,
    pub lv: String,
}

/// A validated request for exactly one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VolumeRequest {
    Create(CreateRequest),
    Convert(ConvertRequest),
    Change(ChangeRequest),
    Remove(RemoveRequest),
}

impl VolumeRequest {
    pub fn action(&self) -> Action {
        match self {
            Self::Create(_) => Action::Create,
            Self::Convert(_) => Action::Convert,
            Self::Change(_) => Action::Change,
            Self::Remove(_) => Action::Remove,
        }
    }

    pub fn vg(&self) -> &str {
        match self {
            Self::Create(r) => &r.vg,
            Self::Convert(r) => &r.vg,
            Self::Change(r) => &r.vg,
            Self::Remove(r) => &r.vg,
        }
    }
}

impl TryFrom<&ModuleParams> for VolumeRequest {
    type Error = Error;

    fn try_from(params: &ModuleParams) -> Result<Self, Self::Error> {
        let action: Action = params.parsed(Param::Action)?;
        let vg = params.validated(Param::Vgname)?.to_string();

        Ok(match action {
            Action::Create => Self::Create(CreateRequest::from_params(params, vg)?),
            Action::Convert => Self::Convert(ConvertRequest::from_params(params, vg)?),
            Action::Change => Self::Change(ChangeRequest {
                pool: params.validated(Param::Poolname)?.to_string(),
                zero: params.parsed_opt(Param::Zero)?,
                vg,
            }),
            Action::Remove => Self::Remove(RemoveRequest {
                lv: params.validated(Param::Lvname)?.to_string(),
                vg,
            }),
        })
    }
}

impl CreateRequest {
    fn from_params(params: &ModuleParams, vg: String) -> Result<Self, Error> {
        let volume_type: VolumeType = params.parsed(Param::Lvtype)?;
        let lv = params.validated(Param::Lvname)?.to_string();
        let kind = match volume_type {
            VolumeType::Thin => VolumeKind::Thin,
            VolumeType::Thick => VolumeKind::Thick,
            VolumeType::Virtual => VolumeKind::Virtual {
                pool: params.validated(Param::Poolname)?.to_string(),
            },
        };
        Ok(Self {
            vg,
            lv,
            kind,
            compute: params.optional(Param::Compute).map(str::to_string),
        })
    }
}

impl ConvertRequest {
    fn from_params(params: &ModuleParams, vg: String) -> Result<Self, Error> {
        let thinpool: ThinPoolRef = params.parsed(Param::Thinpool)?;
        let profile = ComputeProfile::parse(params.validated(Param::Compute)?)?;
        let stripe_unit: u64 = params.parsed(Param::Stripesize)?;
        let disk_count: Option<u64> = match profile {
            ComputeProfile::Raid10 => Some(params.parsed(Param::Diskcount)?),
            _ => params.parsed_opt(Param::Diskcount)?,
        };
        Ok(Self {
            vg,
            thinpool,
            profile,
            stripe_unit,
            disk_count,
            metadata: params.optional(Param::Poolmetadata).map(str::to_string),
            metadata_spare: params.parsed_opt(Param::Poolmetadataspare)?,
        })
    }
}

/// Serde helpers, playbooks hand over numbers and booleans unquoted.
mod de {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        String(String),
        Number(serde_json::Number),
        Bool(bool),
    }

    /// Decode an optional string, number or boolean into its string form.
    pub(super) fn scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
            Scalar::String(s) => s,
            Scalar::Number(n) => n.to_string(),
            Scalar::Bool(true) => "yes".to_string(),
            Scalar::Bool(false) => "no".to_string(),
        }))
    }
}
