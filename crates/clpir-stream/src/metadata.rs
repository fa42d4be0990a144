//! Preamble metadata and protocol version negotiation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::PreambleConfig;
use crate::error::{IrError, Result};
use crate::protocol::{metadata as tags, EncodingType, IrEncoding};

/// Protocol version written by this crate.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Pre-SemVer version string, always accepted.
pub const LEGACY_PROTOCOL_VERSION: &str = "v0.0.0";

/// Schema of the variables carried in events.
pub const VARIABLES_SCHEMA_ID: &str = "com.yscope.clp.VariablesSchemaV2";

/// Scheme used to encode variables.
pub const VARIABLE_ENCODING_METHODS_ID: &str = "com.yscope.clp.VariableEncodingMethodsV1";

/// Metadata block of a stream's preamble, serialized as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Metadata {
    pub version: String,
    #[serde(default)]
    pub variables_schema_id: String,
    #[serde(default)]
    pub variable_encoding_methods_id: String,
    #[serde(default)]
    pub timestamp_pattern: String,
    #[serde(default)]
    pub timestamp_pattern_syntax: String,
    #[serde(rename = "TZ_ID", default)]
    pub time_zone_id: String,
    /// Decimal string; four-byte streams only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_timestamp: Option<String>,
}

impl Metadata {
    /// Metadata for a new stream of width `E`.
    pub fn for_encoding<E: IrEncoding>(config: &PreambleConfig) -> Self {
        let reference_timestamp = match E::ENCODING_TYPE {
            EncodingType::FourByte => Some(config.reference_timestamp.to_string()),
            EncodingType::EightByte => None,
        };
        Self {
            version: PROTOCOL_VERSION.to_string(),
            variables_schema_id: VARIABLES_SCHEMA_ID.to_string(),
            variable_encoding_methods_id: VARIABLE_ENCODING_METHODS_ID.to_string(),
            timestamp_pattern: config.timestamp_pattern.clone(),
            timestamp_pattern_syntax: config.timestamp_pattern_syntax.clone(),
            time_zone_id: config.time_zone_id.clone(),
            reference_timestamp,
        }
    }

    /// Parse the reference timestamp, if present.
    pub fn reference_timestamp(&self) -> Result<Option<i64>> {
        self.reference_timestamp
            .as_deref()
            .map(|value| {
                value.parse::<i64>().map_err(|_| {
                    IrError::corrupted(format!("invalid reference timestamp '{value}'"))
                })
            })
            .transpose()
    }
}

/// Decode a metadata block and check its protocol version.
///
/// Unparseable JSON is reported as [`IrError::CorruptedIr`].
pub fn decode_metadata(metadata_type: u8, metadata: &[u8]) -> Result<Metadata> {
    if metadata_type != tags::ENCODING_JSON {
        return Err(IrError::corrupted(format!(
            "unknown metadata encoding 0x{metadata_type:02x}"
        )));
    }
    let metadata: Metadata = serde_json::from_slice(metadata)
        .map_err(|err| IrError::corrupted(format!("invalid metadata JSON: {err}")))?;

    match validate_protocol_version(&metadata.version) {
        VersionCompatibility::Supported => Ok(metadata),
        compatibility => Err(IrError::UnsupportedVersion {
            version: metadata.version,
            compatibility,
        }),
    }
}

/// How a stream's protocol version relates to [`PROTOCOL_VERSION`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCompatibility {
    Supported,
    /// Older major version.
    TooOld,
    /// Newer than the supported version.
    TooNew,
    /// Not a semantic version.
    Invalid,
}

impl fmt::Display for VersionCompatibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Supported => "supported",
            Self::TooOld => "too old",
            Self::TooNew => "too new",
            Self::Invalid => "invalid",
        })
    }
}

/// Check a stream's protocol version against [`PROTOCOL_VERSION`].
pub fn validate_protocol_version(version: &str) -> VersionCompatibility {
    compare_protocol_versions(version, PROTOCOL_VERSION)
}

fn compare_protocol_versions(version: &str, supported: &str) -> VersionCompatibility {
    if version == LEGACY_PROTOCOL_VERSION {
        return VersionCompatibility::Supported;
    }
    let (Some(candidate), Some(current)) = (parse_version(version), parse_version(supported))
    else {
        return VersionCompatibility::Invalid;
    };

    if candidate > current {
        VersionCompatibility::TooNew
    } else if candidate.0 < current.0 {
        VersionCompatibility::TooOld
    } else {
        VersionCompatibility::Supported
    }
}

/// Parse `MAJOR.MINOR.PATCH[-PRERELEASE][+BUILD]`, keeping the numeric core.
fn parse_version(version: &str) -> Option<(u64, u64, u64)> {
    let (without_build, build) = match version.split_once('+') {
        Some((core, build)) => (core, Some(build)),
        None => (version, None),
    };
    let (core, prerelease) = match without_build.split_once('-') {
        Some((core, prerelease)) => (core, Some(prerelease)),
        None => (without_build, None),
    };
    if !prerelease.is_none_or(valid_identifiers) || !build.is_none_or(valid_identifiers) {
        return None;
    }

    let mut parts = core.split('.');
    let major = parse_numeric_identifier(parts.next()?)?;
    let minor = parse_numeric_identifier(parts.next()?)?;
    let patch = parse_numeric_identifier(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

fn parse_numeric_identifier(part: &str) -> Option<u64> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if part.len() > 1 && part.starts_with('0') {
        return None;
    }
    part.parse().ok()
}

fn valid_identifiers(identifiers: &str) -> bool {
    identifiers.split('.').all(|identifier| {
        !identifier.is_empty()
            && identifier
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-')
    })
}
