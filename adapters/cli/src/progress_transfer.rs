use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use crystal_slide_core::ProgressSnapshot;

const TRANSFER_DOMAIN: &str = "crystal";
const TRANSFER_VERSION: &str = "v1";

/// Identifier prefix emitted before the encoded progress payload.
pub(crate) const TRANSFER_HEADER: &str = "crystal:v1";
/// Delimiter used to separate the prefix segments and payload.
const FIELD_DELIMITER: char = ':';

/// Encodes progress into a single-line string suitable for copy and paste.
pub(crate) fn encode(snapshot: &ProgressSnapshot) -> Result<String, ProgressTransferError> {
    let json = serde_json::to_vec(snapshot).map_err(ProgressTransferError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!("{TRANSFER_HEADER}{FIELD_DELIMITER}{encoded}"))
}

/// Decodes progress from the provided string representation.
pub(crate) fn decode(value: &str) -> Result<ProgressSnapshot, ProgressTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ProgressTransferError::EmptyPayload);
    }

    let mut parts = trimmed.splitn(3, FIELD_DELIMITER);
    let domain = parts.next().ok_or(ProgressTransferError::MissingPrefix)?;
    let version = parts.next().ok_or(ProgressTransferError::MissingVersion)?;
    let payload = parts.next().ok_or(ProgressTransferError::MissingPayload)?;

    if domain != TRANSFER_DOMAIN {
        return Err(ProgressTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != TRANSFER_VERSION {
        return Err(ProgressTransferError::UnsupportedVersion(
            version.to_owned(),
        ));
    }

    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(ProgressTransferError::InvalidEncoding)?;
    serde_json::from_slice(&bytes).map_err(ProgressTransferError::InvalidPayload)
}

/// Errors that can occur while encoding or decoding progress transfer strings.
#[derive(Debug)]
pub(crate) enum ProgressTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing.
    MissingPrefix,
    /// The string did not contain a version segment.
    MissingVersion,
    /// The string did not include the payload segment.
    MissingPayload,
    /// The string used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The string used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The payload could not be converted to or from JSON.
    InvalidPayload(serde_json::Error),
}

impl fmt::Display for ProgressTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "progress string was empty"),
            Self::MissingPrefix => write!(f, "progress string is missing the prefix"),
            Self::MissingVersion => write!(f, "progress string is missing the version"),
            Self::MissingPayload => write!(f, "progress string is missing the payload"),
            Self::InvalidPrefix(prefix) => {
                write!(f, "progress prefix '{prefix}' is not supported")
            }
            Self::UnsupportedVersion(version) => {
                write!(f, "progress version '{version}' is not supported")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode progress payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not convert progress payload: {error}")
            }
        }
    }
}

impl Error for ProgressTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            _ => None,
        }
    }
}
