use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use plot_defence_world::snapshot::{PlacedTower, PlotSnapshot};
use serde::{Deserialize, Serialize};

const SNAPSHOT_DOMAIN: &str = "plot";
const SNAPSHOT_VERSION: &str = "v1";

/// Identifier prefix emitted before the layout name and encoded payload.
pub(crate) const SNAPSHOT_HEADER: &str = "plot:v1";
/// Delimiter used to separate the prefix, layout name and payload.
const FIELD_DELIMITER: char = ':';

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializablePlot {
    wave: u32,
    towers: Vec<PlacedTower>,
}

/// Encodes the snapshot into a single-line string suitable for clipboard transfer.
pub(crate) fn encode(snapshot: &PlotSnapshot) -> Result<String, PlotTransferError> {
    if snapshot.layout.is_empty() || snapshot.layout.contains(FIELD_DELIMITER) {
        return Err(PlotTransferError::InvalidLayoutName(snapshot.layout.clone()));
    }
    let payload = SerializablePlot {
        wave: snapshot.wave,
        towers: snapshot.towers.clone(),
    };
    let json = serde_json::to_vec(&payload).map_err(PlotTransferError::InvalidPayload)?;
    let encoded = STANDARD_NO_PAD.encode(json);
    Ok(format!("{SNAPSHOT_HEADER}:{}:{encoded}", snapshot.layout))
}

/// Decodes a snapshot from the provided string representation.
pub(crate) fn decode(value: &str) -> Result<PlotSnapshot, PlotTransferError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PlotTransferError::EmptyPayload);
    }

    let mut parts = trimmed.splitn(4, FIELD_DELIMITER);
    let domain = parts.next().ok_or(PlotTransferError::MissingPrefix)?;
    let version = parts.next().ok_or(PlotTransferError::MissingVersion)?;
    let layout = parts.next().ok_or(PlotTransferError::MissingLayout)?;
    let payload = parts.next().ok_or(PlotTransferError::MissingPayload)?;

    if domain != SNAPSHOT_DOMAIN {
        return Err(PlotTransferError::InvalidPrefix(domain.to_owned()));
    }
    if version != SNAPSHOT_VERSION {
        return Err(PlotTransferError::UnsupportedVersion(version.to_owned()));
    }
    if layout.trim().is_empty() {
        return Err(PlotTransferError::InvalidLayoutName(layout.to_owned()));
    }

    let bytes = STANDARD_NO_PAD
        .decode(payload.as_bytes())
        .map_err(PlotTransferError::InvalidEncoding)?;
    let decoded: SerializablePlot =
        serde_json::from_slice(&bytes).map_err(PlotTransferError::InvalidPayload)?;

    Ok(PlotSnapshot {
        layout: layout.trim().to_owned(),
        wave: decoded.wave,
        towers: decoded.towers,
    })
}

/// Errors that can occur while encoding or decoding plot transfer strings.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PlotTransferError {
    /// The provided string was empty or contained only whitespace.
    #[error("plot string was empty")]
    EmptyPayload,
    /// The prefix segment was missing from the encoded snapshot.
    #[error("plot string is missing the prefix")]
    MissingPrefix,
    /// The encoded snapshot did not contain a version segment.
    #[error("plot string is missing the version")]
    MissingVersion,
    /// The encoded snapshot did not include the layout name.
    #[error("plot string is missing the layout name")]
    MissingLayout,
    /// The encoded snapshot did not include the payload segment.
    #[error("plot string is missing the payload")]
    MissingPayload,
    /// The encoded snapshot used an unexpected prefix segment.
    #[error("plot prefix '{0}' is not supported")]
    InvalidPrefix(String),
    /// The encoded snapshot used an unsupported version identifier.
    #[error("plot version '{0}' is not supported")]
    UnsupportedVersion(String),
    /// The layout name cannot be carried by a plot string.
    #[error("layout name '{0}' cannot be transferred")]
    InvalidLayoutName(String),
    /// The base64 payload could not be decoded.
    #[error("could not decode plot payload: {0}")]
    InvalidEncoding(#[source] base64::DecodeError),
    /// The payload could not be serialised or deserialised.
    #[error("could not parse plot payload: {0}")]
    InvalidPayload(#[source] serde_json::Error),
}
