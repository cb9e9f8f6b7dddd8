//! Version-prefixed envelope byte codec.
//!
//! The registry store and every collaborator speak envelopes only in this
//! serialized form. The first byte names the format version so a decoder can
//! reject bytes it does not understand instead of misreading them; the body
//! is a bincode encoding of the domain [`Envelope`].

use std::borrow::Cow;

use multisig_coordinator_domain::envelope::{Envelope, EnvelopeBytes};

/// The byte tag of the only format version currently written.
const FORMAT_V1: u8 = 1;

/// Errors produced while encoding or decoding envelope bytes.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeCodecError {
    /// The byte form was empty.
    #[error("empty envelope bytes")]
    Empty,

    /// The byte form carries a version tag this codec does not understand.
    #[error("unsupported envelope format version: {0}")]
    UnsupportedVersion(u8),

    /// The envelope could not be serialized.
    #[error("envelope encoding failed: {0}")]
    Encode(Cow<'static, str>),

    /// The byte form could not be parsed as an envelope.
    #[error("envelope decoding failed: {0}")]
    Decode(Cow<'static, str>),
}

/// Serializes an envelope into its opaque, version-prefixed byte form.
///
/// # Errors
///
/// If the envelope cannot be serialized.
pub fn encode_envelope(envelope: &Envelope) -> Result<EnvelopeBytes, EnvelopeCodecError> {
    let body = bincode::serialize(envelope)
        .map_err(|err| EnvelopeCodecError::Encode(err.to_string().into()))?;

    let mut bytes = Vec::with_capacity(body.len() + 1);
    bytes.push(FORMAT_V1);
    bytes.extend_from_slice(&body);

    Ok(bytes.into())
}

/// Parses an envelope from its opaque, version-prefixed byte form.
///
/// # Errors
///
/// If the bytes are empty, carry an unknown version tag, or do not parse as
/// an envelope of the tagged version.
pub fn decode_envelope(bytes: &EnvelopeBytes) -> Result<Envelope, EnvelopeCodecError> {
    match bytes.as_slice() {
        [] => Err(EnvelopeCodecError::Empty),
        [FORMAT_V1, body @ ..] => bincode::deserialize(body)
            .map_err(|err| EnvelopeCodecError::Decode(err.to_string().into())),
        [version, ..] => Err(EnvelopeCodecError::UnsupportedVersion(*version)),
    }
}
