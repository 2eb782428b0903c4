// Error taxonomy for the codec.
//
// BER-level failures (framing, truncation, bad primitives) and operation-level
// failures (unknown tag, broken grammar) are kept separate: the former can
// happen before we know which operation we are looking at.

use thiserror::Error;

/// Errors raised by the BER element codec itself.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BerError {
    #[error("truncated element: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },
    #[error("indefinite lengths are not supported")]
    IndefiniteLength,
    #[error("length encoding too long: {0} octets")]
    LengthTooLong(usize),
    #[error("multi-octet tag numbers are not supported")]
    MultiByteTag,
    #[error("{0} bytes of trailing data after element")]
    TrailingData(usize),
    #[error("expected a primitive element, got a constructed one")]
    NotPrimitive,
    #[error("expected a constructed element, got a primitive one")]
    NotConstructed,
    #[error("integer content must be 1..=8 octets, got {0}")]
    InvalidInteger(usize),
    #[error("boolean content must be exactly 1 octet, got {0}")]
    InvalidBoolean(usize),
    #[error("invalid UTF-8 in string value")]
    InvalidUtf8,
}

/// Errors raised while turning a BER element into a protocol operation.
///
/// Malformed *required* fields abort the operation; malformed *optional*
/// fields never surface here; the decoders drop them and carry on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The outer APPLICATION tag number is not a known LDAP operation.
    #[error("unrecognized LDAP operation tag: APPLICATION {0}")]
    UnknownOperation(u32),
    /// A required field is missing, has the wrong element kind, or carries an
    /// out-of-range value.
    #[error("malformed {kind}: {detail}")]
    MalformedOperation { kind: &'static str, detail: String },
}

impl DecodeError {
    pub(crate) fn malformed(kind: &'static str, detail: impl Into<String>) -> Self {
        DecodeError::MalformedOperation {
            kind,
            detail: detail.into(),
        }
    }
}

/// Errors raised by constructors for values the wire grammar cannot carry.
///
/// Encoding itself is total: every invariant is checked when the value is
/// built, never inside `to_element`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("cannot represent {what} on the wire: {detail}")]
    Unsupported {
        what: &'static str,
        detail: String,
    },
}
