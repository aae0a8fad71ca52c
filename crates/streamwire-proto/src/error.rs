//! Error types for protocol operations

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Boxed lower-level error accepted by [`ProtocolError::from_error`]
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Reason code attached to every [`ProtocolError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolErrorKind {
    /// Unclassified failure
    Unknown,
    /// Decoded bytes do not form a valid value
    InvalidData,
    /// A length prefix decoded to a negative number
    NegativeSize,
    /// A length exceeded the configured limit
    SizeLimit,
    /// Peer speaks an unsupported protocol version
    BadVersion,
    /// The requested encoding path is not implemented
    NotImplemented,
}

impl ProtocolErrorKind {
    /// Numeric reason code as carried on the wire
    pub fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::InvalidData => 1,
            Self::NegativeSize => 2,
            Self::SizeLimit => 3,
            Self::BadVersion => 4,
            Self::NotImplemented => 5,
        }
    }

    /// Map a numeric reason code back to a kind.
    ///
    /// Codes outside the known range map to [`ProtocolErrorKind::Unknown`].
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::InvalidData,
            2 => Self::NegativeSize,
            3 => Self::SizeLimit,
            4 => Self::BadVersion,
            5 => Self::NotImplemented,
            _ => Self::Unknown,
        }
    }

    /// Kind to use once structural context is attached.
    ///
    /// `Unknown` carries no information at that point, so it becomes
    /// `InvalidData`; every other kind is kept.
    fn with_context(self) -> Self {
        match self {
            Self::Unknown => Self::InvalidData,
            other => other,
        }
    }
}

impl fmt::Display for ProtocolErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::InvalidData => "invalid data",
            Self::NegativeSize => "negative size",
            Self::SizeLimit => "size limit",
            Self::BadVersion => "bad version",
            Self::NotImplemented => "not implemented",
        };
        f.write_str(name)
    }
}

/// Failure while encoding or decoding a structured value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ProtocolError {
    kind: ProtocolErrorKind,
    message: String,
}

impl ProtocolError {
    /// Create an error from an explicit reason code and message
    pub fn new(kind: ProtocolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Reason code
    pub fn kind(&self) -> ProtocolErrorKind {
        self.kind
    }

    /// Human-readable description, including any context added by wrapping
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Annotate a failure raised while reading field `field_id` of `struct_name`
    pub fn read_field(field_id: i16, field_name: &str, struct_name: &str, inner: ProtocolError) -> Self {
        Self::new(
            inner.kind.with_context(),
            format!(
                "Unable to read field {} ({}) in {} due to: {}",
                field_id, field_name, struct_name, inner.message
            ),
        )
    }

    /// Annotate a failure raised while writing field `field_id` of `struct_name`
    pub fn write_field(field_id: i16, field_name: &str, struct_name: &str, inner: ProtocolError) -> Self {
        Self::new(
            inner.kind.with_context(),
            format!(
                "Unable to write field {} ({}) in {} due to: {}",
                field_id, field_name, struct_name, inner.message
            ),
        )
    }

    /// Annotate a failure raised while reading struct `struct_name`
    pub fn read_struct(struct_name: &str, inner: ProtocolError) -> Self {
        Self::new(
            inner.kind.with_context(),
            format!("Unable to read struct {} due to: {}", struct_name, inner.message),
        )
    }

    /// Annotate a failure raised while writing struct `struct_name`
    pub fn write_struct(struct_name: &str, inner: ProtocolError) -> Self {
        Self::new(
            inner.kind.with_context(),
            format!("Unable to write struct {} due to: {}", struct_name, inner.message),
        )
    }

    /// Classify an arbitrary lower-level error.
    ///
    /// `None` stays `None`, an existing `ProtocolError` is returned as is,
    /// corrupt base64 input becomes `InvalidData` and anything else becomes
    /// `Unknown` with its message preserved verbatim.
    pub fn from_error(err: Option<BoxError>) -> Option<Self> {
        let err = err?;
        let err = match err.downcast::<ProtocolError>() {
            Ok(protocol) => return Some(*protocol),
            Err(other) => other,
        };
        if err.is::<base64::DecodeError>() {
            return Some(Self::new(ProtocolErrorKind::InvalidData, err.to_string()));
        }
        Some(Self::new(ProtocolErrorKind::Unknown, err.to_string()))
    }
}

impl From<base64::DecodeError> for ProtocolError {
    fn from(err: base64::DecodeError) -> Self {
        Self::new(ProtocolErrorKind::InvalidData, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use proptest::prelude::*;

    const ALL_KINDS: [ProtocolErrorKind; 6] = [
        ProtocolErrorKind::Unknown,
        ProtocolErrorKind::InvalidData,
        ProtocolErrorKind::NegativeSize,
        ProtocolErrorKind::SizeLimit,
        ProtocolErrorKind::BadVersion,
        ProtocolErrorKind::NotImplemented,
    ];

    #[test]
    fn test_new_keeps_kind_and_message() {
        let err = ProtocolError::new(ProtocolErrorKind::BadVersion, "expected version 1");
        assert_eq!(err.kind(), ProtocolErrorKind::BadVersion);
        assert_eq!(err.message(), "expected version 1");
        assert_eq!(err.to_string(), "expected version 1");
    }

    #[test]
    fn test_read_field_promotes_unknown() {
        let inner = ProtocolError::new(ProtocolErrorKind::Unknown, "bad varint");
        let err = ProtocolError::read_field(3, "name", "User", inner);

        assert_eq!(err.kind(), ProtocolErrorKind::InvalidData);
        assert_eq!(
            err.message(),
            "Unable to read field 3 (name) in User due to: bad varint"
        );
    }

    #[test]
    fn test_write_field_promotes_unknown() {
        let inner = ProtocolError::new(ProtocolErrorKind::Unknown, "broken");
        let err = ProtocolError::write_field(-1, "id", "Ping", inner);

        assert_eq!(err.kind(), ProtocolErrorKind::InvalidData);
        assert!(err.message().contains("id"));
        assert!(err.message().contains("Ping"));
        assert!(err.message().ends_with("due to: broken"));
    }

    #[test]
    fn test_struct_wrappers_promote_unknown() {
        let read = ProtocolError::read_struct(
            "Envelope",
            ProtocolError::new(ProtocolErrorKind::Unknown, "eof"),
        );
        assert_eq!(read.kind(), ProtocolErrorKind::InvalidData);
        assert_eq!(read.message(), "Unable to read struct Envelope due to: eof");

        let write = ProtocolError::write_struct(
            "Envelope",
            ProtocolError::new(ProtocolErrorKind::Unknown, "eof"),
        );
        assert_eq!(write.kind(), ProtocolErrorKind::InvalidData);
        assert_eq!(write.message(), "Unable to write struct Envelope due to: eof");
    }

    #[test]
    fn test_wrappers_keep_informative_kinds() {
        let inner = ProtocolError::new(ProtocolErrorKind::SizeLimit, "string too long");

        assert_eq!(
            ProtocolError::read_field(1, "body", "Msg", inner.clone()).kind(),
            ProtocolErrorKind::SizeLimit
        );
        assert_eq!(
            ProtocolError::write_field(1, "body", "Msg", inner.clone()).kind(),
            ProtocolErrorKind::SizeLimit
        );
        assert_eq!(
            ProtocolError::read_struct("Msg", inner.clone()).kind(),
            ProtocolErrorKind::SizeLimit
        );
        assert_eq!(
            ProtocolError::write_struct("Msg", inner).kind(),
            ProtocolErrorKind::SizeLimit
        );
    }

    #[test]
    fn test_nested_wrapping_accumulates_context() {
        let leaf = ProtocolError::new(ProtocolErrorKind::NegativeSize, "size -4");
        let field = ProtocolError::read_field(2, "items", "Inner", leaf);
        let outer = ProtocolError::read_struct("Outer", field);

        assert_eq!(outer.kind(), ProtocolErrorKind::NegativeSize);
        assert_eq!(
            outer.message(),
            "Unable to read struct Outer due to: Unable to read field 2 (items) in Inner due to: size -4"
        );
    }

    #[test]
    fn test_from_error_none() {
        assert!(ProtocolError::from_error(None).is_none());
    }

    #[test]
    fn test_from_error_passes_protocol_error_through() {
        let original = ProtocolError::new(ProtocolErrorKind::NotImplemented, "no compact maps");
        let converted = ProtocolError::from_error(Some(Box::new(original.clone()))).unwrap();
        assert_eq!(converted, original);
    }

    #[test]
    fn test_from_error_classifies_base64() {
        let decode_err = base64::engine::general_purpose::STANDARD
            .decode("not*base64")
            .unwrap_err();
        let message = decode_err.to_string();

        let converted = ProtocolError::from_error(Some(Box::new(decode_err))).unwrap();
        assert_eq!(converted.kind(), ProtocolErrorKind::InvalidData);
        assert_eq!(converted.message(), message);
    }

    #[test]
    fn test_from_error_wraps_other_errors_as_unknown() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let converted = ProtocolError::from_error(Some(Box::new(io_err))).unwrap();

        assert_eq!(converted.kind(), ProtocolErrorKind::Unknown);
        assert_eq!(converted.message(), "disk on fire");
    }

    #[test]
    fn test_from_base64_decode_error() {
        let err: ProtocolError = base64::DecodeError::InvalidLength.into();
        assert_eq!(err.kind(), ProtocolErrorKind::InvalidData);
    }

    #[test]
    fn test_kind_codes() {
        for (code, kind) in ALL_KINDS.iter().enumerate() {
            assert_eq!(kind.code(), code as i32);
            assert_eq!(ProtocolErrorKind::from_code(code as i32), *kind);
        }
        assert_eq!(ProtocolErrorKind::from_code(42), ProtocolErrorKind::Unknown);
        assert_eq!(ProtocolErrorKind::from_code(-1), ProtocolErrorKind::Unknown);
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&ProtocolErrorKind::SizeLimit).unwrap();
        let kind: ProtocolErrorKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, ProtocolErrorKind::SizeLimit);
    }

    proptest! {
        #[test]
        fn test_context_only_changes_unknown(
            kind_index in 0usize..6,
            field_id in any::<i16>(),
            message in "[a-z ]{0,32}"
        ) {
            let kind = ALL_KINDS[kind_index];
            let inner = ProtocolError::new(kind, message.clone());
            let wrapped = ProtocolError::read_field(field_id, "f", "S", inner);

            if kind == ProtocolErrorKind::Unknown {
                prop_assert_eq!(wrapped.kind(), ProtocolErrorKind::InvalidData);
            } else {
                prop_assert_eq!(wrapped.kind(), kind);
            }
            prop_assert!(wrapped.message().ends_with(&message));
            let expected_id = field_id.to_string();
            prop_assert!(wrapped.message().contains(&expected_id));
        }
    }
}
