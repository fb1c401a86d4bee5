//! Error types for scene loading.
//!
//! Every failure the loader can report is an [`AseError`]. Callers that only
//! care about the category of a failure can match on [`AseError::kind`].

use std::path::PathBuf;

/// Shorthand for results produced by the loader.
pub type Result<T, E = AseError> = std::result::Result<T, E>;

/// Flat classification of [`AseError`] values.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FileNotFound,
    FileEmpty,
    FileUnreadable,
    MalformedChunk,
    FieldNotFound,
    InvalidValue,
    IndexOutOfRange,
    CapacityExceeded,
    CountMismatch,
    DegenerateUv,
}

#[derive(Debug, thiserror::Error)]
pub enum AseError {
    #[error("scene file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("scene file is empty: {}", .0.display())]
    FileEmpty(PathBuf),

    #[error("failed to read scene file {}: {source}", .path.display())]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("scene text contains no chunks")]
    NoChunks,

    #[error("malformed chunk `{label}`: {reason}")]
    MalformedChunk { label: String, reason: &'static str },

    #[error("required field `{0}` not found")]
    FieldNotFound(String),

    #[error("invalid value `{value}` for `{field}`")]
    InvalidValue { field: String, value: String },

    #[error("{pool} index {index} out of range (pool size {len})")]
    IndexOutOfRange {
        pool: &'static str,
        index: usize,
        len: usize,
    },

    #[error("{what} count {count} exceeds the limit of {limit}")]
    CapacityExceeded {
        what: &'static str,
        count: usize,
        limit: usize,
    },

    #[error("declared {what} count {declared} does not match the {parsed} entries found")]
    CountMismatch {
        what: &'static str,
        declared: usize,
        parsed: usize,
    },

    #[error("face {face} has degenerate texture coordinates")]
    DegenerateUv { face: usize },

    #[error("object `{name}`: {source}")]
    Object {
        name: String,
        #[source]
        source: Box<AseError>,
    },
}

impl AseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AseError::FileNotFound(_) => ErrorKind::FileNotFound,
            AseError::FileEmpty(_) => ErrorKind::FileEmpty,
            AseError::FileUnreadable { .. } => ErrorKind::FileUnreadable,
            AseError::NoChunks | AseError::MalformedChunk { .. } => ErrorKind::MalformedChunk,
            AseError::FieldNotFound(_) => ErrorKind::FieldNotFound,
            AseError::InvalidValue { .. } => ErrorKind::InvalidValue,
            AseError::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
            AseError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            AseError::CountMismatch { .. } => ErrorKind::CountMismatch,
            AseError::DegenerateUv { .. } => ErrorKind::DegenerateUv,
            AseError::Object { source, .. } => source.kind(),
        }
    }

    pub(crate) fn malformed(label: &str, reason: &'static str) -> Self {
        AseError::MalformedChunk {
            label: label.to_string(),
            reason,
        }
    }

    pub(crate) fn in_object(self, name: &str) -> Self {
        AseError::Object {
            name: name.to_string(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_errors_report_inner_kind() {
        let err = AseError::IndexOutOfRange {
            pool: "vertex",
            index: 9,
            len: 8,
        }
        .in_object("Box01");
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
        assert_eq!(
            err.to_string(),
            "object `Box01`: vertex index 9 out of range (pool size 8)"
        );
    }

    #[test]
    fn no_chunks_is_a_malformed_chunk() {
        assert_eq!(AseError::NoChunks.kind(), ErrorKind::MalformedChunk);
    }
}
