//! Build-time errors.
//!
//! Every synthesis failure is a declaration error: the build stops at the first one and
//! reports the field path where it happened.

use std::fmt;

use thiserror::Error;

/// Sequence of field names walked from the root descriptor.
///
/// Displayed as `root.theme.primary`. List elements contribute `items`, map values
/// contribute `values`, and union variants contribute their tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("root")?;
        for segment in &self.0 {
            write!(f, ".{segment}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SchemaError {
    /// Metadata attached to a kind it cannot describe (e.g. a pattern on a number).
    #[error("`{annotation}` cannot be applied to {kind} at {path}")]
    KindMismatch {
        path: FieldPath,
        annotation: &'static str,
        kind: &'static str,
    },

    #[error("map keys must be text, found {found} at {path}")]
    NonTextMapKey { path: FieldPath, found: &'static str },

    #[error("variant `{tag}` must be a record, found {found} at {path}")]
    NonRecordVariant {
        path: FieldPath,
        tag: String,
        found: &'static str,
    },

    #[error("unsupported descriptor kind `{kind}` at {path}")]
    UnsupportedKind { path: FieldPath, kind: String },

    #[error("invalid pattern `{pattern}` at {path}: {source}")]
    InvalidPattern {
        path: FieldPath,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown type `{name}` referenced at {path}")]
    UnknownType { path: FieldPath, name: String },

    #[error("`{name}` recurses into itself at {path} but its definition is suppressed")]
    UnboundedRecursion { path: FieldPath, name: String },

    /// Catalog JSON that does not match the descriptor model.
    #[error("catalog error at JSON path {path}: {message}")]
    Catalog { path: String, message: String },

    #[error("cannot attach $schema to a non-object value ({found})")]
    NotAnObject { found: &'static str },

    #[error("schema encoding failed: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("encoded schema is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl SchemaError {
    /// Field path of a synthesis error; `None` for catalog and encoding failures.
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::KindMismatch { path, .. }
            | Self::NonTextMapKey { path, .. }
            | Self::NonRecordVariant { path, .. }
            | Self::UnsupportedKind { path, .. }
            | Self::InvalidPattern { path, .. }
            | Self::UnknownType { path, .. }
            | Self::UnboundedRecursion { path, .. } => Some(path),
            Self::Catalog { .. } | Self::NotAnObject { .. } | Self::Encode(_) | Self::Utf8(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_display_walks_from_root() {
        let path = FieldPath::root().child("theme").child("primary");
        assert_eq!(path.to_string(), "root.theme.primary");
        assert_eq!(FieldPath::root().to_string(), "root");
        assert!(FieldPath::root().is_root());
    }

    #[test]
    fn error_message_names_the_path() {
        let error = SchemaError::KindMismatch {
            path: FieldPath::root().child("age"),
            annotation: "pattern",
            kind: "integerNumber",
        };
        assert_eq!(
            error.to_string(),
            "`pattern` cannot be applied to integerNumber at root.age"
        );
        assert_eq!(error.path().map(|p| p.segments().len()), Some(1));
    }
}
