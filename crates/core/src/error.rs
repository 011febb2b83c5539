//! Error taxonomy for reconciliation operations.

use crate::canonical::ConfigKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SyncError>;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Malformed source document. Fatal for the pair; sibling pairs continue.
    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// Format/kind mismatch, caught before any I/O.
    #[error("format '{format}' does not support {kind} configs")]
    UnsupportedKind { format: String, kind: ConfigKind },

    /// Canonical record failed a minimal invariant.
    #[error("invalid {kind} record: {message}")]
    Validation { kind: ConfigKind, message: String },

    /// Warnings present under strict mode; zero writes were performed.
    #[error("Lossy conversions detected with --strict flag ({} warning(s))", .warnings.len())]
    StrictMode { warnings: Vec<String> },

    /// I/O failure during commit. Writes already committed for the same pair
    /// are not rolled back.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SyncError {
    /// Parse error without a path; the caller fills it in via [`with_path`].
    ///
    /// [`with_path`]: SyncError::with_path
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            path: PathBuf::new(),
            message: message.into(),
        }
    }

    /// Attaches a file path to a pathless parse error.
    pub fn with_path(self, path: &Path) -> Self {
        match self {
            Self::Parse { path: old, message } if old.as_os_str().is_empty() => Self::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_path_fills_empty_parse_path() {
        let err = SyncError::parse("bad frontmatter").with_path(Path::new("/tmp/a.md"));
        assert_eq!(err.to_string(), "failed to parse /tmp/a.md: bad frontmatter");
    }

    #[test]
    fn with_path_keeps_existing_path() {
        let err = SyncError::Parse {
            path: PathBuf::from("/one"),
            message: "x".to_string(),
        }
        .with_path(Path::new("/two"));
        assert!(err.to_string().contains("/one"));
    }

    #[test]
    fn strict_mode_message_names_the_flag() {
        let err = SyncError::StrictMode {
            warnings: vec!["deny downgraded".to_string()],
        };
        assert!(err
            .to_string()
            .contains("Lossy conversions detected with --strict flag"));
    }
}
