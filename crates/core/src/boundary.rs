//! The adapter seam between canonical records and on-disk formats.

use crate::canonical::{CanonicalRecord, ConfigKind};
use crate::error::{Result, SyncError};
use crate::fsio;
use crate::merge::FieldSupport;
use std::fs;
use std::path::Path;

/// One concrete tool format.
///
/// Adapters are stateless translators: `parse` lifts on-disk text into a
/// canonical record, `render` lowers a record back to text. All merge
/// logic lives outside the adapter.
pub trait FormatAdapter: Send + Sync {
    /// Short format identifier, also the metadata key namespace.
    fn name(&self) -> &'static str;

    /// File extension (without the dot) used for `kind` in this format.
    fn file_extension(&self, kind: ConfigKind) -> &'static str;

    /// The record kinds this format can express at all.
    fn supported_kinds(&self) -> &'static [ConfigKind];

    /// Per-field capabilities for `kind`.
    fn field_support(&self, kind: ConfigKind) -> FieldSupport;

    fn can_handle(&self, kind: ConfigKind) -> bool {
        self.supported_kinds().contains(&kind)
    }

    /// Parses file content into a canonical record.
    fn parse(&self, kind: ConfigKind, content: &str, path: &Path) -> Result<CanonicalRecord>;

    /// Renders a canonical record to file content.
    fn render(&self, record: &CanonicalRecord) -> Result<String>;

    /// Reads and parses a file, tagging parse errors with the path.
    fn read(&self, kind: ConfigKind, path: &Path) -> Result<CanonicalRecord> {
        self.ensure_supported(kind)?;
        let content = fs::read_to_string(path)?;
        let mut record = self.parse(kind, &content, path)?;
        record.set_source_format(self.name());
        record.validate()?;
        Ok(record)
    }

    /// Renders and writes a record atomically.
    fn write(&self, record: &CanonicalRecord, path: &Path) -> Result<()> {
        self.ensure_supported(record.kind())?;
        record.validate()?;
        let content = self.render(record)?;
        fsio::write_atomic(path, &content)
    }

    fn ensure_supported(&self, kind: ConfigKind) -> Result<()> {
        if self.can_handle(kind) {
            Ok(())
        } else {
            Err(SyncError::UnsupportedKind {
                format: self.name().to_string(),
                kind,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::CanonicalCommand;

    struct Stub;

    impl FormatAdapter for Stub {
        fn name(&self) -> &'static str {
            "stub"
        }
        fn file_extension(&self, _kind: ConfigKind) -> &'static str {
            "md"
        }
        fn supported_kinds(&self) -> &'static [ConfigKind] {
            &[ConfigKind::SlashCommand]
        }
        fn field_support(&self, _kind: ConfigKind) -> FieldSupport {
            FieldSupport::full()
        }
        fn parse(&self, _kind: ConfigKind, content: &str, _path: &Path) -> Result<CanonicalRecord> {
            Ok(CanonicalRecord::SlashCommand(CanonicalCommand {
                name: "stub".into(),
                body: content.to_string(),
                ..Default::default()
            }))
        }
        fn render(&self, record: &CanonicalRecord) -> Result<String> {
            match record {
                CanonicalRecord::SlashCommand(c) => Ok(c.body.clone()),
                other => Err(SyncError::UnsupportedKind {
                    format: "stub".into(),
                    kind: other.kind(),
                }),
            }
        }
    }

    #[test]
    fn unsupported_kind_is_rejected_before_io() {
        let err = Stub
            .read(ConfigKind::Agent, Path::new("/nonexistent/agent.md"))
            .unwrap_err();
        assert!(matches!(err, SyncError::UnsupportedKind { .. }));
    }

    #[test]
    fn read_tags_records_with_the_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("review.md");
        std::fs::write(&path, "Review the diff.").unwrap();
        let record = Stub.read(ConfigKind::SlashCommand, &path).unwrap();
        assert_eq!(record.source_format(), Some("stub"));
    }

    #[test]
    fn write_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("review.md");
        let record = CanonicalRecord::SlashCommand(CanonicalCommand {
            name: "review".into(),
            body: "Review the diff.".into(),
            ..Default::default()
        });
        Stub.write(&record, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Review the diff.");
    }
}
