//! Snapshot file: the enriched facility tree handed from ingest to normalize

use lord_common::{LordError, Record, Result};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Every facility of one ingestion run with its related collections attached.
///
/// Serialized as a bare JSON array of facility objects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    facilities: Vec<Record>,
}

impl Snapshot {
    pub fn new(facilities: Vec<Record>) -> Self {
        Self { facilities }
    }

    pub fn facilities(&self) -> &[Record] {
        &self.facilities
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    /// Write as four-space indented JSON, creating parent directories.
    ///
    /// A failure part-way leaves whatever was written in place.
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(path)?);
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(b"    "));
        self.serialize(&mut serializer)?;
        writer.flush()?;

        info!(path = %path.display(), facilities = self.len(), "Snapshot saved");
        Ok(())
    }

    /// Load a snapshot; a missing file is reported as [`LordError::InputNotFound`]
    pub fn read(path: &Path) -> Result<Self> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LordError::InputNotFound(format!(
                    "{} (run `lord-ingest fetch` first)",
                    path.display()
                )));
            },
            Err(e) => return Err(e.into()),
        };

        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
        info!(path = %path.display(), facilities = snapshot.len(), "Snapshot loaded");
        Ok(snapshot)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample() -> Snapshot {
        let facility = json!({
            "FacilityID": "232447",
            "FacilityName": "Lost Dutchman",
            "CAMPSITE": [{"CampsiteID": "7", "ATTRIBUTES": []}]
        });
        Snapshot::new(vec![facility.as_object().cloned().unwrap()])
    }

    #[test]
    fn test_write_creates_directory_and_indents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("json_output").join("facilities_data.json");

        sample().write(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n    {\n        \"FacilityID\""));
        assert_eq!(Snapshot::read(&path).unwrap(), sample());
    }

    #[test]
    fn test_read_missing_file_is_input_not_found() {
        let dir = TempDir::new().unwrap();
        let err = Snapshot::read(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, LordError::InputNotFound(_)));
    }

    #[test]
    fn test_read_rejects_non_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"RECDATA": []}"#).unwrap();
        assert!(matches!(
            Snapshot::read(&path).unwrap_err(),
            LordError::Serialization(_)
        ));
    }
}
