//! Durable slot backed by one JSON file per key.
//!
//! Writes go to a temporary file in the same directory which is then renamed
//! over the target, so a crash mid-write leaves the previous snapshot intact.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use honeywell_core::{DurableSlot, SlotError};
use tempfile::NamedTempFile;

/// Directory-backed [`DurableSlot`].
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    /// Use `dir` for storage. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform data directory, e.g. `~/.local/share/honeywell` on Linux.
    ///
    /// Falls back to `./.honeywell` when the platform has no data directory.
    #[must_use]
    pub fn default_dir() -> PathBuf {
        dirs::data_dir().map_or_else(|| PathBuf::from(".honeywell"), |d| d.join("honeywell"))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl DurableSlot for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SlotError> {
        fs::create_dir_all(&self.dir)?;

        let mut file = NamedTempFile::new_in(&self.dir)?;
        file.write_all(value.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(self.path_for(key)).map_err(|e| e.error)?;

        tracing::debug!(key, bytes = value.len(), "Snapshot written");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path());
        assert_eq!(slot.read("honeywell-cart").unwrap(), None);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path().join("nested"));

        slot.write("honeywell-cart", r#"{"state":{"items":[]},"version":0}"#)
            .unwrap();
        slot.write("honeywell-cart", r#"{"state":{"items":[1]},"version":0}"#)
            .unwrap();

        assert_eq!(
            slot.read("honeywell-cart").unwrap().as_deref(),
            Some(r#"{"state":{"items":[1]},"version":0}"#)
        );
        assert!(dir.path().join("nested/honeywell-cart.json").exists());
    }

    #[test]
    fn test_keys_are_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path());

        slot.write("honeywell-cart", "a").unwrap();
        slot.write("honeywell-wishlist", "b").unwrap();

        assert_eq!(slot.read("honeywell-cart").unwrap().as_deref(), Some("a"));
        assert_eq!(
            slot.read("honeywell-wishlist").unwrap().as_deref(),
            Some("b")
        );
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path());
        slot.write("honeywell-cart", "{}").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("honeywell-cart.json")]);
    }
}
