//! Definition file loading and saving

use crate::error::{Error, Result};
use crate::markup::{Markup, SceneDocument};
use crate::persist::DefWriter;
use defstack_core::DefRecord;
use std::fs;
use std::path::Path;

impl Markup {
    /// Load a single definition file
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<DefRecord> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        self.parse_record(&content, Some(path))
    }

    /// Load a scene document
    pub fn load_scene_file(&self, path: impl AsRef<Path>) -> Result<SceneDocument> {
        let content = fs::read_to_string(path.as_ref())?;
        self.parse_scene(&content)
    }

    /// Load every definition file below a directory
    ///
    /// Files are visited in sorted path order. A file that cannot be parsed
    /// is logged and skipped; IO failures abort the load.
    pub fn load_directory(&self, path: impl AsRef<Path>) -> Result<Vec<DefRecord>> {
        let path = path.as_ref();

        if !path.is_dir() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Not a directory: {:?}", path),
            )));
        }

        let mut records = Vec::new();
        self.collect(path, &mut records)?;
        Ok(records)
    }

    fn collect(&self, dir: &Path, records: &mut Vec<DefRecord>) -> Result<()> {
        let mut entries = fs::read_dir(dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        for file_path in entries {
            if file_path.is_dir() {
                // Recursively load subdirectories
                self.collect(&file_path, records)?;
            } else if file_path
                .extension()
                .is_some_and(|e| e == self.config.extension.as_str())
            {
                match self.load_file(&file_path) {
                    Ok(record) => records.push(record),
                    Err(Error::Io(e)) => return Err(Error::Io(e)),
                    Err(e) => log::warn!("skipping {}: {}", file_path.display(), e),
                }
            }
        }
        Ok(())
    }

    /// Write a definition back to its source file
    pub fn save(&self, record: &DefRecord, writer: &mut dyn DefWriter) -> Result<()> {
        let path = record
            .path()
            .ok_or_else(|| Error::NoSourcePath(record.name.to_string()))?;
        let text = self.write_record(record)?;
        writer.write(path, text.as_bytes());
        Ok(())
    }

    /// Write a scene document holding `records`
    pub fn save_scene<'r>(
        &self,
        path: &Path,
        name: &str,
        records: impl IntoIterator<Item = &'r DefRecord>,
        writer: &mut dyn DefWriter,
    ) -> Result<()> {
        let text = self.write_scene(name, records)?;
        writer.write(path, text.as_bytes());
        Ok(())
    }
}
