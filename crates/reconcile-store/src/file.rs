//! Append-only, line-oriented file log.
//!
//! The file is opened once for appending and held for the lifetime of the
//! log. Appends are buffered until [`ElementLog::flush`], a replay, or drop.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use reconcile_core::Element;

use crate::error::Result;
use crate::traits::{decode_lines, ElementLog};

/// File-backed element log.
pub struct FileLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileLog {
    /// Open (creating if needed) the log at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        tracing::debug!("opened element log {}", path.display());

        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ElementLog for FileLog {
    fn replay(&mut self) -> Result<Vec<Element>> {
        self.writer.flush()?;
        let reader = BufReader::new(File::open(&self.path)?);
        let elements = decode_lines(reader.lines())?;
        tracing::debug!(
            "replayed {} elements from {}",
            elements.len(),
            self.path.display()
        );
        Ok(elements)
    }

    fn append(&mut self, element: &Element) -> Result<()> {
        let line = element.to_line()?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for FileLog {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            tracing::warn!("failed to flush element log {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_created_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("new.log");

        let mut log = FileLog::open(&path).unwrap();
        assert!(path.exists());
        assert!(log.replay().unwrap().is_empty());
    }

    #[test]
    fn test_append_adds_one_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("elements.log");

        let mut log = FileLog::open(&path).unwrap();
        log.append(&Element::new("alpha")).unwrap();
        log.append(&Element::new("multi\nline")).unwrap();
        log.flush().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
        assert_eq!(contents.lines().next(), Some("\"alpha\""));
    }

    #[test]
    fn test_appends_are_buffered_until_flush() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("elements.log");

        let mut log = FileLog::open(&path).unwrap();
        log.append(&Element::new("pending")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        log.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "\"pending\"\n");
    }

    #[test]
    fn test_reopen_replays_previous_appends() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("elements.log");

        {
            let mut log = FileLog::open(&path).unwrap();
            log.append(&Element::new("a1")).unwrap();
            log.append(&Element::new("a2")).unwrap();
        }

        let mut log = FileLog::open(&path).unwrap();
        let replayed = log.replay().unwrap();
        assert_eq!(replayed, vec![Element::new("a1"), Element::new("a2")]);

        // Appends go after existing content, nothing is rewritten.
        log.append(&Element::new("a3")).unwrap();
        assert_eq!(log.replay().unwrap().len(), 3);
    }

    #[test]
    fn test_blank_lines_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("elements.log");
        fs::write(&path, "\"x\"\n\n   \n\"y\"\r\n").unwrap();

        let mut log = FileLog::open(&path).unwrap();
        assert_eq!(
            log.replay().unwrap(),
            vec![Element::new("x"), Element::new("y")]
        );
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("elements.log");
        fs::write(&path, "\"ok\"\nnot-json\n").unwrap();

        let mut log = FileLog::open(&path).unwrap();
        match log.replay() {
            Err(StoreError::MalformedLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected MalformedLine, got {:?}", other),
        }
    }

    #[test]
    fn test_unopenable_path_fails() {
        let dir = tempdir().unwrap();
        // A directory cannot be opened for appending.
        assert!(matches!(FileLog::open(dir.path()), Err(StoreError::Io(_))));
    }
}
