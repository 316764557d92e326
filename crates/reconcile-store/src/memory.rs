//! In-memory implementation of the ElementLog trait.
//!
//! Lines are kept in a shared buffer so a test can hand the log to an
//! orchestrator and still inspect what was written.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use reconcile_core::Element;

use crate::error::Result;
use crate::traits::{decode_lines, ElementLog};

/// In-memory log. Clones share the same lines.
#[derive(Clone, Default)]
pub struct MemoryLog {
    lines: Arc<Mutex<Vec<String>>>,
    flushes: Arc<AtomicUsize>,
}

impl MemoryLog {
    /// Create a new empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log that already holds `lines`.
    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Arc::new(Mutex::new(lines.into_iter().map(Into::into).collect())),
            flushes: Arc::default(),
        }
    }

    /// Snapshot of the raw lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// How many times the log has been flushed.
    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl ElementLog for MemoryLog {
    fn replay(&mut self) -> Result<Vec<Element>> {
        decode_lines(self.lines().into_iter().map(Ok))
    }

    fn append(&mut self, element: &Element) -> Result<()> {
        let line = element.to_line()?;
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_lines() {
        let log = MemoryLog::new();
        let mut writer = log.clone();
        writer.append(&Element::new("shared")).unwrap();
        assert_eq!(log.lines(), vec!["\"shared\"".to_string()]);

        writer.flush().unwrap();
        assert_eq!(log.flushes(), 1);
    }

    #[test]
    fn test_replay_decodes_preloaded_lines() {
        let mut log = MemoryLog::with_lines(["\"a\"", "", "\"b\""]);
        assert_eq!(
            log.replay().unwrap(),
            vec![Element::new("a"), Element::new("b")]
        );
    }
}
