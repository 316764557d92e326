//! ElementLog trait: the minimal interface for element persistence.

use reconcile_core::Element;

use crate::error::Result;

/// Append-only persistence for a local element collection.
///
/// Implementations own their underlying resource; dropping the log must
/// release it after flushing anything buffered.
pub trait ElementLog: Send {
    /// Read every element recorded so far, in recording order.
    fn replay(&mut self) -> Result<Vec<Element>>;

    /// Record one new element.
    fn append(&mut self, element: &Element) -> Result<()>;

    /// Push buffered writes to the backing medium.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Decode log lines, skipping blanks. Line numbers in errors are 1-based.
pub(crate) fn decode_lines<I>(lines: I) -> Result<Vec<Element>>
where
    I: IntoIterator<Item = std::io::Result<String>>,
{
    let mut elements = Vec::new();
    for (idx, line) in lines.into_iter().enumerate() {
        let line = line?;
        let trimmed = line.trim_end_matches('\r');
        if trimmed.trim().is_empty() {
            continue;
        }
        let element = Element::from_line(trimmed).map_err(|e| {
            crate::error::StoreError::MalformedLine {
                line: idx + 1,
                reason: e.to_string(),
            }
        })?;
        elements.push(element);
    }
    Ok(elements)
}
