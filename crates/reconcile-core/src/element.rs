//! Reconciled elements and their canonical encodings.
//!
//! An [`Element`] is immutable once built. Identity is value equality over
//! its canonical text, and [`ElementId`] is the Blake3 digest of that text.
//!
//! Three encodings are derived from the canonical text:
//!
//! - **canonical text**: the value itself; generic values use compact JSON
//! - **log line**: the JSON string literal of the text, always a single line
//! - **wire bytes**: CBOR of the text

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::types::ElementId;

/// One reconciled item.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Element {
    text: String,
}

impl Element {
    /// Create an element from its canonical text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Create an element from UTF-8 bytes.
    pub fn from_utf8(bytes: Vec<u8>) -> Result<Self> {
        String::from_utf8(bytes)
            .map(Self::new)
            .map_err(|e| CoreError::Decoding(e.to_string()))
    }

    /// Create an element from any serializable value.
    ///
    /// The canonical text is the compact JSON encoding of `value`, so equal
    /// values always yield equal elements.
    pub fn from_value<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_string(value)
            .map(Self::new)
            .map_err(|e| CoreError::Encoding(e.to_string()))
    }

    /// Decode a value previously stored with [`Element::from_value`].
    pub fn to_value<T: for<'de> Deserialize<'de>>(&self) -> Result<T> {
        serde_json::from_str(&self.text).map_err(|e| CoreError::Decoding(e.to_string()))
    }

    /// The canonical text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length of the canonical text in bytes.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Content-addressed identifier.
    pub fn id(&self) -> ElementId {
        ElementId::digest(self.text.as_bytes())
    }

    /// Encode as one line of an element log (no trailing newline).
    pub fn to_line(&self) -> Result<String> {
        serde_json::to_string(&self.text).map_err(|e| CoreError::Encoding(e.to_string()))
    }

    /// Decode one line of an element log.
    pub fn from_line(line: &str) -> Result<Self> {
        serde_json::from_str::<String>(line)
            .map(Self::new)
            .map_err(|e| CoreError::Decoding(e.to_string()))
    }

    /// Encode for the wire.
    pub fn to_wire(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.text.len() + 9);
        ciborium::into_writer(&self.text, &mut buf)
            .map_err(|e| CoreError::Encoding(e.to_string()))?;
        Ok(buf)
    }

    /// Decode from the wire.
    pub fn from_wire(bytes: &[u8]) -> Result<Self> {
        ciborium::from_reader::<String, _>(bytes)
            .map(Self::new)
            .map_err(|e| CoreError::Decoding(e.to_string()))
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<Element> for String {
    fn from(element: Element) -> Self {
        element.text
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({:?})", self.text)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equal_text_equal_id() {
        let a = Element::new("alpha");
        let b = Element::from("alpha".to_string());
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), Element::new("beta").id());
    }

    #[test]
    fn test_line_escapes_newlines() {
        let e = Element::new("two\nlines");
        let line = e.to_line().unwrap();
        assert!(!line.contains('\n'));
        assert_eq!(Element::from_line(&line).unwrap(), e);
    }

    #[test]
    fn test_from_line_rejects_garbage() {
        assert!(Element::from_line("not json").is_err());
        assert!(Element::from_line("42").is_err());
    }

    #[test]
    fn test_from_value_is_canonical() {
        #[derive(Serialize, Deserialize, Debug, PartialEq)]
        struct Point {
            x: i32,
            y: i32,
        }

        let e1 = Element::from_value(&Point { x: 1, y: 2 }).unwrap();
        let e2 = Element::from_value(&Point { x: 1, y: 2 }).unwrap();
        assert_eq!(e1, e2);
        assert_eq!(e1.as_str(), r#"{"x":1,"y":2}"#);
        assert_eq!(e1.to_value::<Point>().unwrap(), Point { x: 1, y: 2 });
    }

    #[test]
    fn test_from_utf8_rejects_invalid() {
        assert!(Element::from_utf8(vec![0xff, 0xfe]).is_err());
        assert_eq!(Element::from_utf8(b"ok".to_vec()).unwrap().as_str(), "ok");
    }

    proptest! {
        #[test]
        fn test_line_decodes_to_same_element(text in ".*") {
            let e = Element::new(text);
            let line = e.to_line().unwrap();
            prop_assert!(!line.contains('\n'));
            prop_assert_eq!(Element::from_line(&line).unwrap(), e);
        }
    }
}
