//! Golden vectors for element encodings.
//!
//! Each vector pins the log line and wire bytes of one element so that
//! independent implementations can check they agree.

use reconcile_core::Element;

/// A known element with its expected encodings.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    pub name: &'static str,
    pub text: &'static str,
    /// Expected log line, without the trailing newline.
    pub line: &'static str,
    /// Expected wire bytes, hex encoded.
    pub wire_hex: &'static str,
}

/// All golden vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "short_ascii",
            text: "a1",
            line: "\"a1\"",
            wire_hex: "626131",
        },
        GoldenVector {
            name: "empty",
            text: "",
            line: "\"\"",
            wire_hex: "60",
        },
        GoldenVector {
            name: "embedded_newline",
            text: "line\nbreak",
            line: "\"line\\nbreak\"",
            wire_hex: "6a6c696e650a627265616b",
        },
        GoldenVector {
            name: "embedded_quotes",
            text: "say \"hi\"",
            line: "\"say \\\"hi\\\"\"",
            wire_hex: "687361792022686922",
        },
        GoldenVector {
            name: "json_object",
            text: "{\"k\":1}",
            line: "\"{\\\"k\\\":1}\"",
            wire_hex: "677b226b223a317d",
        },
        GoldenVector {
            name: "non_ascii",
            text: "h\u{e9}llo",
            line: "\"h\u{e9}llo\"",
            wire_hex: "6668c3a96c6c6f",
        },
    ]
}

/// Encode every vector and compare against the expected forms.
///
/// Returns `(name, matches, line, wire_hex)` for each vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let element = Element::new(v.text);
            let line = element.to_line().unwrap_or_default();
            let wire = element.to_wire().map(hex::encode).unwrap_or_default();
            let matches = line == v.line && wire == v.wire_hex;
            (v.name.to_string(), matches, line, wire)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_vectors_match() {
        for (name, matches, line, wire) in verify_all_vectors() {
            assert!(matches, "vector '{name}' encoded as {line} / {wire}");
        }
    }

    #[test]
    fn test_vectors_decode_back() {
        for vector in all_vectors() {
            let from_line = Element::from_line(vector.line).unwrap();
            assert_eq!(from_line.as_str(), vector.text, "vector '{}'", vector.name);

            let wire = hex::decode(vector.wire_hex).unwrap();
            let from_wire = Element::from_wire(&wire).unwrap();
            assert_eq!(from_wire.as_str(), vector.text, "vector '{}'", vector.name);
        }
    }

    #[test]
    fn test_vector_names_unique() {
        let vectors = all_vectors();
        let mut names: Vec<_> = vectors.iter().map(|v| v.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), vectors.len());
    }
}
