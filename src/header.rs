//! RDB1 document splitting and header extraction.
//!
//! Separates a document into its comment preamble, the header-name line,
//! the header-type line and the remaining data lines, and decodes raw bytes
//! into text.

use crate::constants::COMMENT_MARKER;
use crate::error::{RdbError, Result};
use crate::models::Diagnostic;
use std::borrow::Cow;
use tracing::{debug, warn};

/// Name and declared type token of one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub type_token: String,
}

/// A document split into its sections
#[derive(Debug, Clone)]
pub struct SplitDocument<'a> {
    /// Comment lines, verbatim
    pub comments: Vec<&'a str>,
    pub columns: Vec<ColumnSpec>,
    pub data_lines: Vec<&'a str>,
}

impl SplitDocument<'_> {
    /// Rows the data section should produce
    pub fn expected_rows(&self) -> usize {
        self.data_lines.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Split document text into comments, header and data sections
pub fn split_document(text: &str) -> Result<SplitDocument<'_>> {
    let lines: Vec<&str> = text.lines().collect();

    let meta_rows = lines
        .iter()
        .take_while(|line| line.starts_with(COMMENT_MARKER))
        .count();
    let comments = lines[..meta_rows].to_vec();

    let name_line = lines
        .get(meta_rows)
        .ok_or_else(|| RdbError::malformed_header("missing header-name line"))?;
    let type_line = lines
        .get(meta_rows + 1)
        .ok_or_else(|| RdbError::malformed_header("missing header-type line"))?;

    let names = header_tokens(name_line);
    let types = header_tokens(type_line);

    if names.len() != types.len() {
        return Err(RdbError::malformed_header(format!(
            "{} column names but {} type tokens",
            names.len(),
            types.len()
        )));
    }

    let columns = names
        .into_iter()
        .zip(types)
        .map(|(name, type_token)| ColumnSpec {
            name: name.to_string(),
            type_token: type_token.to_string(),
        })
        .collect();

    let data_lines: Vec<&str> = lines[meta_rows + 2..]
        .iter()
        .copied()
        .filter(|line| !line.is_empty())
        .collect();

    debug!(
        "Split RDB document: {} comment lines, {} data lines",
        meta_rows,
        data_lines.len()
    );

    Ok(SplitDocument {
        comments,
        columns,
        data_lines,
    })
}

/// Tab-split a header line, dropping trailing empty tokens left by
/// trailing tabs
fn header_tokens(line: &str) -> Vec<&str> {
    let mut tokens: Vec<&str> = line.split('\t').map(str::trim).collect();
    while tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    tokens
}

/// Decode a document payload. UTF-8 is preferred; anything else is read as
/// ISO-8859-1, which maps every byte to a character.
pub fn decode_document<'a>(bytes: &'a [u8], diagnostics: &mut Vec<Diagnostic>) -> Cow<'a, str> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text),
        Err(e) => {
            warn!("Document is not valid UTF-8 ({}), decoding as ISO-8859-1", e);
            diagnostics.push(Diagnostic::NonUtf8Input);
            Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# comment one\n# comment two\nagency_cd\tsite_no\tflow_va\n5s\t15s\t14n\nUSGS\t01646500\t12.5\nUSGS\t01646500\t13.0\n";

    #[test]
    fn test_split_sections() {
        let doc = split_document(DOC).unwrap();

        assert_eq!(doc.comments, vec!["# comment one", "# comment two"]);
        assert_eq!(doc.column_names(), vec!["agency_cd", "site_no", "flow_va"]);
        assert_eq!(doc.columns[2].type_token, "14n");
        assert_eq!(doc.expected_rows(), 2);
        assert_eq!(doc.data_lines[0], "USGS\t01646500\t12.5");
    }

    #[test]
    fn test_no_comments_and_no_data() {
        let doc = split_document("a\tb\n5s\t5s\n").unwrap();
        assert!(doc.comments.is_empty());
        assert_eq!(doc.expected_rows(), 0);
    }

    #[test]
    fn test_trailing_tabs_are_reconciled() {
        let doc = split_document("a\tb\t\n5s\t5s\nx\ty\n").unwrap();
        assert_eq!(doc.column_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_mismatched_header_is_malformed() {
        let err = split_document("a\tb\tc\n5s\t5s\nx\ty\tz\n").unwrap_err();
        assert!(matches!(err, RdbError::MalformedHeader { .. }));
        assert!(err.to_string().contains("3 column names but 2 type tokens"));
    }

    #[test]
    fn test_missing_type_line_is_malformed() {
        let err = split_document("# only comments\na\tb").unwrap_err();
        assert!(matches!(err, RdbError::MalformedHeader { .. }));

        let err = split_document("# only comments\n").unwrap_err();
        assert!(err.to_string().contains("header-name"));
    }

    #[test]
    fn test_blank_lines_are_not_rows() {
        let doc = split_document("a\tb\n5s\t5s\n1\t2\n\n\t\n").unwrap();
        assert_eq!(doc.data_lines, vec!["1\t2", "\t"]);
    }

    #[test]
    fn test_crlf_lines() {
        let doc = split_document("# c\r\na\tb\r\n5s\t5s\r\n1\t2\r\n").unwrap();
        assert_eq!(doc.column_names(), vec!["a", "b"]);
        assert_eq!(doc.data_lines, vec!["1\t2"]);
    }

    #[test]
    fn test_decode_document() {
        let mut diagnostics = Vec::new();
        let text = decode_document(b"\xEF\xBB\xBFa\tb", &mut diagnostics);
        assert_eq!(text, "a\tb");
        assert!(diagnostics.is_empty());

        let text = decode_document(b"caf\xE9", &mut diagnostics);
        assert_eq!(text, "caf\u{e9}");
        assert_eq!(diagnostics, vec![Diagnostic::NonUtf8Input]);
    }
}
