//! Rich error reporting using codespan-reporting.

use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};

use crate::error::GenerateError;

/// A source file database for codespan-reporting.
pub struct SourceDb {
    files: SimpleFiles<String, String>,
    file_id: usize,
}

impl SourceDb {
    /// Create a new source database with a single file.
    pub fn new(name: String, source: String) -> Self {
        let mut files = SimpleFiles::new();
        let file_id = files.add(name, source);
        Self { files, file_id }
    }

    pub fn parse_error(&self, message: &str, span: Range<usize>) -> Diagnostic<usize> {
        Diagnostic::error()
            .with_message(message)
            .with_labels(vec![
                Label::primary(self.file_id, span).with_message("error occurs here")
            ])
    }

    /// Report a parse error with source context on stderr.
    pub fn report_parse_error(&self, message: &str, span: Range<usize>, color: ColorChoice) {
        let writer = StandardStream::stderr(color);
        let config = term::Config::default();
        let diagnostic = self.parse_error(message, span);
        let _ = term::emit(&mut writer.lock(), &config, &self.files, &diagnostic);
    }
}

/// Report a generation failure, with source context for parse failures.
pub fn report_generate_error(err: &GenerateError, color: ColorChoice) {
    match err {
        GenerateError::Parse {
            path,
            source_code,
            message,
            offset: Some(offset),
        } => {
            let db = SourceDb::new(path.display().to_string(), source_code.clone());
            db.report_parse_error(message, span_at(source_code, *offset), color);
        }
        _ => eprintln!("error: {err}"),
    }
}

/// One-character span at `offset`, clamped to the source and to a char
/// boundary.
fn span_at(source: &str, offset: usize) -> Range<usize> {
    let mut start = offset.min(source.len());
    while !source.is_char_boundary(start) {
        start -= 1;
    }
    let end = source[start..]
        .chars()
        .next()
        .map_or(start, |c| start + c.len_utf8());
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_at_clamps() {
        assert_eq!(span_at("abc", 1), 1..2);
        assert_eq!(span_at("abc", 10), 3..3);
        assert_eq!(span_at("aé", 2), 1..3);
    }

    #[test]
    fn test_parse_error_labels_the_span() {
        let db = SourceDb::new("A.cs".to_string(), "class {".to_string());
        let diagnostic = db.parse_error("expected identifier", 6..7);
        assert_eq!(diagnostic.message, "expected identifier");
        assert_eq!(diagnostic.labels[0].range, 6..7);
    }
}
